use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use tally_core::VERSION;

/// Tally - shared channel ledgers for tabletop games
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, global = true, env = "TALLY_DB")]
    pub db: Option<String>,

    /// Path to the config file
    #[arg(long, global = true, env = "TALLY_CONFIG")]
    pub config: Option<String>,

    /// Channel the command runs in
    #[arg(long, global = true, env = "TALLY_CHANNEL", default_value = "default")]
    pub channel: String,

    /// Id of the user issuing the command
    #[arg(long = "user-id", global = true, env = "TALLY_USER_ID", default_value = "0")]
    pub user_id: String,

    /// Display name of the user issuing the command
    #[arg(long, global = true, env = "TALLY_USER", default_value = "unknown")]
    pub user: String,

    /// Caller holds the manage-channels permission
    #[arg(long, global = true)]
    pub manage_channels: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory for oversized replies written as JSON files
    #[arg(long, global = true, value_name = "DIR")]
    pub artifact_dir: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Track items and quantities
    #[command(subcommand)]
    Tracker(TrackerCommand),

    /// Manage the channel bank
    #[command(subcommand)]
    Bank(BankCommand),

    /// Roll dice
    Roll(RollArgs),

    /// Look up D&D reference data
    #[command(subcommand)]
    Lookup(LookupCommand),
}

#[derive(Subcommand)]
pub enum TrackerCommand {
    /// Add a quantity of an item
    Add(QuantityArgs),
    /// Remove a quantity of an item
    Remove(QuantityArgs),
    /// Show the quantity of one item
    Get(NameArgs),
    /// List every item
    List,
    /// Search items by name
    Search(SearchArgs),
    /// Rename an item, merging into an existing one
    Rename(RenameArgs),
    /// Remove every item (requires manage-channels)
    Clear,
    /// Show recent tracker changes
    Audit(AuditArgs),
}

#[derive(Args)]
pub struct QuantityArgs {
    /// Item name
    pub name: String,
    /// Quantity to add or remove
    #[arg(allow_hyphen_values = true)]
    pub quantity: String,
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search term (at least two characters)
    pub term: String,
}

#[derive(Args)]
pub struct RenameArgs {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Number of entries to show (defaults to the configured audit limit)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum BankCommand {
    /// D&D currency (platinum, gold, electrum, silver, copper)
    #[command(subcommand)]
    Dnd(DndCommand),

    /// Free-form decimal currency
    #[command(subcommand)]
    Decimal(DecimalCommand),
}

#[derive(Subcommand)]
pub enum DndCommand {
    /// Deposit coins
    Deposit(CoinArgs),
    /// Withdraw coins
    Withdraw(CoinArgs),
    /// Show every denomination and the total in gold
    Balance,
    /// Convert between denominations, paying the channel fee
    Convert(ConvertArgs),
    /// Show the conversion fee
    Fees,
    /// Set the conversion fee (requires manage-channels)
    #[command(name = "setfee")]
    SetFee(SetFeeArgs),
    /// Remove every coin (requires manage-channels)
    Clear,
    /// Show recent D&D bank changes
    Audit(AuditArgs),
}

#[derive(Args)]
pub struct CoinArgs {
    /// Currency name or abbreviation (pp, gp, ep, sp, cp)
    pub currency: String,
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
}

#[derive(Args)]
pub struct ConvertArgs {
    pub from: String,
    pub to: String,
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
}

#[derive(Args)]
pub struct SetFeeArgs {
    /// Fee rate as a fraction (0.1 = 10%)
    #[arg(allow_negative_numbers = true)]
    pub rate: Decimal,
}

#[derive(Subcommand)]
pub enum DecimalCommand {
    /// Deposit an amount
    Deposit(DecimalAmountArgs),
    /// Withdraw an amount
    Withdraw(DecimalAmountArgs),
    /// Show the balance
    Balance,
    /// Change how amounts are displayed (requires manage-channels)
    #[command(name = "setformat")]
    SetFormat(SetFormatArgs),
    /// Remove the balance (requires manage-channels)
    Clear,
    /// Show recent decimal bank changes
    Audit(AuditArgs),
}

#[derive(Args)]
pub struct DecimalAmountArgs {
    #[arg(allow_negative_numbers = true)]
    pub amount: Decimal,
}

#[derive(Args)]
pub struct SetFormatArgs {
    /// Text placed before the amount
    #[arg(long)]
    pub prefix: Option<String>,
    /// Text placed after the amount
    #[arg(long)]
    pub suffix: Option<String>,
    /// Put a space between prefix and amount
    #[arg(long)]
    pub prefix_space_after: Option<bool>,
    /// Put a space between amount and suffix
    #[arg(long)]
    pub suffix_space_before: Option<bool>,
}

#[derive(Args)]
pub struct RollArgs {
    /// Dice notation such as 3d6 or d20
    #[arg(value_name = "DICE", conflicts_with = "sides")]
    pub dice: Option<String>,

    /// Sides per die
    #[arg(long)]
    pub sides: Option<u32>,

    /// Number of dice
    #[arg(long, default_value_t = 1, conflicts_with = "dice")]
    pub quantity: u32,
}

#[derive(Subcommand)]
pub enum LookupCommand {
    /// Look up an item by name
    Item(NameArgs),
    /// Look up a monster by name
    Monster(NameArgs),
    /// Look up an alchemy ingredient by name
    Ingredient(NameArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_bank_command() {
        let cli = Cli::try_parse_from([
            "tally",
            "--channel",
            "c1",
            "bank",
            "dnd",
            "convert",
            "gold",
            "sp",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.channel, "c1");
        match cli.command {
            Commands::Bank(BankCommand::Dnd(DndCommand::Convert(args))) => {
                assert_eq!(args.from, "gold");
                assert_eq!(args.to, "sp");
                assert_eq!(args.amount, "10");
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_roll_notation_conflicts_with_quantity() {
        let err = Cli::try_parse_from(["tally", "roll", "3d6", "--quantity", "5"])
            .err()
            .expect("conflict rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["tally", "roll", "--sides", "6", "--quantity", "5"]).unwrap();
        match cli.command {
            Commands::Roll(args) => {
                assert_eq!(args.sides, Some(6));
                assert_eq!(args.quantity, 5);
            }
            _ => panic!("unexpected command"),
        }
        assert!(Cli::try_parse_from(["tally", "roll", "3d6"]).is_ok());
    }
}
