//! Tally CLI - shared channel ledgers for tabletop games
//!
//! Drives the tally-core services from the command line: parses input,
//! checks the manage-channels permission, renders replies and maps errors
//! to exit codes.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod logging;
mod output;

use clap::Parser;

use app::AppContext;
use cli::{Cli, Commands};
use errors::CliError;

fn main() {
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    let filter = ctx
        .config()
        .ok()
        .and_then(|config| config.logging.filter.clone());
    logging::init(filter.as_deref(), cli.verbose);

    if let Err(e) = run(&ctx, &cli) {
        if let Some(cli_err) = e.downcast_ref::<CliError>() {
            cli_err.exit();
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    ctx.config()?;
    tracing::debug!(channel = ctx.channel(), user = %cli.user_id, "dispatching command");

    match &cli.command {
        Commands::Tracker(command) => commands::tracker::handle(ctx, command),
        Commands::Bank(command) => commands::bank::handle(ctx, command),
        Commands::Roll(args) => commands::dice::handle_roll(ctx, args),
        Commands::Lookup(command) => commands::lookup::handle(ctx, command),
    }
}
