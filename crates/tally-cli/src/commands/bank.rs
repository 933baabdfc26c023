//! `tally bank` handlers for both currency systems.

use serde_json::json;

use tally_core::bank::{Bank, FormatUpdate};
use tally_core::currency::CurrencySystem;

use crate::app::AppContext;
use crate::cli::{
    AuditArgs, BankCommand, CoinArgs, ConvertArgs, DecimalAmountArgs, DecimalCommand,
    DndCommand, SetFeeArgs, SetFormatArgs,
};
use crate::errors::CliError;
use crate::output::{self, Artifact};

use super::quantity;

pub fn handle(ctx: &AppContext, command: &BankCommand) -> anyhow::Result<()> {
    match command {
        BankCommand::Dnd(command) => handle_dnd(ctx, command),
        BankCommand::Decimal(command) => handle_decimal(ctx, command),
    }
}

fn handle_dnd(ctx: &AppContext, command: &DndCommand) -> anyhow::Result<()> {
    match command {
        DndCommand::Deposit(args) => handle_deposit(ctx, args),
        DndCommand::Withdraw(args) => handle_withdraw(ctx, args),
        DndCommand::Balance => handle_balance(ctx),
        DndCommand::Convert(args) => handle_convert(ctx, args),
        DndCommand::Fees => handle_fees(ctx),
        DndCommand::SetFee(args) => handle_set_fee(ctx, args),
        DndCommand::Clear => handle_clear(ctx, CurrencySystem::Dnd),
        DndCommand::Audit(args) => handle_audit(ctx, CurrencySystem::Dnd, args),
    }
}

fn handle_decimal(ctx: &AppContext, command: &DecimalCommand) -> anyhow::Result<()> {
    match command {
        DecimalCommand::Deposit(args) => handle_decimal_deposit(ctx, args),
        DecimalCommand::Withdraw(args) => handle_decimal_withdraw(ctx, args),
        DecimalCommand::Balance => handle_decimal_balance(ctx),
        DecimalCommand::SetFormat(args) => handle_set_format(ctx, args),
        DecimalCommand::Clear => handle_clear(ctx, CurrencySystem::Decimal),
        DecimalCommand::Audit(args) => handle_audit(ctx, CurrencySystem::Decimal, args),
    }
}

fn bank<'c>(ctx: &'c AppContext<'_>) -> anyhow::Result<Bank<'c>> {
    let store = ctx.store()?;
    Ok(Bank::new(store, store))
}

// --- D&D ---

fn handle_deposit(ctx: &AppContext, args: &CoinArgs) -> anyhow::Result<()> {
    let amount = quantity(&args.amount)?;
    let change = bank(ctx)?
        .deposit(ctx.channel(), &args.currency, amount, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::coin_change("Deposited", &change),
        &output::value(&change)?,
    )
}

fn handle_withdraw(ctx: &AppContext, args: &CoinArgs) -> anyhow::Result<()> {
    let amount = quantity(&args.amount)?;
    let change = bank(ctx)?
        .withdraw(ctx.channel(), &args.currency, amount, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::coin_change("Withdrew", &change),
        &output::value(&change)?,
    )
}

fn handle_balance(ctx: &AppContext) -> anyhow::Result<()> {
    let balance = bank(ctx)?.balance(ctx.channel()).map_err(CliError::from)?;
    let artifact = Artifact {
        file_name: format!("bank-balance-{}.json", ctx.channel()),
        summary: output::balance_summary(&balance),
        payload: output::balance_json(&balance),
    };
    output::emit_listing(
        ctx,
        &output::dnd_balance(&balance),
        &output::value(&balance)?,
        artifact,
    )
}

fn handle_convert(ctx: &AppContext, args: &ConvertArgs) -> anyhow::Result<()> {
    let amount = quantity(&args.amount)?;
    let conversion = bank(ctx)?
        .convert(ctx.channel(), &args.from, &args.to, amount, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::conversion(&conversion),
        &output::value(&conversion)?,
    )
}

fn handle_fees(ctx: &AppContext) -> anyhow::Result<()> {
    let schedule = bank(ctx)?.fees(ctx.channel()).map_err(CliError::from)?;
    output::reply(ctx, &output::fee_schedule(&schedule), &output::value(&schedule)?)
}

fn handle_set_fee(ctx: &AppContext, args: &SetFeeArgs) -> anyhow::Result<()> {
    ctx.require_manage("change the conversion fee")?;
    let rate = bank(ctx)?
        .set_fee(ctx.channel(), args.rate, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(ctx, &output::fee_set(rate), &json!({ "fee_rate": rate }))
}

// --- Decimal ---

fn handle_decimal_deposit(ctx: &AppContext, args: &DecimalAmountArgs) -> anyhow::Result<()> {
    let change = bank(ctx)?
        .decimal_deposit(ctx.channel(), args.amount, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::decimal_change("Deposited", &change),
        &output::value(&change)?,
    )
}

fn handle_decimal_withdraw(ctx: &AppContext, args: &DecimalAmountArgs) -> anyhow::Result<()> {
    let change = bank(ctx)?
        .decimal_withdraw(ctx.channel(), args.amount, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::decimal_change("Withdrew", &change),
        &output::value(&change)?,
    )
}

fn handle_decimal_balance(ctx: &AppContext) -> anyhow::Result<()> {
    let balance = bank(ctx)?
        .decimal_balance(ctx.channel())
        .map_err(CliError::from)?;
    output::reply(
        ctx,
        &output::decimal_balance(&balance),
        &json!({ "amount": balance.amount, "formatted": balance.formatted() }),
    )
}

fn handle_set_format(ctx: &AppContext, args: &SetFormatArgs) -> anyhow::Result<()> {
    ctx.require_manage("change the currency format")?;
    let update = FormatUpdate {
        prefix: args.prefix.clone(),
        suffix: args.suffix.clone(),
        prefix_space_after: args.prefix_space_after,
        suffix_space_before: args.suffix_space_before,
    };
    let format = bank(ctx)?
        .set_format(ctx.channel(), &update, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(ctx, &output::format_set(&format), &output::value(&format)?)
}

// --- Shared ---

fn handle_clear(ctx: &AppContext, system: CurrencySystem) -> anyhow::Result<()> {
    ctx.require_manage("clear the bank")?;
    let removed = bank(ctx)?
        .clear(ctx.channel(), system, &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::cleared(&format!("{} bank", system), &removed),
        &json!({ "system": system, "removed": removed.len() }),
    )
}

fn handle_audit(ctx: &AppContext, system: CurrencySystem, args: &AuditArgs) -> anyhow::Result<()> {
    let limit = ctx.audit_limit(args.limit)?;
    let bank = bank(ctx)?;
    let records = bank
        .audit(ctx.channel(), system, limit)
        .map_err(CliError::from)?;
    let money = match system {
        CurrencySystem::Dnd => None,
        CurrencySystem::Decimal => Some(bank.decimal_format(ctx.channel()).map_err(CliError::from)?),
    };
    let title = match system {
        CurrencySystem::Dnd => "Bank Audit Log",
        CurrencySystem::Decimal => "Decimal Bank Audit Log",
    };
    let artifact = Artifact {
        file_name: format!("{}-audit-{}.json", system, ctx.channel()),
        summary: output::audit_summary(title, &records),
        payload: output::audit_json(&records),
    };
    output::emit_listing(
        ctx,
        &output::audit(title, &records, money.as_ref()),
        &output::audit_json(&records),
        artifact,
    )
}
