//! `tally tracker` handlers.

use serde_json::json;

use tally_core::tracker::Tracker;

use crate::app::AppContext;
use crate::cli::{AuditArgs, NameArgs, QuantityArgs, RenameArgs, SearchArgs, TrackerCommand};
use crate::errors::CliError;
use crate::output::{self, Artifact};

use super::{display_name, quantity};

pub fn handle(ctx: &AppContext, command: &TrackerCommand) -> anyhow::Result<()> {
    match command {
        TrackerCommand::Add(args) => handle_add(ctx, args),
        TrackerCommand::Remove(args) => handle_remove(ctx, args),
        TrackerCommand::Get(args) => handle_get(ctx, args),
        TrackerCommand::List => handle_list(ctx),
        TrackerCommand::Search(args) => handle_search(ctx, args),
        TrackerCommand::Rename(args) => handle_rename(ctx, args),
        TrackerCommand::Clear => handle_clear(ctx),
        TrackerCommand::Audit(args) => handle_audit(ctx, args),
    }
}

fn tracker<'c>(ctx: &'c AppContext<'_>) -> anyhow::Result<Tracker<'c>> {
    let store = ctx.store()?;
    Ok(Tracker::new(store, store, ctx.tracker_options()?))
}

fn handle_add(ctx: &AppContext, args: &QuantityArgs) -> anyhow::Result<()> {
    let amount = quantity(&args.quantity)?;
    let change = tracker(ctx)?
        .add(ctx.channel(), &args.name, amount, &ctx.actor())
        .map_err(CliError::from)?;
    let name = display_name(&args.name);
    output::emit(
        ctx,
        &output::quantity_change(&name, &change),
        &json!({ "name": name, "change": change }),
    )
}

fn handle_remove(ctx: &AppContext, args: &QuantityArgs) -> anyhow::Result<()> {
    let amount = quantity(&args.quantity)?;
    let change = tracker(ctx)?
        .remove(ctx.channel(), &args.name, amount, &ctx.actor())
        .map_err(CliError::from)?;
    let name = display_name(&args.name);
    output::emit(
        ctx,
        &output::quantity_change(&name, &change),
        &json!({ "name": name, "change": change }),
    )
}

fn handle_get(ctx: &AppContext, args: &NameArgs) -> anyhow::Result<()> {
    let entry = tracker(ctx)?
        .get(ctx.channel(), &args.name)
        .map_err(CliError::from)?;
    let name = display_name(&args.name);
    let quantity = entry.as_ref().map_or(0, |e| e.amount);
    output::reply(
        ctx,
        &output::tracker_item(&name, entry.as_ref()),
        &json!({ "name": name, "quantity": quantity }),
    )
}

fn handle_list(ctx: &AppContext) -> anyhow::Result<()> {
    let listing = tracker(ctx)?.list(ctx.channel()).map_err(CliError::from)?;
    let artifact = Artifact {
        file_name: format!("tracker-{}.json", ctx.channel()),
        summary: output::tracker_summary(&listing),
        payload: output::tracker_json(&listing.items),
    };
    output::emit_listing(
        ctx,
        &output::tracker_listing(&listing),
        &output::value(&listing)?,
        artifact,
    )
}

fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let outcome = tracker(ctx)?
        .search(ctx.channel(), &args.term)
        .map_err(CliError::from)?;
    output::reply(
        ctx,
        &output::search_outcome(&display_name(&args.term), &outcome),
        &output::value(&outcome)?,
    )
}

fn handle_rename(ctx: &AppContext, args: &RenameArgs) -> anyhow::Result<()> {
    let outcome = tracker(ctx)?
        .rename(ctx.channel(), &args.old_name, &args.new_name, &ctx.actor())
        .map_err(CliError::from)?;
    let old_name = display_name(&args.old_name);
    let new_name = display_name(&args.new_name);
    output::emit(
        ctx,
        &output::rename(&old_name, &new_name, &outcome),
        &json!({ "old_name": old_name, "new_name": new_name, "outcome": outcome }),
    )
}

fn handle_clear(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.require_manage("clear the tracker")?;
    let removed = tracker(ctx)?
        .clear(ctx.channel(), &ctx.actor())
        .map_err(CliError::from)?;
    output::emit(
        ctx,
        &output::cleared("tracker", &removed),
        &json!({ "removed": removed.len() }),
    )
}

fn handle_audit(ctx: &AppContext, args: &AuditArgs) -> anyhow::Result<()> {
    let limit = ctx.audit_limit(args.limit)?;
    let records = tracker(ctx)?
        .audit(ctx.channel(), limit)
        .map_err(CliError::from)?;
    let title = "Tracker Audit Log";
    let artifact = Artifact {
        file_name: format!("tracker-audit-{}.json", ctx.channel()),
        summary: output::audit_summary(title, &records),
        payload: output::audit_json(&records),
    };
    output::emit_listing(
        ctx,
        &output::audit(title, &records, None),
        &output::audit_json(&records),
        artifact,
    )
}
