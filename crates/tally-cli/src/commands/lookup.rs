//! `tally lookup` handlers backed by the read-only reference catalogs.

use serde_json::json;

use tally_core::reference::{Lookup, ReferenceKind};
use tally_core::validation::validate_name;
use tally_core::TallyError;

use crate::app::AppContext;
use crate::cli::{LookupCommand, NameArgs};
use crate::errors::CliError;
use crate::output;

pub fn handle(ctx: &AppContext, command: &LookupCommand) -> anyhow::Result<()> {
    match command {
        LookupCommand::Item(args) => handle_lookup(ctx, ReferenceKind::Item, args),
        LookupCommand::Monster(args) => handle_lookup(ctx, ReferenceKind::Monster, args),
        LookupCommand::Ingredient(args) => handle_lookup(ctx, ReferenceKind::Ingredient, args),
    }
}

fn handle_lookup(ctx: &AppContext, kind: ReferenceKind, args: &NameArgs) -> anyhow::Result<()> {
    let max = ctx.config()?.limits.max_name_length;
    validate_name(&args.name, max).map_err(|e| CliError::from(TallyError::from(e)))?;
    let query = args.name.trim();

    let catalog = ctx.catalog(kind)?;
    let lookup = catalog.lookup(query, ctx.lookup_options(kind)?);
    let text = output::lookup(kind, query, &lookup);

    match &lookup {
        Lookup::Exact(records) => {
            output::reply(ctx, &text, &json!({ "kind": kind, "matches": records }))
        }
        Lookup::Suggestions(suggestions) if suggestions.is_empty() => {
            Err(CliError::not_found(text).into())
        }
        Lookup::Suggestions(suggestions) => {
            let payload: Vec<_> = suggestions
                .iter()
                .map(|s| json!({ "name": s.item.name, "score": s.score }))
                .collect();
            output::reply(ctx, &text, &json!({ "kind": kind, "suggestions": payload }))
        }
    }
}
