//! Reply emission for the CLI.
//!
//! Replies go to stdout as text, or as pretty JSON with `--json`. A text
//! listing longer than the configured message limit is written to a JSON
//! artifact and replaced by a one-line summary.

mod json;
mod text;

use std::path::PathBuf;

use serde_json::Value;

use crate::app::AppContext;

pub use json::{audit_json, balance_json, tracker_json, value};
pub use text::*;

/// A structured fallback for a listing too long to show inline.
pub struct Artifact {
    pub file_name: String,
    pub summary: String,
    pub payload: Value,
}

/// Emit a confirmation reply. Suppressed by `--quiet` in text mode.
pub fn emit(ctx: &AppContext, text: &str, json: &Value) -> anyhow::Result<()> {
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(json)?);
    } else if !ctx.quiet() {
        println!("{}", text);
    }
    Ok(())
}

/// Emit the answer to a query. Not affected by `--quiet`.
pub fn reply(ctx: &AppContext, text: &str, json: &Value) -> anyhow::Result<()> {
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(json)?);
    } else {
        println!("{}", text);
    }
    Ok(())
}

/// Emit a listing, falling back to an artifact when it exceeds the limit.
pub fn emit_listing(
    ctx: &AppContext,
    text: &str,
    json: &Value,
    artifact: Artifact,
) -> anyhow::Result<()> {
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(json)?);
        return Ok(());
    }

    let limit = ctx.message_limit()?;
    if text.chars().count() <= limit {
        println!("{}", text);
        return Ok(());
    }

    let path = write_artifact(ctx, &artifact)?;
    tracing::debug!(path = %path.display(), "reply written as artifact");
    println!(
        "{}\n\nThe reply is too large to display, wrote {} instead.",
        artifact.summary,
        path.display()
    );
    Ok(())
}

fn write_artifact(ctx: &AppContext, artifact: &Artifact) -> anyhow::Result<PathBuf> {
    let dir = ctx.artifact_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", dir.display(), e))?;
    let path = dir.join(sanitize_file_name(&artifact.file_name));
    let contents = serde_json::to_string_pretty(&artifact.payload)?;
    std::fs::write(&path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
    Ok(path)
}

/// Channel ids come from user input; keep artifact names to one path segment.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
