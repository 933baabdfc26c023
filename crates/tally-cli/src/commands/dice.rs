//! `tally roll` handler.

use tally_core::dice::{self, DiceSpec};

use crate::app::AppContext;
use crate::cli::RollArgs;
use crate::errors::CliError;
use crate::output::{self, Artifact};

pub fn handle_roll(ctx: &AppContext, args: &RollArgs) -> anyhow::Result<()> {
    let spec = spec_from_args(args)?;
    let result = dice::roll(spec, &mut rand::thread_rng());
    tracing::debug!(%spec, total = result.total, "rolled");

    let artifact = Artifact {
        file_name: format!("roll-{}.json", ctx.channel()),
        summary: format!("Rolled {}: total {}", spec, result.total),
        payload: output::value(&result)?,
    };
    output::emit_listing(ctx, &output::roll(&result), &output::value(&result)?, artifact)
}

/// Notation wins; otherwise `--sides` is required and `--quantity` defaults to one.
fn spec_from_args(args: &RollArgs) -> Result<DiceSpec, CliError> {
    match (&args.dice, args.sides) {
        (Some(notation), _) => notation.parse().map_err(CliError::from),
        (None, Some(sides)) => DiceSpec::new(args.quantity, sides)
            .map_err(|e| CliError::from(tally_core::TallyError::from(e))),
        (None, None) => Err(CliError::invalid_input(
            "Specify dice notation (e.g. 3d6) or --sides",
        )),
    }
}
