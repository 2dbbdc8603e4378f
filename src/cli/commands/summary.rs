//! Summary Command
//!
//! Show the most recent ledger rows.

use crate::cli::ui::render;
use crate::cli::util::CommandContext;
use crate::types::Result;

pub fn run(ctx: &CommandContext, limit: Option<usize>, format: &str) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.ledger.summary_limit);
    let entries = ctx.ledger.read_recent(limit)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", render::summary(&entries));
    }

    Ok(())
}
