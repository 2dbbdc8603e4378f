//! Add Command
//!
//! Extract one expense from text, a receipt photo or a voice note and
//! append it to the ledger.
//!
//! Usage:
//!   expense-scribe add "Coffee at Starbucks 5.50 USD"
//!   expense-scribe add --image receipt.jpg --caption "Paid by Sarah"
//!   expense-scribe add --audio note.ogg [--dry-run] [-f json]

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::ui::{Output, render};
use crate::cli::util::{CommandContext, audio_request, image_request};
use crate::constants::messages;
use crate::pipeline::ExpensePipeline;
use crate::types::{ExpenseRecord, ExtractionRequest, PipelineError, ScribeError};

/// Inputs for one `add` invocation
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub text: Option<String>,
    pub image: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub caption: Option<String>,
    pub dry_run: bool,
    pub format: String,
}

impl AddOptions {
    /// Normalize the inputs into a single request
    pub fn request(&self) -> Result<ExtractionRequest, ScribeError> {
        match (&self.text, &self.image, &self.audio) {
            (Some(text), None, None) => Ok(ExtractionRequest::Text(text.clone())),
            (None, Some(path), None) => image_request(path, self.caption.clone()),
            (None, None, Some(path)) => audio_request(path),
            _ => Err(ScribeError::InvalidInput(
                "Provide exactly one of: text, --image, --audio".to_string(),
            )),
        }
    }
}

pub async fn run(
    ctx: &CommandContext,
    options: AddOptions,
    cancel: CancellationToken,
) -> Result<(), PipelineError> {
    let output = Output::new();
    let request = options.request()?;
    let pipeline = ctx.pipeline()?;

    if options.format != "json" {
        output.info(messages::PROCESSING);
    }

    let record = run_with_deadline(&pipeline, request, options.dry_run, &cancel).await?;

    if options.format == "json" {
        let json = serde_json::to_string_pretty(&record).map_err(ScribeError::Json)?;
        println!("{}", json);
    } else {
        if options.dry_run {
            output.warning("Dry run: nothing was recorded");
        } else {
            output.success("Expense recorded");
        }
        println!("{}", render::confirmation(&record));
    }

    Ok(())
}

/// Extract under the retry policy's overall deadline, then record.
///
/// The deadline covers extraction only. On expiry the token is cancelled
/// and nothing is appended; once a record exists the append always runs.
async fn run_with_deadline(
    pipeline: &ExpensePipeline,
    request: ExtractionRequest,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<ExpenseRecord, PipelineError> {
    let deadline = pipeline.client().policy().overall_deadline();

    let record = match tokio::time::timeout(deadline, pipeline.preview(&request, cancel)).await {
        Ok(result) => result?,
        Err(_) => {
            cancel.cancel();
            warn!(deadline_secs = deadline.as_secs_f64(), "Overall extraction deadline hit");
            return Err(PipelineError::from(ScribeError::timeout(
                "expense extraction",
                deadline,
            )));
        }
    };

    if dry_run {
        return Ok(record);
    }
    if cancel.is_cancelled() {
        return Err(PipelineError::from(ScribeError::Cancelled));
    }
    pipeline.commit(record, request.kind()).await
}
