//! Extraction Pipeline
//!
//! ```text
//! ExtractionRequest
//!   -> ExpensePrompt::build      (payload for the model)
//!   -> ExtractionClient::extract (retries, timeouts, cancellation)
//!   -> ResponseValidator         (repair + schema checks + "paid by")
//!   -> finalize                  (defaults)
//!   -> LedgerStore::append
//! ```
//!
//! Every collaborator is constructed once and injected. Invocations share
//! no mutable state, so one pipeline can serve many requests at once.

mod postprocess;

pub use postprocess::{Clock, FixedClock, LocalClock, finalize};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::ai::{ExpensePrompt, ExtractionClient, ResponseValidator};
use crate::constants::input as input_constants;
use crate::storage::SharedLedger;
use crate::types::{
    ExpenseRecord, ExtractionRequest, PipelineError, RecordDefaults, RequestKind, Result,
    ScribeError, preview,
};

/// Wires prompt building, extraction, validation and storage
pub struct ExpensePipeline {
    client: ExtractionClient,
    validator: ResponseValidator,
    ledger: SharedLedger,
    clock: Arc<dyn Clock>,
    defaults: RecordDefaults,
    max_input_bytes: u64,
}

impl ExpensePipeline {
    pub fn new(client: ExtractionClient, ledger: SharedLedger, defaults: RecordDefaults) -> Self {
        Self {
            client,
            validator: ResponseValidator::new(),
            ledger,
            clock: Arc::new(LocalClock),
            defaults,
            max_input_bytes: input_constants::MAX_FILE_SIZE_MB.saturating_mul(1024 * 1024),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_input_bytes(mut self, max_bytes: u64) -> Self {
        self.max_input_bytes = max_bytes;
        self
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn client(&self) -> &ExtractionClient {
        &self.client
    }

    /// Produce a finalized record without touching the ledger
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Result<ExpenseRecord> {
        request.check(self.max_input_bytes)?;

        let today = self.clock.today();
        let payload = ExpensePrompt::build(request, today);
        let raw = self.client.extract(&payload, cancel).await?;

        debug!(
            tokens = raw.usage.total(),
            elapsed_ms = raw.timing.total_ms,
            output = %preview(&raw.text, input_constants::LOG_PREVIEW_CHARS),
            "Model output received"
        );

        let report = self
            .validator
            .validate_report(&raw, request.text_context())?;
        if report.was_repaired {
            warn!("Model output needed JSON repair");
        }

        finalize(report.candidate, today, &self.defaults)
    }

    /// Extract and append. The only entry point the transport layer needs.
    #[instrument(skip_all, fields(kind = %request.kind()))]
    pub async fn process(
        &self,
        request: ExtractionRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<ExpenseRecord, PipelineError> {
        if let Some(text) = request.text_context() {
            info!(text = %preview(text, input_constants::LOG_PREVIEW_CHARS), "Processing expense");
        } else {
            info!("Processing expense");
        }

        let result = async {
            let record = self.extract(&request, cancel).await?;
            if cancel.is_cancelled() {
                return Err(ScribeError::Cancelled);
            }
            self.store(record, request.kind()).await
        }
        .await;

        result.map_err(|err| {
            let err = PipelineError::from(err);
            warn!(kind = %err.kind, cause = %err.cause, "Expense not recorded");
            err
        })
    }

    /// Append an already finalized record.
    ///
    /// Once started the append runs to completion; callers bounding
    /// extraction with a deadline should stop the clock before calling this.
    pub async fn commit(
        &self,
        record: ExpenseRecord,
        source: RequestKind,
    ) -> std::result::Result<ExpenseRecord, PipelineError> {
        self.store(record, source).await.map_err(|err| {
            let err = PipelineError::from(err);
            warn!(kind = %err.kind, cause = %err.cause, "Expense not recorded");
            err
        })
    }

    /// Extract only, mapped to the transport-facing error
    pub async fn preview(
        &self,
        request: &ExtractionRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<ExpenseRecord, PipelineError> {
        self.extract(request, cancel).await.map_err(|err| {
            let err = PipelineError::from(err);
            warn!(kind = %err.kind, cause = %err.cause, "Extraction failed");
            err
        })
    }

    async fn store(&self, record: ExpenseRecord, source: RequestKind) -> Result<ExpenseRecord> {
        let ledger = Arc::clone(&self.ledger);
        let (entry, record) = tokio::task::spawn_blocking(move || {
            ledger.append(&record, source).map(|entry| (entry, record))
        })
        .await
        .map_err(|e| ScribeError::Storage(format!("Ledger task failed: {}", e)))??;

        info!(
            id = %entry.id,
            item = %record.item,
            amount = record.amount,
            currency = %record.currency,
            paid_by = %record.paid_by,
            "Expense recorded"
        );
        Ok(record)
    }
}
