//! Expense Scribe - structured expenses from chat-style input
//!
//! Turns a free-text message, a receipt photo or a voice note into an
//! `ExpenseRecord` by asking a generative model for JSON, repairing and
//! validating what comes back, then applying defaults and the "paid by"
//! rule before the record is appended to a ledger.
//!
//! ## Quick Start
//!
//! ```ignore
//! use expense_scribe::{ExpensePipeline, ExtractionClient, ExtractionRequest, RetryPolicy};
//!
//! let provider = create_provider(&ProviderConfig::default())?;
//! let client = ExtractionClient::new(provider, RetryPolicy::default());
//! let ledger = Arc::new(SqliteLedger::open("ledger.db")?);
//! let pipeline = ExpensePipeline::new(client, ledger, RecordDefaults::default());
//!
//! let record = pipeline
//!     .process(ExtractionRequest::Text("Coffee 5.50 USD".into()), &cancel)
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: prompt building, providers, retrying client, response validation
//! - [`pipeline`]: request-to-record orchestration and post-processing
//! - [`storage`]: SQLite ledger with connection pooling
//! - [`config`]: layered configuration
//! - [`cli`]: command-line front end

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};

pub use types::{
    ErrorCategory, ExpenseRecord, ExtractionRequest, PipelineError, PipelineErrorKind,
    RecordDefaults, RequestKind, Result, ScribeError,
};

pub use storage::{LedgerEntry, LedgerStore, SharedLedger, SqliteLedger};

pub use pipeline::{Clock, ExpensePipeline, FixedClock, LocalClock};

pub use ai::{
    ExtractionClient, ExtractionProvider, ProviderConfig, RetryPolicy, SharedProvider,
    create_provider,
};
