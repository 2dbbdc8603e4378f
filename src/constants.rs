//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry policy constants for model calls
pub mod retry {
    /// Maximum total attempts per extraction (first try included)
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 1000;

    /// Maximum delay between retries (milliseconds)
    pub const MAX_DELAY_MS: u64 = 30_000;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: u32 = 2;

    /// Jitter is drawn from [0, delay / JITTER_DIVISOR)
    pub const JITTER_DIVISOR: u32 = 4;
}

/// HTTP/Network constants
pub mod network {
    /// Default per-attempt request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    /// Timeout for provider health checks (seconds)
    pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
}

/// Defaults applied to extracted records
pub mod record {
    /// Currency token used when the model finds none
    pub const DEFAULT_CURRENCY: &str = "USD";

    /// Sentinel meaning "the requesting user"
    pub const PAID_BY_SENTINEL: &str = "Me";

    /// Date format used on the wire and in the ledger
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Input limits
pub mod input {
    /// Maximum attachment size (megabytes)
    pub const MAX_FILE_SIZE_MB: u64 = 20;

    /// Largest attachment limit a config may set (megabytes)
    pub const MAX_FILE_SIZE_MB_LIMIT: u64 = 1024;

    /// Characters of user text included in log lines
    pub const LOG_PREVIEW_CHARS: usize = 50;
}

/// Ledger constants
pub mod ledger {
    /// Rows shown by the summary command
    pub const SUMMARY_LIMIT: usize = 10;

    /// Default ledger file, relative to the project directory
    pub const DEFAULT_LEDGER_FILE: &str = "ledger.db";
}

/// User-facing messages. Never include provider details here.
pub mod messages {
    pub const PROCESSING: &str = "Processing your expense...";

    pub const ERROR_GENERIC: &str = "Something went wrong while reading your expense. Please try again.";

    pub const ERROR_UNREADABLE: &str =
        "I couldn't find an expense in that. Please include what you bought and the amount, then resend.";

    pub const ERROR_INVALID_FILE: &str = "Sorry, I couldn't process that file. Please try again.";

    pub const ERROR_LEDGER_ACCESS: &str = "Unable to access the expense ledger. Please contact the admin.";

    pub const ERROR_CANCELLED: &str = "Request cancelled. Nothing was recorded.";

    pub const NO_SUMMARY_DATA: &str = "No expenses recorded yet. Start logging!";
}
