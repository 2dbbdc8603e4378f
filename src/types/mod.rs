pub mod error;
pub mod expense;
pub mod utils;

pub use error::{
    ErrorCategory, ErrorClassifier, LlmError, PipelineError, PipelineErrorKind, Result, ResultExt,
    ScribeError,
};
pub use expense::{
    ExpenseCandidate, ExpenseRecord, ExtractionRequest, RecordDefaults, RequestKind,
    apply_defaults, audio_mime_for_path, image_mime_for_path,
};
pub use utils::{ParseWithDefault, json_f64, json_string, log_filter_warn, preview};
