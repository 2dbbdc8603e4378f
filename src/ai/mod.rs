//! AI Integration Layer
//!
//! Everything between an `ExtractionRequest` and a validated candidate:
//! prompt construction, the provider capability, the retrying client and
//! response validation.

pub mod prompt;
pub mod provider;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use prompt::{ContentPart, ExpensePrompt, ModelPayload, PromptBuilder, expense_schema};
pub use provider::{
    ExtractionProvider, GeminiProvider, MockOutcome, MockProvider, OpenAiProvider, ProviderConfig,
    RawModelOutput, ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use retry::{ExtractionClient, RetryPolicy, Sleeper, TokioSleeper};
pub use timeout::{health_check_timeout, with_cancellation, with_timeout};
pub use validation::{JsonRepairer, ResponseValidator, ValidationReport, find_paid_by};
