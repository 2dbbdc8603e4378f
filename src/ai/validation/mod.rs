//! Model Response Validation
//!
//! Validation layer between raw model text and the post-processor:
//! - JSON repair for malformed responses (one attempt)
//! - Structural checks on required fields and primitive types
//! - Deterministic "paid by" extraction from the user's text
//!
//! ## Design Philosophy
//! - Fail fast when `item` or `amount` is missing, drop bad optional fields
//! - The deterministic rule outranks whatever the model guessed

mod json_repair;
mod paid_by;
mod response;

pub use json_repair::JsonRepairer;
pub use paid_by::find_paid_by;
pub use response::{ResponseValidator, ValidationReport};
