//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (platform config dir, expense-scribe/config.toml)
//! 3. Project config (.expense-scribe/config.toml)
//! 4. Environment variables (EXPENSE_SCRIBE_*)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::{ConfigFormat, ConfigLoader};
pub use types::*;
