//! CLI Common Utilities
//!
//! Shared initialization for command handlers: configuration with CLI
//! overrides applied, the ledger, and the assembled pipeline.

use std::path::Path;
use std::sync::Arc;

use crate::ai::{ExtractionClient, create_provider};
use crate::config::{Config, ConfigLoader};
use crate::pipeline::ExpensePipeline;
use crate::storage::{SharedLedger, SqliteLedger};
use crate::types::{ExtractionRequest, Result, ScribeError, audio_mime_for_path, image_mime_for_path};

/// Flags that override configuration for a single run
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub ledger: Option<std::path::PathBuf>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
        if let Some(ledger) = &self.ledger {
            config.ledger.path = ledger.clone();
        }
    }
}

/// Command execution context
#[derive(Clone)]
pub struct CommandContext {
    /// Effective configuration
    pub config: Config,
    /// Ledger shared by every pipeline built from this context
    pub ledger: SharedLedger,
}

impl CommandContext {
    /// Load configuration, apply overrides and open the ledger.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let config = load_config(overrides)?;
        let ledger: SharedLedger = Arc::new(SqliteLedger::open(&config.ledger.path)?);
        Ok(Self { config, ledger })
    }

    /// Build the extraction pipeline from configuration
    pub fn pipeline(&self) -> Result<ExpensePipeline> {
        let provider = create_provider(&self.config.provider_config())?;
        let client = ExtractionClient::new(provider, self.config.retry_policy());
        Ok(
            ExpensePipeline::new(client, self.ledger.clone(), self.config.defaults.clone())
                .with_max_input_bytes(self.config.max_input_bytes()),
        )
    }
}

/// Load and validate configuration with overrides applied
pub fn load_config(overrides: &Overrides) -> Result<Config> {
    let mut config = ConfigLoader::load()?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Read an attachment into an image request
pub fn image_request(path: &Path, caption: Option<String>) -> Result<ExtractionRequest> {
    Ok(ExtractionRequest::Image {
        bytes: read_attachment(path)?,
        mime_type: image_mime_for_path(path).to_string(),
        caption,
    })
}

/// Read an attachment into an audio request
pub fn audio_request(path: &Path) -> Result<ExtractionRequest> {
    Ok(ExtractionRequest::Audio {
        bytes: read_attachment(path)?,
        mime_type: audio_mime_for_path(path).to_string(),
    })
}

fn read_attachment(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| ScribeError::InvalidInput(format!("Cannot read {}: {}", path.display(), e)))
}
