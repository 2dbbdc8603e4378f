//! Check Command
//!
//! Verify configuration, provider reachability and ledger access before
//! accepting expenses.

use tracing::debug;

use crate::ai::{SharedProvider, create_provider, health_check_timeout, with_timeout};
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::storage::LedgerStore;
use crate::types::{Result, ScribeError};

/// Outcome of each verification step
#[derive(Debug, Default)]
pub struct CheckReport {
    pub provider: Option<String>,
    pub ledger: Option<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.provider.is_none() && self.ledger.is_none()
    }
}

pub async fn run(ctx: &CommandContext) -> Result<()> {
    let output = Output::new();
    output.section("Expense Scribe check");
    output.success(&format!(
        "Configuration valid (provider: {})",
        ctx.config.llm.provider
    ));

    let report = match create_provider(&ctx.config.provider_config()) {
        Ok(provider) => verify(&provider, ctx.ledger.as_ref()).await,
        Err(e) => CheckReport {
            provider: Some(e.to_string()),
            ledger: ctx.ledger.verify().err().map(|e| e.to_string()),
        },
    };

    match &report.provider {
        None => output.success("Model provider reachable"),
        Some(reason) => output.error(&format!("Model provider: {}", reason)),
    }
    match &report.ledger {
        None => output.success(&format!(
            "Ledger accessible ({})",
            ctx.config.ledger.path.display()
        )),
        Some(reason) => output.error(&format!("Ledger: {}", reason)),
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(ScribeError::Config("Start-up checks failed".to_string()))
    }
}

/// Check the provider and the ledger
pub async fn verify(provider: &SharedProvider, ledger: &dyn LedgerStore) -> CheckReport {
    let provider_result = with_timeout(
        health_check_timeout(),
        provider.health_check(),
        "provider health check",
    )
    .await;
    debug!(provider = provider.name(), model = provider.model(), "Health check finished");

    CheckReport {
        provider: match provider_result {
            Ok(true) => None,
            Ok(false) => Some(format!("{} rejected the health check", provider.name())),
            Err(e) => Some(e.to_string()),
        },
        ledger: ledger.verify().err().map(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockProvider;
    use crate::storage::SqliteLedger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_healthy_setup() {
        let provider: SharedProvider = Arc::new(MockProvider::echo_text());
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let report = verify(&provider, &ledger).await;
        assert!(report.is_ok());
    }

    #[tokio::test]
    async fn test_unhealthy_provider_reported() {
        let provider: SharedProvider = Arc::new(MockProvider::unhealthy());
        let ledger = SqliteLedger::open_in_memory().unwrap();

        let report = verify(&provider, &ledger).await;
        assert!(!report.is_ok());
        assert!(report.provider.unwrap().contains("mock"));
        assert!(report.ledger.is_none());
    }
}
