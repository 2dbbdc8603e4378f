//! Mock provider for tests and offline runs
//!
//! Plays back a scripted queue of outcomes, one per call. When the queue
//! is empty it falls back to a naive echo of the user text so the CLI can
//! run end to end without network access.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};

use super::{ExtractionProvider, LlmError, RawModelOutput};
use crate::ai::prompt::{ContentPart, ModelPayload};
use crate::types::Result;

static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)(?:\s*([A-Za-z]{3,5})\b)?").expect("valid regex")
});

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Raw model text
    Text(String),
    /// Provider failure
    Fail(LlmError),
    /// Never completes; exercises timeouts and cancellation
    Hang,
}

/// Scripted provider
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockOutcome>>,
    calls: AtomicUsize,
    last_payload: Mutex<Option<ModelPayload>>,
    echo: bool,
    healthy: bool,
}

impl MockProvider {
    /// Provider that answers with the scripted outcomes in order
    pub fn scripted(outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            healthy: true,
            ..Default::default()
        }
    }

    /// Provider that always replies with the same text
    pub fn replying(text: impl Into<String>) -> Self {
        Self::scripted([MockOutcome::Text(text.into())])
    }

    /// Provider that builds a record from the first number in the user text
    pub fn echo_text() -> Self {
        Self {
            echo: true,
            healthy: true,
            ..Default::default()
        }
    }

    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Number of `generate` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payload of the most recent call
    pub fn last_payload(&self) -> Option<ModelPayload> {
        self.last_payload.lock().ok().and_then(|p| p.clone())
    }

    fn next_outcome(&self, payload: &ModelPayload) -> MockOutcome {
        let mut script = match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match script.len() {
            0 if self.echo => MockOutcome::Text(echo_response(payload)),
            0 => MockOutcome::Text("{}".to_string()),
            // The last scripted outcome repeats forever
            1 => script.front().cloned().unwrap_or(MockOutcome::Hang),
            _ => script.pop_front().unwrap_or(MockOutcome::Hang),
        }
    }
}

fn echo_response(payload: &ModelPayload) -> String {
    let text = payload
        .parts
        .iter()
        .find_map(|p| match p {
            ContentPart::Text(t) => Some(t.trim_start_matches("User input:").trim()),
            ContentPart::Media { .. } => None,
        })
        .unwrap_or_default();

    let Some(caps) = AMOUNT_PATTERN.captures(text) else {
        return json!({ "item": text }).to_string();
    };
    let amount: Option<f64> = caps[1].replace(',', ".").parse().ok();
    let item = AMOUNT_PATTERN.replace(text, "").trim().to_string();
    let currency = caps.get(2).map(|m| m.as_str().to_uppercase());

    json!({
        "item": item,
        "amount": amount,
        "currency": currency,
    })
    .to_string()
}

#[async_trait]
impl ExtractionProvider for MockProvider {
    async fn generate(&self, payload: &ModelPayload) -> Result<RawModelOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_payload.lock() {
            *last = Some(payload.clone());
        }

        match self.next_outcome(payload) {
            MockOutcome::Text(text) => Ok(RawModelOutput::text_only(text)),
            MockOutcome::Fail(err) => Err(err.into()),
            MockOutcome::Hang => futures::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::ExpensePrompt;
    use crate::types::{ErrorCategory, ExtractionRequest};
    use chrono::NaiveDate;

    fn payload(text: &str) -> ModelPayload {
        ExpensePrompt::build(
            &ExtractionRequest::Text(text.to_string()),
            NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_script_plays_in_order_and_last_repeats() {
        let provider = MockProvider::scripted([
            MockOutcome::Fail(LlmError::new(ErrorCategory::Transient, "503")),
            MockOutcome::Text("ok".to_string()),
        ]);

        assert!(provider.generate(&payload("x")).await.is_err());
        assert_eq!(provider.generate(&payload("x")).await.unwrap().text, "ok");
        assert_eq!(provider.generate(&payload("x")).await.unwrap().text, "ok");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_echo_extracts_amount_and_currency() {
        let provider = MockProvider::echo_text();
        let out = provider.generate(&payload("Coffee 5.50 USD")).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(value["item"], "Coffee");
        assert_eq!(value["amount"], 5.5);
        assert_eq!(value["currency"], "USD");
    }

    #[tokio::test]
    async fn test_records_last_payload() {
        let provider = MockProvider::replying("{}");
        provider.generate(&payload("Tea 2")).await.unwrap();
        let last = provider.last_payload().unwrap();
        assert_eq!(
            last.parts,
            vec![ContentPart::Text("User input: Tea 2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_health() {
        assert!(MockProvider::echo_text().health_check().await.unwrap());
        assert!(!MockProvider::unhealthy().health_check().await.unwrap());
    }
}
