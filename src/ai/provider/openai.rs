//! OpenAI API Provider
//!
//! Provider using OpenAI's Chat Completions API with multimodal content
//! parts. Receipt photos go as `image_url` data URIs; voice notes go as
//! `input_audio`, which the API accepts for wav and mp3 only.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    ErrorCategory, ErrorClassifier, ExtractionProvider, LlmError, ProviderConfig, RawModelOutput,
    ResponseMetadata, ResponseTiming, TokenUsage, http_client, normalize_endpoint,
    retry_after_header,
};
use crate::ai::prompt::{ContentPart, ModelPayload};
use crate::types::{Result, ScribeError};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-audio-preview";
const PROVIDER: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ScribeError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or provide llm.api_key in config"
                        .to_string(),
                )
            })?;

        let api_base = normalize_endpoint(
            config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
            PROVIDER,
        )?;
        let client = http_client(&config)?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, payload: &ModelPayload) -> Result<ChatCompletionRequest> {
        let parts = payload
            .parts
            .iter()
            .map(to_message_part)
            .collect::<Result<Vec<_>>>()?;

        Ok(ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(payload.system_instruction.clone()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Parts(parts),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        })
    }
}

/// Map one payload part onto the chat content-part shape
fn to_message_part(part: &ContentPart) -> Result<MessagePart> {
    match part {
        ContentPart::Text(text) => Ok(MessagePart::Text { text: text.clone() }),
        ContentPart::Media { mime_type, data } if mime_type.starts_with("image/") => {
            Ok(MessagePart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{};base64,{}", mime_type, BASE64.encode(data)),
                },
            })
        }
        ContentPart::Media { mime_type, data } => {
            let format = match mime_type.as_str() {
                "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
                "audio/mpeg" | "audio/mp3" => "mp3",
                other => {
                    return Err(LlmError::with_provider(
                        ErrorCategory::BadRequest,
                        format!("Unsupported media type for OpenAI: {}", other),
                        PROVIDER,
                    )
                    .into());
                }
            };
            Ok(MessagePart::InputAudio {
                input_audio: InputAudio {
                    data: BASE64.encode(data),
                    format: format.to_string(),
                },
            })
        }
    }
}

#[async_trait]
impl ExtractionProvider for OpenAiProvider {
    async fn generate(&self, payload: &ModelPayload) -> Result<RawModelOutput> {
        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let request = self.build_request(payload)?;
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_header(response.headers());
            let body = response.text().await.unwrap_or_default();
            let mut err = ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, body),
                PROVIDER,
            );
            if let Some(wait) = retry_after {
                err = err.retry_after(wait);
            }
            return Err(err.into());
        }

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::Transient,
                format!("Failed to decode OpenAI response: {}", e),
                PROVIDER,
            )
        })?;

        let usage = response_body
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let text = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::Transient,
                    "No content in OpenAI response",
                    PROVIDER,
                )
            })?;

        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            tokens = usage.total(),
            "Received response from OpenAI"
        );

        Ok(RawModelOutput {
            text,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    InputAudio { input_audio: InputAudio },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct InputAudio {
    data: String,
    format: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::ExpensePrompt;
    use crate::types::ExtractionRequest;
    use chrono::NaiveDate;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(ProviderConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
    }

    #[test]
    fn test_image_becomes_data_uri() {
        let request = ExtractionRequest::Image {
            bytes: b"img".to_vec(),
            mime_type: "image/jpeg".to_string(),
            caption: None,
        };
        let payload = ExpensePrompt::build(&request, today());
        let body = serde_json::to_value(provider().build_request(&payload).unwrap()).unwrap();

        assert_eq!(body["messages"][0]["role"], "system");
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,aW1n");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_mp3_audio_is_input_audio() {
        let request = ExtractionRequest::Audio {
            bytes: vec![1, 2, 3],
            mime_type: "audio/mpeg".to_string(),
        };
        let payload = ExpensePrompt::build(&request, today());
        let body = serde_json::to_value(provider().build_request(&payload).unwrap()).unwrap();
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts[1]["type"], "input_audio");
        assert_eq!(parts[1]["input_audio"]["format"], "mp3");
    }

    #[test]
    fn test_ogg_audio_is_rejected_without_retry() {
        let request = ExtractionRequest::Audio {
            bytes: vec![1, 2, 3],
            mime_type: "audio/ogg".to_string(),
        };
        let payload = ExpensePrompt::build(&request, today());
        let err = provider().build_request(&payload).unwrap_err();
        assert!(matches!(
            &err,
            ScribeError::Llm(e) if e.category == ErrorCategory::BadRequest
        ));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"choices":[{"message":{"content":"{\"item\":\"Tea\",\"amount\":2}"}}],
                      "usage":{"prompt_tokens":100,"completion_tokens":50}}"#;
        let body: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            body.choices[0].message.content.as_deref(),
            Some(r#"{"item":"Tea","amount":2}"#)
        );
        let usage = body.usage.unwrap();
        assert_eq!(usage.prompt_tokens + usage.completion_tokens, 150);
    }
}
