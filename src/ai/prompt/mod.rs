//! Prompt Builder System
//!
//! Turns an `ExtractionRequest` into the payload a model call needs:
//! a fixed system instruction plus ordered content parts.
//!
//! ## Modalities
//!
//! - **Text**: the message, wrapped as user input
//! - **Image**: caption and receipt photo as one joint context
//! - **Audio**: raw voice note; the model transcribes and extracts in one call

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::constants::record as record_constants;
use crate::types::ExtractionRequest;

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered rules
    Objectives(Vec<String>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Code block with language
    Code { language: String, content: String },
    /// Custom section
    Custom(String),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn custom(mut self, content: &str) -> Self {
        self.sections
            .push(PromptSection::Custom(content.to_string()));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<RULES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Custom(content) => {
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

// =============================================================================
// Model Payload
// =============================================================================

/// One ordered piece of model input
#[derive(Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Media { mime_type: String, data: Vec<u8> },
}

impl std::fmt::Debug for ContentPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Media { mime_type, data } => f
                .debug_struct("Media")
                .field("mime_type", mime_type)
                .field("data", &format_args!("<{} bytes>", data.len()))
                .finish(),
        }
    }
}

/// Everything a provider needs for one extraction call
#[derive(Debug, Clone)]
pub struct ModelPayload {
    /// Fixed instruction describing schema and extraction rules
    pub system_instruction: String,
    /// User content, in reading order
    pub parts: Vec<ContentPart>,
    /// JSON Schema of the expected object
    pub response_schema: Value,
}

impl ModelPayload {
    pub fn media_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, ContentPart::Media { .. }))
            .count()
    }
}

/// JSON Schema for the object the model must return
pub fn expense_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {
                "type": "string",
                "description": "Date in YYYY-MM-DD format"
            },
            "item": {
                "type": "string",
                "description": "Short description of the item or expense"
            },
            "amount": {
                "type": "number",
                "description": "Numeric amount of the expense"
            },
            "currency": {
                "type": "string",
                "description": "Currency code or name (e.g., USD, PHP, Peso)"
            },
            "paid_by": {
                "type": "string",
                "description": "Name of the person who paid; omitted if nobody is named"
            },
            "transcript": {
                "type": "string",
                "description": "Verbatim transcription, only for voice notes"
            }
        },
        "required": ["item", "amount"]
    })
}

/// Builds extraction payloads for every input modality
pub struct ExpensePrompt;

impl ExpensePrompt {
    /// System instruction shared by all modalities
    pub fn system_instruction(today: NaiveDate) -> String {
        let today = today.format(record_constants::DATE_FORMAT).to_string();
        let schema = serde_json::to_string_pretty(&expense_schema()).unwrap_or_default();

        PromptBuilder::new()
            .role(
                "expense tracking assistant",
                "extracting structured expense data from text, receipt photos and voice notes",
            )
            .section("Current date", &today)
            .custom("Output MUST be a single JSON object matching this schema:")
            .code("json", &schema)
            .objectives(vec![
                &format!(
                    "Date: if a date is mentioned, use it in YYYY-MM-DD format. Otherwise use today's date ({}).",
                    today
                ),
                "Item: brief description of what was purchased (e.g. \"Coffee\", \"Groceries\", \"Gas\").",
                "Amount: numeric value only (e.g. 45.50, 100). For receipts use the total.",
                "Currency: ISO code or the word used by the user (e.g. \"USD\", \"PHP\", \"EUR\", \"peso\").",
                "Paid by: if the text, caption or audio says \"paid by <name>\" or \"bought by <name>\", paid_by is <name> (the words up to the next punctuation). Also accept \"<name> paid\" and \"<name> bought\". If several names match, use the first one. If no name is mentioned, omit paid_by.",
            ])
            .section(
                "Receipt photos",
                "Read the receipt text. Treat the image and its caption as ONE context: the caption often names who paid while the image holds the amount and items.",
            )
            .section(
                "Voice notes",
                "Transcribe the audio into the \"transcript\" field, then extract the expense from it.",
            )
            .custom("Return ONLY the JSON object, no additional text or explanation.")
            .build()
    }

    /// Build the payload for one request
    pub fn build(request: &ExtractionRequest, today: NaiveDate) -> ModelPayload {
        let parts = match request {
            ExtractionRequest::Text(text) => {
                vec![ContentPart::Text(format!("User input: {}", text.trim()))]
            }
            ExtractionRequest::Image {
                bytes,
                mime_type,
                caption,
            } => {
                let mut parts = Vec::with_capacity(2);
                let intro = match caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                    Some(caption) => format!(
                        "Receipt photo attached. Caption from the user (same context as the image): {}",
                        caption
                    ),
                    None => "Receipt photo attached. No caption was provided.".to_string(),
                };
                parts.push(ContentPart::Text(intro));
                parts.push(ContentPart::Media {
                    mime_type: mime_type.clone(),
                    data: bytes.clone(),
                });
                parts
            }
            ExtractionRequest::Audio { bytes, mime_type } => vec![
                ContentPart::Text(
                    "Voice note attached. Transcribe it and extract the expense.".to_string(),
                ),
                ContentPart::Media {
                    mime_type: mime_type.clone(),
                    data: bytes.clone(),
                },
            ],
        };

        ModelPayload {
            system_instruction: Self::system_instruction(today),
            parts,
            response_schema: expense_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
    }

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("bookkeeper", "receipts")
            .objectives(vec!["Read totals", "Keep currency"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("bookkeeper"));
        assert!(prompt.contains("<RULES>"));
        assert!(prompt.contains("1. Read totals"));
        assert!(prompt.contains("2. Keep currency"));
    }

    #[test]
    fn test_system_instruction_states_schema_and_paid_by_rule() {
        let instruction = ExpensePrompt::system_instruction(today());
        assert!(instruction.contains("single JSON object"));
        assert!(instruction.contains("\"paid_by\""));
        assert!(instruction.contains("paid by <name>"));
        assert!(instruction.contains("bought by <name>"));
        assert!(instruction.contains("2026-02-07"));
    }

    #[test]
    fn test_instruction_leaves_missing_payer_to_defaults() {
        let instruction = ExpensePrompt::system_instruction(today());
        assert!(instruction.contains("omit paid_by"));
        assert!(!instruction.contains(&format!("use \"{}\"", record_constants::PAID_BY_SENTINEL)));
    }

    #[test]
    fn test_text_payload() {
        let request = ExtractionRequest::Text("Coffee 5.50 USD".to_string());
        let payload = ExpensePrompt::build(&request, today());
        assert_eq!(payload.media_count(), 0);
        assert_eq!(
            payload.parts,
            vec![ContentPart::Text("User input: Coffee 5.50 USD".to_string())]
        );
    }

    #[test]
    fn test_image_payload_joins_caption_and_image() {
        let request = ExtractionRequest::Image {
            bytes: vec![0xFF, 0xD8],
            mime_type: "image/jpeg".to_string(),
            caption: Some("Paid by Sarah".to_string()),
        };
        let payload = ExpensePrompt::build(&request, today());
        assert_eq!(payload.parts.len(), 2);
        match &payload.parts[0] {
            ContentPart::Text(text) => assert!(text.contains("Paid by Sarah")),
            other => panic!("expected caption text first, got {:?}", other),
        }
        assert_eq!(
            payload.parts[1],
            ContentPart::Media {
                mime_type: "image/jpeg".to_string(),
                data: vec![0xFF, 0xD8],
            }
        );
    }

    #[test]
    fn test_audio_payload_passes_raw_bytes() {
        let request = ExtractionRequest::Audio {
            bytes: vec![1, 2, 3],
            mime_type: "audio/ogg".to_string(),
        };
        let payload = ExpensePrompt::build(&request, today());
        assert_eq!(payload.media_count(), 1);
        assert!(payload.system_instruction.contains("transcript"));
    }

    #[test]
    fn test_schema_requires_item_and_amount() {
        let schema = expense_schema();
        assert_eq!(schema["required"], json!(["item", "amount"]));
        assert_eq!(schema["properties"]["amount"]["type"], "number");
    }
}
