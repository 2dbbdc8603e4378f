//! Expense Schema & Defaults
//!
//! The canonical expense record, the partially-filled candidate produced by
//! validation, and the inbound request shapes.

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{Result, ScribeError};
use crate::constants::record as record_constants;

// =============================================================================
// Expense Record
// =============================================================================

/// A finalized expense, ready to be appended to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Calendar date (serialized as YYYY-MM-DD)
    pub date: NaiveDate,
    /// Short description of what was bought
    pub item: String,
    /// Positive amount
    pub amount: f64,
    /// Currency code or colloquial currency word
    pub currency: String,
    /// Who paid
    pub paid_by: String,
}

/// Parsed-but-not-yet-defaulted expense structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseCandidate {
    pub date: Option<NaiveDate>,
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    /// `paid_by` as reported by the model
    pub paid_by: Option<String>,
    /// Name captured by the deterministic "paid by" rule
    pub paid_by_match: Option<String>,
}

/// Values used for absent optional fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefaults {
    pub currency: String,
    pub paid_by: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            currency: record_constants::DEFAULT_CURRENCY.to_string(),
            paid_by: record_constants::PAID_BY_SENTINEL.to_string(),
        }
    }
}

/// Fill absent optional fields; fail if `item` or `amount` is missing.
///
/// A present `date` is never overwritten.
pub fn apply_defaults(
    candidate: ExpenseCandidate,
    today: NaiveDate,
    defaults: &RecordDefaults,
) -> Result<ExpenseRecord> {
    let item = candidate
        .item
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let amount = candidate.amount.filter(|a| a.is_finite() && *a > 0.0);

    let (item, amount) = match (item, amount) {
        (Some(item), Some(amount)) => (item, amount),
        (item, amount) => {
            let mut fields = Vec::new();
            if item.is_none() {
                fields.push("item");
            }
            if amount.is_none() {
                fields.push("amount");
            }
            return Err(ScribeError::MissingRequiredField { fields });
        }
    };

    Ok(ExpenseRecord {
        date: candidate.date.unwrap_or(today),
        item,
        amount,
        currency: non_blank(candidate.currency).unwrap_or_else(|| defaults.currency.clone()),
        paid_by: non_blank(candidate.paid_by).unwrap_or_else(|| defaults.paid_by.clone()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Extraction Request
// =============================================================================

/// One inbound user message, normalized by the transport layer
#[derive(Clone)]
pub enum ExtractionRequest {
    Text(String),
    Image {
        bytes: Vec<u8>,
        mime_type: String,
        caption: Option<String>,
    },
    Audio {
        bytes: Vec<u8>,
        mime_type: String,
    },
}

// Media bytes are never printed
impl fmt::Debug for ExtractionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Image {
                bytes,
                mime_type,
                caption,
            } => f
                .debug_struct("Image")
                .field("bytes", &format_args!("<{} bytes>", bytes.len()))
                .field("mime_type", mime_type)
                .field("caption", caption)
                .finish(),
            Self::Audio { bytes, mime_type } => f
                .debug_struct("Audio")
                .field("bytes", &format_args!("<{} bytes>", bytes.len()))
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

impl ExtractionRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Text(_) => RequestKind::Text,
            Self::Image { .. } => RequestKind::Image,
            Self::Audio { .. } => RequestKind::Audio,
        }
    }

    /// User-written text that travels with the request (message or caption)
    pub fn text_context(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Image { caption, .. } => caption.as_deref().filter(|c| !c.trim().is_empty()),
            Self::Audio { .. } => None,
        }
    }

    /// Reject requests that can never produce a record
    pub fn check(&self, max_bytes: u64) -> Result<()> {
        match self {
            Self::Text(text) if text.trim().is_empty() => {
                Err(ScribeError::InvalidInput("empty message".to_string()))
            }
            Self::Text(_) => Ok(()),
            Self::Image { bytes, .. } | Self::Audio { bytes, .. } => {
                if bytes.is_empty() {
                    return Err(ScribeError::InvalidInput("empty attachment".to_string()));
                }
                if bytes.len() as u64 > max_bytes {
                    return Err(ScribeError::InvalidInput(format!(
                        "attachment is {} bytes, limit is {}",
                        bytes.len(),
                        max_bytes
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Input modality, also stored alongside ledger rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Text,
    Image,
    Audio,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            _ => Err(format!("Unknown request kind: {}", s)),
        }
    }
}

// =============================================================================
// MIME Detection
// =============================================================================

/// MIME type for a receipt photo, from its file extension
pub fn image_mime_for_path(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// MIME type for a voice note, from its file extension
pub fn audio_mime_for_path(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "audio/ogg",
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
    }

    fn candidate(item: &str, amount: f64) -> ExpenseCandidate {
        ExpenseCandidate {
            item: Some(item.to_string()),
            amount: Some(amount),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_fill_optional_fields() {
        let record = apply_defaults(candidate("Coffee", 5.5), today(), &RecordDefaults::default())
            .unwrap();
        assert_eq!(record.date, today());
        assert_eq!(record.currency, "USD");
        assert_eq!(record.paid_by, "Me");
    }

    #[test]
    fn test_present_date_is_kept() {
        let mut c = candidate("Taxi", 12.0);
        c.date = NaiveDate::from_ymd_opt(2025, 12, 24);
        let record = apply_defaults(c, today(), &RecordDefaults::default()).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
    }

    #[test]
    fn test_missing_required_fields_are_named() {
        let err = apply_defaults(ExpenseCandidate::default(), today(), &RecordDefaults::default())
            .unwrap_err();
        match err {
            ScribeError::MissingRequiredField { fields } => {
                assert_eq!(fields, vec!["item", "amount"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_item_and_non_positive_amount_count_as_missing() {
        let err = apply_defaults(candidate("   ", 0.0), today(), &RecordDefaults::default())
            .unwrap_err();
        assert!(matches!(err, ScribeError::MissingRequiredField { ref fields } if fields.len() == 2));
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = RecordDefaults {
            currency: "PHP".to_string(),
            paid_by: "Household".to_string(),
        };
        let record = apply_defaults(candidate("Rice", 300.0), today(), &defaults).unwrap();
        assert_eq!(record.currency, "PHP");
        assert_eq!(record.paid_by, "Household");
    }

    #[test]
    fn test_record_serializes_iso_date() {
        let record = apply_defaults(candidate("Tea", 3.0), today(), &RecordDefaults::default())
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2026-02-07");
        assert_eq!(json["amount"], 3.0);
    }

    #[test]
    fn test_text_context() {
        let image = ExtractionRequest::Image {
            bytes: vec![1, 2, 3],
            mime_type: "image/jpeg".to_string(),
            caption: Some("Paid by Sarah".to_string()),
        };
        assert_eq!(image.text_context(), Some("Paid by Sarah"));

        let audio = ExtractionRequest::Audio {
            bytes: vec![1],
            mime_type: "audio/ogg".to_string(),
        };
        assert_eq!(audio.text_context(), None);
    }

    #[test]
    fn test_check_rejects_oversized_and_empty() {
        let image = ExtractionRequest::Image {
            bytes: vec![0; 11],
            mime_type: "image/png".to_string(),
            caption: None,
        };
        assert!(image.check(10).is_err());
        assert!(image.check(11).is_ok());
        assert!(ExtractionRequest::Text("  ".to_string()).check(10).is_err());
    }

    #[test]
    fn test_debug_hides_media_bytes() {
        let audio = ExtractionRequest::Audio {
            bytes: vec![42; 4],
            mime_type: "audio/ogg".to_string(),
        };
        let shown = format!("{:?}", audio);
        assert!(shown.contains("<4 bytes>"));
        assert!(!shown.contains("42"));
    }

    #[test]
    fn test_mime_detection() {
        assert_eq!(image_mime_for_path(Path::new("r.JPG")), "image/jpeg");
        assert_eq!(image_mime_for_path(Path::new("r.png")), "image/png");
        assert_eq!(image_mime_for_path(Path::new("r")), "image/jpeg");
        assert_eq!(audio_mime_for_path(Path::new("v.oga")), "audio/ogg");
        assert_eq!(audio_mime_for_path(Path::new("v.mp3")), "audio/mpeg");
    }
}
