//! Response Validation
//!
//! Coerces a parsed model object into an `ExpenseCandidate`:
//! - `item` and `amount` must be present with the right primitive type
//! - optional fields of the wrong type read as absent
//! - dates that are not `YYYY-MM-DD` read as absent
//! - the deterministic "paid by" rule runs over the user's own text

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use super::json_repair::JsonRepairer;
use super::paid_by::find_paid_by;
use crate::ai::provider::RawModelOutput;
use crate::constants::record as record_constants;
use crate::types::{ExpenseCandidate, Result, ScribeError, json_f64, json_string};

/// Outcome of validating one model response
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub candidate: ExpenseCandidate,
    /// Whether the JSON needed the repair pass
    pub was_repaired: bool,
    /// Optional fields present in the output but unusable
    pub dropped_fields: Vec<&'static str>,
    /// Transcript returned for voice notes
    pub transcript: Option<String>,
}

/// Validator for expense extraction output
#[derive(Debug, Default, Clone)]
pub struct ResponseValidator {
    repairer: JsonRepairer,
}

impl ResponseValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw output; `text_context` is the message text or caption
    pub fn validate(
        &self,
        raw: &RawModelOutput,
        text_context: Option<&str>,
    ) -> Result<ExpenseCandidate> {
        self.validate_report(raw, text_context)
            .map(|report| report.candidate)
    }

    pub fn validate_report(
        &self,
        raw: &RawModelOutput,
        text_context: Option<&str>,
    ) -> Result<ValidationReport> {
        let (obj, was_repaired) = self.repairer.parse_or_repair(&raw.text)?;
        let value = Value::Object(obj);

        let item = json_string(&value, "item");
        let amount = json_f64(&value, "amount");

        let mut missing = Vec::new();
        if item.is_none() {
            missing.push("item");
        }
        if amount.is_none() {
            missing.push("amount");
        }
        if !missing.is_empty() {
            return Err(ScribeError::schema(format!(
                "model output lacks required field(s): {}",
                missing.join(", ")
            )));
        }

        let mut dropped_fields = Vec::new();

        let date = match json_string(&value, "date") {
            Some(raw_date) => {
                let parsed =
                    NaiveDate::parse_from_str(&raw_date, record_constants::DATE_FORMAT).ok();
                if parsed.is_none() {
                    debug!(date = %raw_date, "Ignoring unparseable date");
                    dropped_fields.push("date");
                }
                parsed
            }
            None => {
                note_wrong_type(&value, "date", &mut dropped_fields);
                None
            }
        };

        let currency = json_string(&value, "currency");
        if currency.is_none() {
            note_wrong_type(&value, "currency", &mut dropped_fields);
        }
        let paid_by = json_string(&value, "paid_by");
        if paid_by.is_none() {
            note_wrong_type(&value, "paid_by", &mut dropped_fields);
        }
        let transcript = json_string(&value, "transcript");

        let paid_by_match = text_context
            .and_then(find_paid_by)
            .or_else(|| transcript.as_deref().and_then(find_paid_by));

        if !dropped_fields.is_empty() {
            debug!(fields = ?dropped_fields, "Optional fields dropped during validation");
        }

        Ok(ValidationReport {
            candidate: ExpenseCandidate {
                date,
                item,
                amount,
                currency,
                paid_by,
                paid_by_match,
            },
            was_repaired,
            dropped_fields,
            transcript,
        })
    }
}

/// Record fields that are present but not a usable string
fn note_wrong_type(value: &Value, key: &'static str, dropped: &mut Vec<&'static str>) {
    if value.get(key).is_some_and(|v| !v.is_null()) {
        dropped.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(text: &str, context: Option<&str>) -> Result<ValidationReport> {
        ResponseValidator::new().validate_report(&RawModelOutput::text_only(text), context)
    }

    #[test]
    fn test_full_candidate() {
        let report = validate(
            r#"{"date":"2026-01-31","item":"Bananas","amount":100,"currency":"peso","paid_by":"Stefan"}"#,
            None,
        )
        .unwrap();
        let c = report.candidate;
        assert_eq!(c.date, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert_eq!(c.item.as_deref(), Some("Bananas"));
        assert_eq!(c.amount, Some(100.0));
        assert_eq!(c.currency.as_deref(), Some("peso"));
        assert_eq!(c.paid_by.as_deref(), Some("Stefan"));
        assert!(!report.was_repaired);
    }

    #[test]
    fn test_repaired_prose() {
        let report = validate(r#"Sure! {"item":"Tea","amount":3}"#, None).unwrap();
        assert!(report.was_repaired);
        assert_eq!(report.candidate.item.as_deref(), Some("Tea"));
        assert_eq!(report.candidate.amount, Some(3.0));
    }

    #[test]
    fn test_missing_required_fields_name_both() {
        let err = validate(r#"{"currency":"USD"}"#, None).unwrap_err();
        match err {
            ScribeError::Schema { details } => {
                assert!(details.contains("item"));
                assert!(details.contains("amount"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_amount_is_absent() {
        let err = validate(r#"{"item":"Tea","amount":"3.00"}"#, None).unwrap_err();
        assert!(matches!(err, ScribeError::Schema { ref details } if details.contains("amount")));
    }

    #[test]
    fn test_wrong_type_optionals_are_dropped() {
        let report = validate(
            r#"{"item":"Tea","amount":3,"date":"last friday","currency":7,"paid_by":null}"#,
            None,
        )
        .unwrap();
        assert_eq!(report.candidate.date, None);
        assert_eq!(report.candidate.currency, None);
        assert_eq!(report.candidate.paid_by, None);
        assert_eq!(report.dropped_fields, vec!["date", "currency"]);
    }

    #[test]
    fn test_paid_by_from_text_context() {
        let report = validate(
            r#"{"item":"Bananas","amount":100}"#,
            Some("Paid by Stefan: Bananas 100 peso"),
        )
        .unwrap();
        assert_eq!(report.candidate.paid_by_match.as_deref(), Some("Stefan"));
    }

    #[test]
    fn test_paid_by_from_transcript() {
        let report = validate(
            r#"{"item":"Taxi","amount":12,"transcript":"Taxi twelve euros, paid by Tine."}"#,
            None,
        )
        .unwrap();
        assert_eq!(report.candidate.paid_by_match.as_deref(), Some("Tine"));
        assert!(report.transcript.is_some());
    }

    #[test]
    fn test_no_json_is_schema_error() {
        let err = validate("I cannot help with that", None).unwrap_err();
        assert!(matches!(err, ScribeError::Schema { .. }));
    }
}
