//! Post-processing
//!
//! Pure last step of the pipeline: resolve who paid, then fill defaults.
//! Precedence for `paid_by`: deterministic phrase match, then a non-blank
//! name reported by the model, then the configured default. A model reply
//! of the built-in sentinel counts as no name.

use chrono::{Local, NaiveDate};

use crate::constants::record as record_constants;
use crate::types::{ExpenseCandidate, ExpenseRecord, RecordDefaults, Result, apply_defaults};

/// Source of "today" for date defaulting
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local system date
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Fixed date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Turn a validated candidate into the final record
pub fn finalize(
    mut candidate: ExpenseCandidate,
    today: NaiveDate,
    defaults: &RecordDefaults,
) -> Result<ExpenseRecord> {
    if let Some(name) = candidate.paid_by_match.take() {
        candidate.paid_by = Some(name);
    } else if candidate
        .paid_by
        .as_deref()
        .is_some_and(|name| name.trim().eq_ignore_ascii_case(record_constants::PAID_BY_SENTINEL))
    {
        candidate.paid_by = None;
    }
    apply_defaults(candidate, today, defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScribeError;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn arb_candidate() -> impl Strategy<Value = ExpenseCandidate> {
        (
            proptest::option::of(arb_date()),
            "[A-Za-z][A-Za-z ]{0,15}",
            0.01f64..1_000_000.0,
            proptest::option::of("[A-Z]{3}"),
            proptest::option::of("[A-Z][a-z]{1,8}"),
            proptest::option::of("[A-Z][a-z]{1,8}"),
        )
            .prop_map(|(date, item, amount, currency, paid_by, paid_by_match)| {
                ExpenseCandidate {
                    date,
                    item: Some(item),
                    amount: Some(amount),
                    currency,
                    paid_by,
                    paid_by_match,
                }
            })
    }

    proptest! {
        #[test]
        fn date_defaults_only_when_absent(candidate in arb_candidate()) {
            let original_date = candidate.date;
            let record = finalize(candidate, today(), &RecordDefaults::default()).unwrap();
            match original_date {
                Some(date) => prop_assert_eq!(record.date, date),
                None => prop_assert_eq!(record.date, today()),
            }
        }

        #[test]
        fn paid_by_is_never_blank(candidate in arb_candidate()) {
            let expected = candidate
                .paid_by_match
                .clone()
                .or_else(|| candidate.paid_by.clone().filter(|name| !name.eq_ignore_ascii_case("Me")))
                .unwrap_or_else(|| "Me".to_string());
            let record = finalize(candidate, today(), &RecordDefaults::default()).unwrap();
            prop_assert_eq!(record.paid_by, expected);
        }

        #[test]
        fn missing_amount_always_fails(mut candidate in arb_candidate()) {
            candidate.amount = None;
            let err = finalize(candidate, today(), &RecordDefaults::default()).unwrap_err();
            let is_missing_amount = matches!(
                err,
                ScribeError::MissingRequiredField { ref fields } if fields == &vec!["amount"]
            );
            prop_assert!(is_missing_amount);
        }
    }

    #[test]
    fn test_phrase_match_beats_model_name() {
        let candidate = ExpenseCandidate {
            item: Some("Lunch".to_string()),
            amount: Some(12.0),
            paid_by: Some("Me".to_string()),
            paid_by_match: Some("Tine".to_string()),
            ..Default::default()
        };
        let record = finalize(candidate, today(), &RecordDefaults::default()).unwrap();
        assert_eq!(record.paid_by, "Tine");
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = RecordDefaults {
            currency: "PHP".to_string(),
            paid_by: "Household".to_string(),
        };
        let candidate = ExpenseCandidate {
            item: Some("Rice".to_string()),
            amount: Some(60.0),
            ..Default::default()
        };
        let record = finalize(candidate, today(), &defaults).unwrap();
        assert_eq!(record.currency, "PHP");
        assert_eq!(record.paid_by, "Household");
    }

    #[test]
    fn test_model_sentinel_yields_to_configured_default() {
        let defaults = RecordDefaults {
            currency: "PHP".to_string(),
            paid_by: "Household".to_string(),
        };
        let candidate = ExpenseCandidate {
            item: Some("Rice".to_string()),
            amount: Some(60.0),
            paid_by: Some("me".to_string()),
            ..Default::default()
        };
        let record = finalize(candidate, today(), &defaults).unwrap();
        assert_eq!(record.paid_by, "Household");
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(today()).today(), today());
    }
}
