//! Plain-text rendering of records and summaries

use crate::constants::messages;
use crate::storage::LedgerEntry;
use crate::types::ExpenseRecord;

/// Amount with at most two decimals, trailing zeros kept for cents
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

/// Confirmation block shown after a record is extracted
pub fn confirmation(record: &ExpenseRecord) -> String {
    format!(
        "Date:    {}\nItem:    {}\nAmount:  {} {}\nPaid by: {}",
        record.date,
        record.item,
        format_amount(record.amount),
        record.currency,
        record.paid_by
    )
}

/// One line per entry, newest first
pub fn summary(entries: &[LedgerEntry]) -> String {
    if entries.is_empty() {
        return messages::NO_SUMMARY_DATA.to_string();
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("Last {} expenses:", entries.len()));
    for entry in entries {
        let record = &entry.record;
        lines.push(format!(
            "{}: {} - {} {} (by {})",
            record.date,
            record.item,
            format_amount(record.amount),
            record.currency,
            record.paid_by
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestKind;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn record() -> ExpenseRecord {
        ExpenseRecord {
            date: NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(),
            item: "Coffee at Starbucks".to_string(),
            amount: 5.5,
            currency: "USD".to_string(),
            paid_by: "Me".to_string(),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_amount(5.5), "5.50");
        assert_eq!(format_amount(0.126), "0.13");
    }

    #[test]
    fn test_confirmation() {
        let text = confirmation(&record());
        assert!(text.contains("Date:    2026-02-07"));
        assert!(text.contains("Amount:  5.50 USD"));
        assert!(text.contains("Paid by: Me"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(summary(&[]), messages::NO_SUMMARY_DATA);

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            record: record(),
            source: RequestKind::Text,
            created_at: Utc::now(),
        };
        let text = summary(&[entry]);
        assert!(text.starts_with("Last 1 expenses:"));
        assert!(text.contains("2026-02-07: Coffee at Starbucks - 5.50 USD (by Me)"));
    }
}
