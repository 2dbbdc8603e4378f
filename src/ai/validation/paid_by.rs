//! "Paid by" rule
//!
//! Deterministic scan for `paid by <name>` / `bought by <name>` in the
//! user's own words. The name runs to the next punctuation mark or line
//! end. When several phrases match, the first one wins.

use regex::Regex;
use std::sync::LazyLock;

static PAID_BY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:paid|bought)\s+by\s+([^\p{P}\r\n]+)").expect("valid regex")
});

/// Name of whoever paid, if the text states it
pub fn find_paid_by(text: &str) -> Option<String> {
    PAID_BY_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|name| !name.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_before_colon() {
        assert_eq!(
            find_paid_by("Paid by Stefan: Bananas 100 peso"),
            Some("Stefan".to_string())
        );
    }

    #[test]
    fn test_case_insensitive_bought_by() {
        assert_eq!(
            find_paid_by("groceries 40 EUR, BOUGHT BY Tine"),
            Some("Tine".to_string())
        );
    }

    #[test]
    fn test_name_runs_to_end_of_string() {
        assert_eq!(
            find_paid_by("Caption: paid by Sarah Lee"),
            Some("Sarah Lee".to_string())
        );
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            find_paid_by("Paid by John, bought by Anna."),
            Some("John".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(find_paid_by("Coffee at Starbucks 5.50 USD"), None);
        assert_eq!(find_paid_by("prepaid by card"), None);
        assert_eq!(find_paid_by("paid by: nobody"), None);
    }

    #[test]
    fn test_stops_at_line_break() {
        assert_eq!(
            find_paid_by("paid by Mia\nLunch 12"),
            Some("Mia".to_string())
        );
    }
}
