//! JSON Repair Mechanism
//!
//! Turns raw model text into a JSON object. Handles the usual model output
//! issues:
//! - Markdown code fence wrapping (```json ... ```)
//! - Byte order mark
//! - JSON embedded in explanatory text
//! - Trailing commas
//!
//! A response gets one direct parse and at most one repair attempt.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::input as input_constants;
use crate::types::{Result, ScribeError, preview};

/// Bounded repair for model output
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON object, repairing once if the direct parse fails
    ///
    /// Returns (object, was_repaired)
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Map<String, Value>, bool)> {
        let cleaned = self.preprocess(raw);

        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&cleaned) {
            return Ok((obj, false));
        }

        debug!("Direct JSON parse failed, attempting repair");

        let span = self.first_object_span(&cleaned).ok_or_else(|| {
            ScribeError::schema(format!(
                "no JSON object in model output: {}",
                preview(&cleaned, input_constants::LOG_PREVIEW_CHARS)
            ))
        })?;

        let repaired = self.fix_trailing_commas(span);
        match serde_json::from_str::<Value>(&repaired) {
            Ok(Value::Object(obj)) => {
                warn!("JSON object repaired from model output");
                Ok((obj, true))
            }
            Ok(_) => Err(ScribeError::schema("model output is not a JSON object")),
            Err(e) => Err(ScribeError::schema(format!(
                "JSON repair failed: {}",
                e
            ))),
        }
    }

    /// Preprocess raw input
    fn preprocess(&self, raw: &str) -> String {
        let s = raw.trim().trim_start_matches('\u{feff}');
        self.strip_code_fences(s).trim().to_string()
    }

    /// Strip markdown code fences
    fn strip_code_fences(&self, s: &str) -> String {
        let mut result = s;

        // ```json ... ``` or ``` ... ```
        if result.starts_with("```")
            && let Some(first_newline) = result.find('\n')
        {
            result = &result[first_newline + 1..];
        }

        if let Some(stripped) = result.trim_end().strip_suffix("```") {
            result = stripped.trim_end();
        }

        result.to_string()
    }

    /// Remove commas directly before `]` or `}` outside strings
    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some('}') | Some(']')) {
                        continue;
                    }
                }
                _ => {}
            }

            result.push(ch);
        }

        result
    }

    /// First balanced `{...}` span, ignoring braces inside strings
    fn first_object_span<'a>(&self, s: &'a str) -> Option<&'a str> {
        let start = s.find('{')?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&s[start..start + i + 1]);
                    }
                }
                _ => {}
            }
        }

        None
    }
}
