//! Pattern-based value extraction from fetched pages.
//!
//! Upstream pages have no stable shape, so call sites hold an ordered list
//! of alternative patterns and take whichever matches first.

use regex::Regex;

use crate::errors::{RateError, Result};

/// Try `patterns` in order against `text` and return the first non-empty
/// capture group of the first pattern that matches.
pub fn first_capture(patterns: &[Regex], text: &str, what: &str) -> Result<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            for group in caps.iter().skip(1).flatten() {
                if !group.as_str().is_empty() {
                    return Ok(group.as_str().to_string());
                }
            }
        }
    }
    Err(RateError::Extraction(format!("{} not found", what)))
}

/// Scan all matches of a `(key, value)` capturing pattern and return the
/// value whose key equals `key` case-insensitively.
pub fn keyed_capture(pattern: &Regex, text: &str, key: &str, what: &str) -> Result<String> {
    for caps in pattern.captures_iter(text) {
        let (Some(matched_key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if matched_key.as_str().eq_ignore_ascii_case(key) {
            return Ok(value.as_str().to_string());
        }
    }
    Err(RateError::Extraction(format!("{} not found", what)))
}
