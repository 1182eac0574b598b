//! Locale-aware conversion between decimal values and display strings.
//!
//! Only the separator conventions differ per locale; amounts themselves are
//! `rust_decimal::Decimal` so no precision is lost round-tripping through
//! text. Unrecognized locale tags fall back to the root (en-style) format
//! instead of failing a request.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::{RateError, Result};

/// Default minimum number of fraction digits rendered by `format`.
pub const DEFAULT_MIN_FRACTION_DIGITS: u32 = 4;

const NBSP: char = '\u{a0}';

lazy_static! {
    static ref LEADING_NUMERAL: Regex = Regex::new(r"^\s*([+-]?\d+(?:\.\d+)?)").unwrap();
}

/// Grouping and decimal separators for a language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleNumberFormat {
    group_sep: char,
    decimal_sep: char,
    min_fraction_digits: u32,
}

impl LocaleNumberFormat {
    /// Resolve a BCP-47-ish language tag to a number format.
    ///
    /// Only the primary language subtag is considered; anything unknown
    /// resolves to the root format (`1,234.5678`) rather than erroring.
    pub fn for_tag(tag: &str) -> Self {
        let language = tag
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let (group_sep, decimal_sep) = match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "da" | "id" | "tr" | "el" | "ro" | "hr" | "sl" => {
                ('.', ',')
            }
            "fr" | "ru" | "sv" | "fi" | "nb" | "no" | "pl" | "cs" | "sk" | "uk" | "lv" | "lt"
            | "et" | "hu" => (NBSP, ','),
            _ => (',', '.'),
        };

        LocaleNumberFormat {
            group_sep,
            decimal_sep,
            min_fraction_digits: DEFAULT_MIN_FRACTION_DIGITS,
        }
    }

    pub fn with_min_fraction_digits(mut self, digits: u32) -> Self {
        self.min_fraction_digits = digits;
        self
    }

    /// Parse `text` under this locale's separator rules.
    ///
    /// Grouping separators are stripped, the decimal separator is mapped to
    /// `.` and the leading signed numeral is parsed. Trailing non-numeric
    /// text (currency suffixes and the like) is ignored.
    pub fn parse(&self, text: &str) -> Result<Decimal> {
        let mut normalized = String::with_capacity(text.len());
        for c in text.chars() {
            if c == self.group_sep || (self.group_sep == NBSP && c == ' ') {
                continue;
            }
            if c == self.decimal_sep {
                normalized.push('.');
            } else {
                normalized.push(c);
            }
        }

        let numeral = LEADING_NUMERAL
            .captures(&normalized)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| RateError::Parse(format!("No numeral found in '{}'", text)))?;

        Decimal::from_str(numeral.as_str())
            .map_err(|e| RateError::Parse(format!("'{}': {}", text, e)))
    }

    /// Render `value` with this locale's separators, thousands grouping and
    /// at least the configured minimum of fraction digits. Fractions longer
    /// than the minimum are kept in full so no precision is dropped.
    pub fn format(&self, value: &Decimal) -> String {
        let plain = value.abs().to_string();
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (plain, String::new()),
        };

        let mut frac = frac_part;
        while (frac.len() as u32) < self.min_fraction_digits {
            frac.push('0');
        }

        let mut grouped = String::new();
        let digits: Vec<char> = int_part.chars().collect();
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.group_sep);
            }
            grouped.push(*c);
        }

        let mut out = String::new();
        if value.is_sign_negative() && !value.is_zero() {
            out.push('-');
        }
        out.push_str(&grouped);
        if !frac.is_empty() {
            out.push(self.decimal_sep);
            out.push_str(&frac);
        }
        out
    }
}
