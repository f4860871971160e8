//! Display formatting for document field values, and word wrapping.

use serde_json::Value;

use leadline_shared::{Cents, format_usd};

/// Placeholder printed for any absent or blank value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Amounts at or above this are printed as currency.
const CURRENCY_THRESHOLD: f64 = 1000.0;

/// A field value as it arrives from the stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Text(String),
    Bool(bool),
    Number(f64),
    List(Vec<FieldValue>),
    /// Anything structured we have no dedicated rendering for.
    Json(Value),
}

impl FieldValue {
    /// The string printed in the value column.
    pub fn display(&self) -> String {
        match self {
            Self::Missing => NOT_AVAILABLE.to_string(),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    NOT_AVAILABLE.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Self::Bool(b) => yes_no(*b).to_string(),
            Self::Number(n) => format_number(*n),
            Self::List(items) => join_items(items.iter().map(FieldValue::display)),
            Self::Json(value) => display_json(value),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.display() == NOT_AVAILABLE
    }
}

impl From<&Option<String>> for FieldValue {
    fn from(value: &Option<String>) -> Self {
        match value {
            Some(s) => Self::Text(s.clone()),
            None => Self::Missing,
        }
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Missing, Self::Bool)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl From<Option<u32>> for FieldValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Missing, |n| Self::Number(f64::from(n)))
    }
}

impl From<&[String]> for FieldValue {
    fn from(items: &[String]) -> Self {
        Self::List(items.iter().cloned().map(Self::Text).collect())
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn join_items(items: impl Iterator<Item = String>) -> String {
    let parts: Vec<String> = items.filter(|s| s != NOT_AVAILABLE).collect();
    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join(", ")
    }
}

fn display_json(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_number),
        Value::String(s) => FieldValue::Text(s.clone()).display(),
        Value::Array(items) => join_items(items.iter().map(display_json)),
        Value::Object(_) => value.to_string(),
    }
}

/// Numbers of 1000 or more become currency; smaller ones print plainly.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    if n.abs() >= CURRENCY_THRESHOLD {
        return format_currency(n);
    }
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        let s = format!("{n:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// `1234.5` -> `$1,234.50`.
pub fn format_currency(n: f64) -> String {
    format_usd(n, Cents::Always)
}

/// Greedy word wrap to at most `max_chars` per line.
///
/// Explicit newlines are kept. Words longer than a line are split hard.
/// Always returns at least one line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            if current_len > 0 && current_len + 1 + word.len() > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        if current_len > 0 {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
