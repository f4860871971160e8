//! Forgiving deserializers for browser-submitted form values.
//!
//! Multi-step forms post numbers and checkboxes in whatever shape the widget
//! produced: `2`, `"2"`, `""`, `"yes"`, `true`. These helpers accept all of
//! them and collapse anything unusable to `None` instead of rejecting the
//! whole submission.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `Option<f64>` from a number, a numeric string (commas and `$` allowed), or blank.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// `Option<u32>` from a non-negative integer, an integer string, or blank.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

/// `Option<bool>` from a boolean or one of `yes/no/true/false/on/off/1/0`.
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" | "y" => Some(true),
            "no" | "false" | "off" | "0" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// `Option<String>` from text, a number or a boolean. Blank text and any
/// other shape become `None`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_from_value))
}

/// `Vec<String>` from a list (unusable items dropped) or a single scalar.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(text_from_value).collect(),
        Some(other) => text_from_value(&other).into_iter().collect(),
        None => Vec::new(),
    })
}

/// Any `T`, or `None` when the value does not match one of its shapes.
pub fn or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | ' '))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse().ok()
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "super::opt_f64")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "super::opt_u32")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "super::opt_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "super::opt_string")]
        text: Option<String>,
        #[serde(default, deserialize_with = "super::string_list")]
        list: Vec<String>,
    }

    fn fields(json: &str) -> Fields {
        serde_json::from_str(json).expect("fields parse")
    }

    #[test]
    fn numbers_accept_strings_and_blanks() {
        assert_eq!(fields(r#"{"amount": "$250,000"}"#).amount, Some(250_000.0));
        assert_eq!(fields(r#"{"amount": 12.5}"#).amount, Some(12.5));
        assert_eq!(fields(r#"{"amount": ""}"#).amount, None);
        assert_eq!(fields(r#"{"amount": null}"#).amount, None);
        assert_eq!(fields(r#"{}"#).amount, None);
    }

    #[test]
    fn counts_reject_fractions_and_negatives() {
        assert_eq!(fields(r#"{"count": "3"}"#).count, Some(3));
        assert_eq!(fields(r#"{"count": 2.5}"#).count, None);
        assert_eq!(fields(r#"{"count": -1}"#).count, None);
    }

    #[test]
    fn flags_accept_form_spellings() {
        assert_eq!(fields(r#"{"flag": "yes"}"#).flag, Some(true));
        assert_eq!(fields(r#"{"flag": "No"}"#).flag, Some(false));
        assert_eq!(fields(r#"{"flag": true}"#).flag, Some(true));
        assert_eq!(fields(r#"{"flag": "maybe"}"#).flag, None);
    }

    #[test]
    fn text_accepts_numbers_and_booleans() {
        assert_eq!(fields(r#"{"text": 90210}"#).text.as_deref(), Some("90210"));
        assert_eq!(fields(r#"{"text": "Reno"}"#).text.as_deref(), Some("Reno"));
        assert_eq!(fields(r#"{"text": true}"#).text.as_deref(), Some("true"));
        assert_eq!(fields(r#"{"text": "  "}"#).text, None);
        assert_eq!(fields(r#"{"text": {"a": 1}}"#).text, None);
        assert_eq!(fields(r#"{"text": ["x"]}"#).text, None);
    }

    #[test]
    fn lists_keep_usable_items() {
        assert_eq!(fields(r#"{"list": ["waiver", 2, null, ""]}"#).list, vec!["waiver", "2"]);
        assert_eq!(fields(r#"{"list": "waiver"}"#).list, vec!["waiver"]);
        assert!(fields(r#"{"list": null}"#).list.is_empty());
    }
}
