//! Attribute values carried by nodes and their textual forms.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Open mapping of extension attribute name to value.
pub type Properties = BTreeMap<String, AttributeValue>;

/// Value stored under an attribute key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    List(Vec<AttributeValue>),
    Map(Properties),
}

impl AttributeValue {
    /// Short name of the variant, used in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Text(_) => "text",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Unsigned(_) => "unsigned",
            AttributeValue::Float(_) => "float",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Timestamp(_) => "timestamp",
            AttributeValue::List(_) => "list",
            AttributeValue::Map(_) => "map",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Properties> {
        match self {
            AttributeValue::Map(m) => Some(m),
            _ => None,
        }
    }

    // Default-value constructors, usable as `fn() -> AttributeValue` in key tables.

    pub fn empty_text() -> Self {
        AttributeValue::Text(String::new())
    }

    pub fn zero() -> Self {
        AttributeValue::Integer(0)
    }

    pub fn zero_float() -> Self {
        AttributeValue::Float(0.0)
    }

    pub fn no() -> Self {
        AttributeValue::Bool(false)
    }

    pub fn empty_list() -> Self {
        AttributeValue::List(Vec::new())
    }

    pub fn empty_map() -> Self {
        AttributeValue::Map(Properties::new())
    }

    pub fn epoch() -> Self {
        AttributeValue::Timestamp(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Unsigned(u) => write!(f, "{}", u),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Bool(b) => write!(f, "{}", if *b { "YES" } else { "NO" }),
            AttributeValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            AttributeValue::List(items) => write!(f, "({})", items.iter().join(", ")),
            AttributeValue::Map(map) => write!(
                f,
                "{{{}}}",
                map.iter().map(|(k, v)| format!("{} = {};", k, v)).join(" ")
            ),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::Timestamp(value)
    }
}

impl From<Properties> for AttributeValue {
    fn from(value: Properties) -> Self {
        AttributeValue::Map(value)
    }
}

/// Formatting conventions used when describing values for humans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Locale {
    /// Replaces the `.` in fractional numbers
    pub decimal_separator: String,
    /// chrono `strftime` pattern for timestamps
    pub date_format: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            decimal_separator: ".".into(),
            date_format: "%Y-%m-%d %H:%M:%S".into(),
        }
    }
}

/// Locale-aware stringifier.
///
/// Returns `None` when the value has no locale-sensitive form; callers then
/// fall back to `Display`.
pub trait LocaleDescribe {
    fn describe_with_locale(&self, locale: &Locale) -> Option<String>;
}

impl LocaleDescribe for AttributeValue {
    fn describe_with_locale(&self, locale: &Locale) -> Option<String> {
        match self {
            AttributeValue::Float(x) => {
                Some(x.to_string().replacen('.', &locale.decimal_separator, 1))
            }
            AttributeValue::Timestamp(t) => Some(t.format(&locale.date_format).to_string()),
            AttributeValue::List(items) => Some(format!(
                "({})",
                items.iter().map(|v| describe_value(v, Some(locale))).join(", ")
            )),
            AttributeValue::Map(map) => Some(format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{} = {};", k, describe_value(v, Some(locale))))
                    .join(" ")
            )),
            _ => None,
        }
    }
}

/// Text form of a value: locale-aware when a locale is given and the value
/// supports it, generic `Display` otherwise.
pub fn describe_value<V>(value: &V, locale: Option<&Locale>) -> String
where
    V: LocaleDescribe + fmt::Display + ?Sized,
{
    locale
        .and_then(|l| value.describe_with_locale(l))
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn given_float_and_comma_locale_when_describing_then_uses_separator() {
        let locale = Locale {
            decimal_separator: ",".into(),
            ..Locale::default()
        };
        let value = AttributeValue::Float(3.5);
        assert_eq!(describe_value(&value, Some(&locale)), "3,5");
        assert_eq!(describe_value(&value, None), "3.5");
    }

    #[test]
    fn given_timestamp_when_describing_with_locale_then_uses_date_format() {
        let locale = Locale {
            date_format: "%d.%m.%Y".into(),
            ..Locale::default()
        };
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let value = AttributeValue::Timestamp(t);
        assert_eq!(describe_value(&value, Some(&locale)), "01.03.2024");
    }

    #[test]
    fn given_text_when_describing_with_locale_then_falls_back_to_display() {
        let value = AttributeValue::from("plain");
        assert_eq!(describe_value(&value, Some(&Locale::default())), "plain");
    }

    #[test]
    fn given_nested_map_when_displaying_then_renders_entries_in_key_order() {
        let mut map = Properties::new();
        map.insert("b".into(), AttributeValue::Bool(true));
        map.insert("a".into(), AttributeValue::Integer(1));
        assert_eq!(AttributeValue::Map(map).to_string(), "{a = 1; b = YES;}");
    }
}
