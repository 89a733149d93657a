//! Dynamic values flowing through state, transforms and render contexts.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// Stored result of a transform that rejected its input.
    Invalid,
}

impl Value {
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Converts any serde-serializable value through its JSON form.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    /// `Null` and `Invalid` both read as "no value" to render strategies.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Null | Value::Invalid)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a key of a map value. Dotted keys walk nested maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(self, |current, part| current.as_map()?.get(part))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Invalid => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => *number != 0.0 && !number.is_nan(),
            Value::String(text) => !text.is_empty(),
            Value::Date(_) | Value::List(_) | Value::Map(_) => true,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Invalid => serde_json::Value::Null,
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Number(number) => number_to_json(*number),
            Value::String(text) => serde_json::Value::String(text.clone()),
            Value::Date(date) => serde_json::Value::String(format_date(date)),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_to_json(number: f64) -> serde_json::Value {
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::from(number as i64)
    } else {
        serde_json::Number::from_f64(number)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Shortest text that parses back to the same number; integral values have
/// no fractional part (`5.0` renders as `5`).
pub fn format_number(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_string()
    } else if number.is_infinite() {
        let text = if number > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if number == 0.0 {
        "0".to_string()
    } else {
        number.to_string()
    }
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`, widened to micro- or nanoseconds when the
/// instant carries them so parsing the text gives the same instant back.
pub fn format_date(date: &DateTime<Utc>) -> String {
    let format = if date.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::AutoSi
    };
    date.to_rfc3339_opts(format, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Invalid => Ok(()),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Number(number) => f.write_str(&format_number(*number)),
            Value::String(text) => f.write_str(text),
            Value::Date(date) => f.write_str(&format_date(date)),
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_missing() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(flag) => Value::Bool(flag),
            serde_json::Value::Number(number) => Value::Number(number.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(text) => Value::String(text),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(number: $ty) -> Self {
                Value::Number(number as f64)
            }
        })*
    };
}

number_from!(i32, i64, u32, u64, usize, f32);

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Value::from(5).to_string(), "5");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Invalid.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn json_conversion_keeps_order_and_integers() {
        let json = serde_json::json!({"title": "Totoro", "year": 1988, "tags": ["a", null]});
        let value = Value::from(json.clone());
        assert_eq!(value.get("title"), Some(&Value::from("Totoro")));
        assert_eq!(value.to_json(), json);
        assert_eq!(
            value.as_map().unwrap().keys().collect::<Vec<_>>(),
            vec!["title", "year", "tags"]
        );
    }

    #[test]
    fn dotted_lookup() {
        let value = Value::map([("film", Value::map([("title", Value::from("Ponyo"))]))]);
        assert_eq!(value.get("film.title").and_then(Value::as_str), Some("Ponyo"));
        assert!(value.get("film.year").is_none());
    }

    #[test]
    fn dates_serialize_with_milliseconds() {
        let date = Utc.with_ymd_and_hms(1988, 4, 16, 0, 0, 0).unwrap();
        assert_eq!(Value::from(date).to_string(), "1988-04-16T00:00:00.000Z");
    }
}
