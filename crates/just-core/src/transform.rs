//! Type-keyed converters between attribute strings and typed values.
//!
//! A transform never fails with an error: input it cannot handle yields
//! [`Transformed::Invalid`], which callers check for and handle locally.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;

use crate::error::TransformError;
use crate::value::{format_date, format_number, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Transformed<T> {
    Valid(T),
    Invalid,
}

impl<T> Transformed<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Transformed::Valid(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Transformed::Invalid)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Transformed::Valid(value) => Some(value),
            Transformed::Invalid => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Transformed<U> {
        match self {
            Transformed::Valid(value) => Transformed::Valid(f(value)),
            Transformed::Invalid => Transformed::Invalid,
        }
    }
}

impl Transformed<Value> {
    /// Folds the result into a storable value, `Invalid` included.
    pub fn into_value(self) -> Value {
        match self {
            Transformed::Valid(value) => value,
            Transformed::Invalid => Value::Invalid,
        }
    }
}

impl<T> From<Option<T>> for Transformed<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Transformed::Valid(value),
            None => Transformed::Invalid,
        }
    }
}

/// Bidirectional converter registered under a type key.
///
/// Every transform must satisfy `extract(serialize(v)) == v` for the values
/// it accepts.
pub trait Transform {
    fn type_for(&self) -> &str;

    /// Whether `value` is of the type this transform handles.
    fn detect(&self, value: &Value) -> bool;

    fn extract(&self, value: &Value) -> Transformed<Value>;

    fn serialize(&self, value: &Value) -> Transformed<String>;
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Invalid => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StringTransform;

impl Transform for StringTransform {
    fn type_for(&self) -> &str {
        "string"
    }

    fn detect(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }

    fn extract(&self, value: &Value) -> Transformed<Value> {
        self.serialize(value).map(Value::String)
    }

    fn serialize(&self, value: &Value) -> Transformed<String> {
        if value.is_missing() {
            return Transformed::Invalid;
        }
        Transformed::Valid(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NumberTransform;

impl NumberTransform {
    fn parse(&self, value: &Value) -> Option<f64> {
        if is_blank(value) {
            return None;
        }
        let number = match value {
            Value::Number(number) => *number,
            Value::String(text) => parse_float_prefix(text)?,
            _ => return None,
        };
        (!number.is_nan()).then_some(number)
    }
}

impl Transform for NumberTransform {
    fn type_for(&self) -> &str {
        "number"
    }

    fn detect(&self, value: &Value) -> bool {
        matches!(value, Value::Number(_))
    }

    fn extract(&self, value: &Value) -> Transformed<Value> {
        self.parse(value).map(Value::Number).into()
    }

    fn serialize(&self, value: &Value) -> Transformed<String> {
        self.parse(value).map(format_number).into()
    }
}

/// Parses the longest leading float literal, ignoring leading whitespace and
/// any trailing text (`"12px"` is 12).
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if text[end..].starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut fraction_end = end + 1;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        mantissa_digits += fraction_end - end - 1;
        if mantissa_digits > 0 {
            end = fraction_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exponent_end = end + 1;
        if exponent_end < bytes.len() && matches!(bytes[exponent_end], b'+' | b'-') {
            exponent_end += 1;
        }
        let exponent_digits = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits {
            end = exponent_end;
        }
    }
    text[..end].parse::<f64>().ok()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanTransform;

impl Transform for BooleanTransform {
    fn type_for(&self) -> &str {
        "boolean"
    }

    fn detect(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn extract(&self, value: &Value) -> Transformed<Value> {
        if is_blank(value) {
            return Transformed::Invalid;
        }
        let flag = match value {
            Value::Bool(flag) => *flag,
            Value::String(text) => {
                text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("t") || text == "1"
            }
            Value::Number(number) => *number == 1.0,
            _ => false,
        };
        Transformed::Valid(Value::Bool(flag))
    }

    fn serialize(&self, value: &Value) -> Transformed<String> {
        if is_blank(value) {
            return Transformed::Invalid;
        }
        Transformed::Valid(value.is_truthy().to_string())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DateTransform;

impl Transform for DateTransform {
    fn type_for(&self) -> &str {
        "date"
    }

    fn detect(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn extract(&self, value: &Value) -> Transformed<Value> {
        let date = match value {
            Value::Date(date) => Some(*date),
            Value::String(text) => parse_date(text),
            Value::Number(millis) if millis.is_finite() => {
                Utc.timestamp_millis_opt(*millis as i64).single()
            }
            _ => None,
        };
        date.map(Value::Date).into()
    }

    fn serialize(&self, value: &Value) -> Transformed<String> {
        value.as_date().map(format_date).into()
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and
/// `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let day = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// Built-in transforms plus user registrations, keyed by `type_for`.
///
/// Registered transforms shadow built-ins with the same key; registering a
/// key twice keeps the last registration.
pub struct TransformRegistry {
    builtins: IndexMap<String, Rc<dyn Transform>>,
    custom: RefCell<IndexMap<String, Rc<dyn Transform>>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        let builtins: [Rc<dyn Transform>; 4] = [
            Rc::new(StringTransform),
            Rc::new(NumberTransform),
            Rc::new(BooleanTransform),
            Rc::new(DateTransform),
        ];
        Self {
            builtins: builtins
                .into_iter()
                .map(|transform| (transform.type_for().to_string(), transform))
                .collect(),
            custom: RefCell::new(IndexMap::new()),
        }
    }

    pub fn get(&self, type_for: &str) -> Result<Rc<dyn Transform>, TransformError> {
        if let Some(transform) = self.custom.borrow().get(type_for) {
            return Ok(transform.clone());
        }
        self.builtins
            .get(type_for)
            .cloned()
            .ok_or_else(|| TransformError::NotFound {
                type_for: type_for.to_string(),
            })
    }

    pub fn register(&self, transform: impl Transform + 'static) -> Rc<dyn Transform> {
        self.register_rc(Rc::new(transform))
    }

    pub fn register_rc(&self, transform: Rc<dyn Transform>) -> Rc<dyn Transform> {
        let key = transform.type_for().to_string();
        if self.builtins.contains_key(&key) {
            log::debug!("transform '{key}' overrides the built-in transform");
        }
        if self.custom.borrow_mut().insert(key.clone(), transform.clone()).is_some() {
            log::debug!("transform '{key}' re-registered");
        }
        transform
    }

    /// First registered, then built-in transform whose `detect` accepts
    /// `value`.
    pub fn detect(&self, value: &Value) -> Option<Rc<dyn Transform>> {
        let custom = self
            .custom
            .borrow()
            .values()
            .find(|transform| transform.detect(value))
            .cloned();
        custom.or_else(|| {
            self.builtins
                .values()
                .find(|transform| transform.detect(value))
                .cloned()
        })
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.custom.borrow().keys().cloned().collect();
        for key in self.builtins.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/transform_tests.rs"]
mod tests;
