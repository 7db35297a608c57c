//! Untrusted field mappings and the coercions shared by both entities.
//!
//! HTML forms and JSON bodies both arrive here as a [`FieldMap`]. Form
//! submissions only ever carry strings, while JSON bodies may carry native
//! numbers, so every coercion accepts the string form and, where it makes
//! sense, the native one.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};

/// Number of fractional digits stored for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Date format accepted for date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A string-keyed mapping of untrusted values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: Map<String, Value>,
}

impl FieldMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from form pairs, where every value is a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use department_app::models::FieldMap;
    ///
    /// let fields = FieldMap::from_form([("name", "Sales")]);
    /// assert_eq!(fields.get("name").and_then(|v| v.as_str()), Some("Sales"));
    /// ```
    pub fn from_form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { fields }
    }

    /// Builds a mapping from a decoded JSON body.
    ///
    /// Returns `None` unless the body is a JSON object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Returns the mapping with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl From<Map<String, Value>> for FieldMap {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Returns the value as text, or `None` if it is not a JSON string.
pub(crate) fn as_text(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Parses an ISO calendar date (`YYYY-MM-DD`).
pub(crate) fn as_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Parses an exact decimal amount and fixes it at [`MONEY_SCALE`] digits.
///
/// JSON numbers are read through their textual form so that `1000.24`
/// stays `1000.24` and never picks up binary floating point noise.
pub(crate) fn as_money(value: &Value) -> Option<Decimal> {
    let parsed = match value {
        Value::String(text) => parse_decimal(text.trim()),
        Value::Number(number) => parse_decimal(&number.to_string()),
        _ => None,
    }?;
    Some(to_money(parsed))
}

/// Parses a whole number, either as digits in a string or a JSON integer.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

/// Rounds an amount to the stored monetary precision.
pub fn to_money(amount: Decimal) -> Decimal {
    let mut amount =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(MONEY_SCALE);
    amount
}

/// Converts an exact amount to the nearest floating point value.
///
/// Goes through the decimal string so the result is correctly rounded.
pub fn to_float(amount: Decimal) -> Option<f64> {
    amount.to_string().parse().ok()
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
