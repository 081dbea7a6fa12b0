use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        Self(value)
    }
}

/// Slot in the error cell: one per schema field plus the reserved
/// form-wide `submission` entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorKey {
    Field(FieldKey),
    Submission,
}

impl ErrorKey {
    pub const SUBMISSION: &'static str = "submission";

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKey::Field(key) => key.as_str(),
            ErrorKey::Submission => Self::SUBMISSION,
        }
    }

    pub fn field(self) -> Option<FieldKey> {
        match self {
            ErrorKey::Field(key) => Some(key),
            ErrorKey::Submission => None,
        }
    }
}

impl From<FieldKey> for ErrorKey {
    fn from(value: FieldKey) -> Self {
        ErrorKey::Field(value)
    }
}

impl From<&'static str> for ErrorKey {
    fn from(value: &'static str) -> Self {
        if value == Self::SUBMISSION {
            ErrorKey::Submission
        } else {
            ErrorKey::Field(FieldKey::new(value))
        }
    }
}

impl Display for ErrorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input as written by a control or by `set_value`. The store never
/// holds anything more parsed than this.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Bool(bool),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Numeric reading of the value: a number, or text that parses as one.
    pub fn to_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => Decimal::from_str(text.trim()).ok(),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
        }
    }

    /// Attribute form used when a value is written back into a control.
    pub fn to_attr(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::Number(number) => number.normalize().to_string(),
            Value::Bool(flag) => flag.to_string(),
        }
    }

    /// `true` when this value equals the given option literal.
    pub fn matches_option(&self, option: &str) -> bool {
        self.as_text() == Some(option)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_attr())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Decimal::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_literal_maps_to_reserved_error_key() {
        assert_eq!(ErrorKey::from("submission"), ErrorKey::Submission);
        assert_eq!(
            ErrorKey::from("name"),
            ErrorKey::Field(FieldKey::new("name"))
        );
        assert_eq!(ErrorKey::Submission.as_str(), "submission");
    }

    #[test]
    fn numbers_render_without_trailing_zeros() {
        let value = Value::Number(Decimal::new(1200, 2));
        assert_eq!(value.to_attr(), "12");
        assert_eq!(Value::from(true).to_attr(), "true");
    }

    #[test]
    fn numeric_text_reads_as_a_number() {
        assert_eq!(Value::from(" 42.5 ").to_number(), Some(Decimal::new(425, 1)));
        assert_eq!(Value::from("42").as_number(), None);
        assert_eq!(Value::from("forty").to_number(), None);
        assert_eq!(Value::from(true).to_number(), None);
    }

    #[test]
    fn only_text_matches_options() {
        assert!(Value::from("b").matches_option("b"));
        assert!(!Value::from(true).matches_option("true"));
    }
}
