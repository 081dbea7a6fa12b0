use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::controller::{FormError, FormResult};
use crate::value::{FieldKey, Value};

/// Raw values of the schema fields, handed to the submit callback once
/// every field has validated. Fields without a value are omitted; the
/// typed accessors and [`FromFieldValue`] parse text where needed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedFormData {
    values: BTreeMap<FieldKey, Value>,
}

impl ParsedFormData {
    pub(crate) fn insert(&mut self, key: FieldKey, value: Value) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: FieldKey) -> Option<&Value> {
        self.values.get(&key)
    }

    pub fn text(&self, key: FieldKey) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn number(&self, key: FieldKey) -> Option<Decimal> {
        self.get(key).and_then(Value::to_number)
    }

    pub fn flag(&self, key: FieldKey) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &Value)> + '_ {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<FieldKey, Value> {
        self.values
    }

    pub fn parse<M: FormModel>(&self) -> FormResult<M> {
        M::from_form_data(self)
    }
}

impl FromIterator<(FieldKey, Value)> for ParsedFormData {
    fn from_iter<I: IntoIterator<Item = (FieldKey, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Typed view over parsed form data, usually derived with
/// `#[derive(FormModel)]`.
pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_keys() -> &'static [FieldKey];

    fn from_form_data(data: &ParsedFormData) -> FormResult<Self>;
}

/// Conversion from one submitted value into a model field.
pub trait FromFieldValue: Sized {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self>;
}

fn required<'a>(key: FieldKey, value: Option<&'a Value>) -> FormResult<&'a Value> {
    value.ok_or(FormError::MissingField(key))
}

impl FromFieldValue for String {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self> {
        required(key, value)?
            .as_text()
            .map(str::to_string)
            .ok_or(FormError::FieldType {
                key,
                expected: "string",
            })
    }
}

impl FromFieldValue for bool {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self> {
        required(key, value)?.as_bool().ok_or(FormError::FieldType {
            key,
            expected: "boolean",
        })
    }
}

impl FromFieldValue for Decimal {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self> {
        required(key, value)?.to_number().ok_or(FormError::FieldType {
            key,
            expected: "number",
        })
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self> {
        Some(Decimal::from_field_value(key, value)?)
            .filter(|number| number.fract().is_zero())
            .and_then(|number| number.to_i64())
            .ok_or(FormError::FieldType {
                key,
                expected: "integer",
            })
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self> {
        Decimal::from_field_value(key, value)?
            .to_f64()
            .ok_or(FormError::FieldType {
                key,
                expected: "number",
            })
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(key: FieldKey, value: Option<&Value>) -> FormResult<Self> {
        match value {
            Some(value) => T::from_field_value(key, Some(value)).map(Some),
            None => Ok(None),
        }
    }
}
