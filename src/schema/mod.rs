//! Schema capability consumed by the form engine.
//!
//! A form is described by a [`FormSchema`]: an ordered list of field keys,
//! each paired with a [`FieldSchema`] node. The engine only relies on the
//! three operations of that trait; [`builtin`] ships a zod-like
//! implementation, and any other validation library can be adapted by
//! implementing the trait.

mod builtin;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::value::{FieldKey, Value};

pub use builtin::{
    BooleanSchema, EnumSchema, FieldSchemaExt, LiteralUnionSchema, NumberSchema, Optional,
    StringSchema, boolean, enumeration, literals, number, string,
};

/// Structured validation failure: a non-empty, ordered list of messages.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationFailure {
    messages: Vec<String>,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Returns `None` for an empty message list.
    pub fn from_messages(messages: Vec<String>) -> Option<Self> {
        (!messages.is_empty()).then_some(Self { messages })
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn joined(&self) -> String {
        self.messages.join(", ")
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}

/// Shape of a schema node as seen by the field kind classifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SchemaShape {
    String,
    Number,
    Boolean,
    Enum(Vec<String>),
    Literal(Value),
    Union(Vec<SchemaShape>),
    Optional(Box<SchemaShape>),
    Other(&'static str),
}

impl Display for SchemaShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaShape::String => f.write_str("string"),
            SchemaShape::Number => f.write_str("number"),
            SchemaShape::Boolean => f.write_str("boolean"),
            SchemaShape::Enum(options) => write!(f, "enum({})", options.join(" | ")),
            SchemaShape::Literal(value) => write!(f, "literal({value})"),
            SchemaShape::Union(members) => {
                f.write_str("union(")?;
                for (index, member) in members.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
            SchemaShape::Optional(inner) => write!(f, "optional({inner})"),
            SchemaShape::Other(name) => f.write_str(name),
        }
    }
}

/// Validation capability of one field.
pub trait FieldSchema: Send + Sync + 'static {
    /// Validates a raw value. `None` means the field has never been set.
    /// On success returns the parsed value, which is `None` only for an
    /// absent optional field.
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure>;

    fn is_optional(&self) -> bool;

    fn shape(&self) -> SchemaShape;
}

impl<S> FieldSchema for Arc<S>
where
    S: FieldSchema + ?Sized,
{
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        (**self).validate(raw)
    }

    fn is_optional(&self) -> bool {
        (**self).is_optional()
    }

    fn shape(&self) -> SchemaShape {
        (**self).shape()
    }
}

pub type SchemaNode = Arc<dyn FieldSchema>;

/// Ordered mapping from field key to schema node.
#[derive(Clone, Default)]
pub struct FormSchema {
    fields: Vec<(FieldKey, SchemaNode)>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Keys must be unique; duplicates are rejected when
    /// the form is built.
    pub fn field(mut self, key: &'static str, schema: impl FieldSchema) -> Self {
        self.fields.push((FieldKey::new(key), Arc::new(schema)));
        self
    }

    pub fn node(mut self, key: FieldKey, schema: SchemaNode) -> Self {
        self.fields.push((key, schema));
        self
    }

    pub fn get(&self, key: FieldKey) -> Option<&SchemaNode> {
        self.fields
            .iter()
            .find_map(|(candidate, schema)| (*candidate == key).then_some(schema))
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &SchemaNode)> + '_ {
        self.fields.iter().map(|(key, schema)| (*key, schema))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn first_duplicate(&self) -> Option<FieldKey> {
        self.fields.iter().enumerate().find_map(|(index, (key, _))| {
            self.fields[..index]
                .iter()
                .any(|(earlier, _)| earlier == key)
                .then_some(*key)
        })
    }
}

impl std::fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.fields
                    .iter()
                    .map(|(key, schema)| (key.as_str(), schema.shape().to_string())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_keeps_declaration_order() {
        let schema = FormSchema::new()
            .field("zeta", string())
            .field("alpha", boolean())
            .field("mid", number());
        let keys = schema.keys().map(FieldKey::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn duplicate_keys_are_detected() {
        let schema = FormSchema::new()
            .field("name", string())
            .field("age", number())
            .field("name", string());
        assert_eq!(schema.first_duplicate(), Some(FieldKey::new("name")));
        assert_eq!(FormSchema::new().first_duplicate(), None);
    }

    #[test]
    fn failure_messages_join_with_comma() {
        let mut failure = ValidationFailure::new("too short");
        failure.push("must start with a letter");
        assert_eq!(failure.joined(), "too short, must start with a letter");
        assert!(ValidationFailure::from_messages(Vec::new()).is_none());
    }

    #[test]
    fn shapes_describe_themselves() {
        let shape = SchemaShape::Optional(Box::new(SchemaShape::Union(vec![
            SchemaShape::Literal(Value::from("a")),
            SchemaShape::Literal(Value::from("b")),
        ])));
        assert_eq!(shape.to_string(), "optional(union(literal(a) | literal(b)))");
    }
}
