use std::str::FromStr;

use rust_decimal::Decimal;

use super::{FieldSchema, SchemaShape, ValidationFailure};
use crate::i18n::I18nManager;
use crate::value::Value;

#[derive(Clone, Debug)]
struct Check<T> {
    limit: T,
    message: Option<String>,
}

impl<T> Check<T> {
    fn new(limit: T, message: Option<String>) -> Self {
        Self { limit, message }
    }
}

#[derive(Clone, Default)]
struct Messages {
    i18n: Option<I18nManager>,
    required: Option<String>,
}

impl Messages {
    fn manager(&self) -> &I18nManager {
        self.i18n.as_ref().unwrap_or_else(|| I18nManager::global())
    }

    fn required(&self) -> ValidationFailure {
        match &self.required {
            Some(message) => ValidationFailure::new(message.clone()),
            None => ValidationFailure::new(self.manager().t("validation.required")),
        }
    }

    fn invalid_type(&self, expected: &str, received: &Value) -> ValidationFailure {
        ValidationFailure::new(self.manager().t_with(
            "validation.invalid_type",
            &[("expected", expected), ("received", received.type_name())],
        ))
    }

    fn render(&self, custom: &Option<String>, key: &str, params: &[(&str, &str)]) -> String {
        match custom {
            Some(message) => message.clone(),
            None => self.manager().t_with(key, params),
        }
    }
}

fn push_issue(failure: &mut Option<ValidationFailure>, message: String) {
    match failure {
        Some(failure) => failure.push(message),
        None => *failure = Some(ValidationFailure::new(message)),
    }
}

fn quoted_options(options: &[String]) -> String {
    options
        .iter()
        .map(|option| format!("'{option}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Marks a node optional: an absent value validates successfully.
pub trait FieldSchemaExt: FieldSchema + Sized {
    fn optional(self) -> Optional<Self> {
        Optional { inner: self }
    }
}

impl<S: FieldSchema + Sized> FieldSchemaExt for S {}

#[derive(Clone)]
pub struct Optional<S> {
    inner: S,
}

impl<S: FieldSchema> FieldSchema for Optional<S> {
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        match raw {
            None => Ok(None),
            Some(value) => self.inner.validate(Some(value)),
        }
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn shape(&self) -> SchemaShape {
        SchemaShape::Optional(Box::new(self.inner.shape()))
    }
}

pub fn string() -> StringSchema {
    StringSchema::default()
}

#[derive(Clone, Default)]
pub struct StringSchema {
    min_len: Option<Check<usize>>,
    max_len: Option<Check<usize>>,
    messages: Messages,
}

impl StringSchema {
    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(Check::new(min, None));
        self
    }

    pub fn min_len_with(mut self, min: usize, message: impl Into<String>) -> Self {
        self.min_len = Some(Check::new(min, Some(message.into())));
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(Check::new(max, None));
        self
    }

    pub fn max_len_with(mut self, max: usize, message: impl Into<String>) -> Self {
        self.max_len = Some(Check::new(max, Some(message.into())));
        self
    }

    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.messages.required = Some(message.into());
        self
    }

    pub fn i18n(mut self, manager: I18nManager) -> Self {
        self.messages.i18n = Some(manager);
        self
    }
}

impl FieldSchema for StringSchema {
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        let Some(value) = raw else {
            return Err(self.messages.required());
        };
        let Value::Text(text) = value else {
            return Err(self.messages.invalid_type("string", value));
        };

        let length = text.chars().count();
        let mut failure = None;
        if let Some(check) = self.min_len.as_ref().filter(|check| length < check.limit) {
            let min = check.limit.to_string();
            push_issue(
                &mut failure,
                self.messages.render(
                    &check.message,
                    "validation.too_small.string",
                    &[("min", &min)],
                ),
            );
        }
        if let Some(check) = self.max_len.as_ref().filter(|check| length > check.limit) {
            let max = check.limit.to_string();
            push_issue(
                &mut failure,
                self.messages.render(
                    &check.message,
                    "validation.too_big.string",
                    &[("max", &max)],
                ),
            );
        }

        match failure {
            Some(failure) => Err(failure),
            None => Ok(Some(value.clone())),
        }
    }

    fn is_optional(&self) -> bool {
        false
    }

    fn shape(&self) -> SchemaShape {
        SchemaShape::String
    }
}

pub fn number() -> NumberSchema {
    NumberSchema::default()
}

/// Accepts numbers and numeric text; text is parsed only for the result
/// handed back, the store keeps what the control wrote.
#[derive(Clone, Default)]
pub struct NumberSchema {
    min: Option<Check<Decimal>>,
    max: Option<Check<Decimal>>,
    integer: Option<Check<()>>,
    messages: Messages,
}

impl NumberSchema {
    pub fn min(mut self, min: impl Into<Decimal>) -> Self {
        self.min = Some(Check::new(min.into(), None));
        self
    }

    pub fn min_with(mut self, min: impl Into<Decimal>, message: impl Into<String>) -> Self {
        self.min = Some(Check::new(min.into(), Some(message.into())));
        self
    }

    pub fn max(mut self, max: impl Into<Decimal>) -> Self {
        self.max = Some(Check::new(max.into(), None));
        self
    }

    pub fn max_with(mut self, max: impl Into<Decimal>, message: impl Into<String>) -> Self {
        self.max = Some(Check::new(max.into(), Some(message.into())));
        self
    }

    pub fn integer(mut self) -> Self {
        self.integer = Some(Check::new((), None));
        self
    }

    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.messages.required = Some(message.into());
        self
    }

    pub fn i18n(mut self, manager: I18nManager) -> Self {
        self.messages.i18n = Some(manager);
        self
    }

    fn parse(&self, value: &Value) -> Result<Decimal, ValidationFailure> {
        match value {
            Value::Number(number) => Ok(*number),
            Value::Text(text) if text.trim().is_empty() => Err(self.messages.required()),
            Value::Text(text) => Decimal::from_str(text.trim())
                .map_err(|_| self.messages.invalid_type("number", value)),
            Value::Bool(_) => Err(self.messages.invalid_type("number", value)),
        }
    }
}

impl FieldSchema for NumberSchema {
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        let Some(value) = raw else {
            return Err(self.messages.required());
        };
        let number = self.parse(value)?;

        let mut failure = None;
        if let Some(check) = self.integer.as_ref().filter(|_| !number.fract().is_zero()) {
            push_issue(
                &mut failure,
                self.messages
                    .render(&check.message, "validation.not_integer", &[]),
            );
        }
        if let Some(check) = self.min.as_ref().filter(|check| number < check.limit) {
            let min = check.limit.normalize().to_string();
            push_issue(
                &mut failure,
                self.messages.render(
                    &check.message,
                    "validation.too_small.number",
                    &[("min", &min)],
                ),
            );
        }
        if let Some(check) = self.max.as_ref().filter(|check| number > check.limit) {
            let max = check.limit.normalize().to_string();
            push_issue(
                &mut failure,
                self.messages.render(
                    &check.message,
                    "validation.too_big.number",
                    &[("max", &max)],
                ),
            );
        }

        match failure {
            Some(failure) => Err(failure),
            None => Ok(Some(Value::Number(number))),
        }
    }

    fn is_optional(&self) -> bool {
        false
    }

    fn shape(&self) -> SchemaShape {
        SchemaShape::Number
    }
}

pub fn boolean() -> BooleanSchema {
    BooleanSchema::default()
}

#[derive(Clone, Default)]
pub struct BooleanSchema {
    messages: Messages,
}

impl BooleanSchema {
    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.messages.required = Some(message.into());
        self
    }

    pub fn i18n(mut self, manager: I18nManager) -> Self {
        self.messages.i18n = Some(manager);
        self
    }
}

impl FieldSchema for BooleanSchema {
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        match raw {
            None => Err(self.messages.required()),
            Some(Value::Bool(flag)) => Ok(Some(Value::Bool(*flag))),
            Some(other) => Err(self.messages.invalid_type("boolean", other)),
        }
    }

    fn is_optional(&self) -> bool {
        false
    }

    fn shape(&self) -> SchemaShape {
        SchemaShape::Boolean
    }
}

/// Closed enumeration, rendered as a radio group.
pub fn enumeration<I, S>(options: I) -> EnumSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    EnumSchema {
        options: options.into_iter().map(Into::into).collect(),
        message: None,
        messages: Messages::default(),
    }
}

#[derive(Clone)]
pub struct EnumSchema {
    options: Vec<String>,
    message: Option<String>,
    messages: Messages,
}

impl EnumSchema {
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Message used when the value is not one of the options.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.messages.required = Some(message.into());
        self
    }

    pub fn i18n(mut self, manager: I18nManager) -> Self {
        self.messages.i18n = Some(manager);
        self
    }
}

impl FieldSchema for EnumSchema {
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        let Some(value) = raw else {
            return Err(self.messages.required());
        };
        if self.options.iter().any(|option| value.matches_option(option)) {
            return Ok(Some(value.clone()));
        }
        let options = quoted_options(&self.options);
        let received = value.to_attr();
        Err(ValidationFailure::new(self.messages.render(
            &self.message,
            "validation.invalid_enum",
            &[("options", &options), ("received", &received)],
        )))
    }

    fn is_optional(&self) -> bool {
        false
    }

    fn shape(&self) -> SchemaShape {
        SchemaShape::Enum(self.options.clone())
    }
}

/// Union of string literals, rendered as a select list.
pub fn literals<I, S>(literals: I) -> LiteralUnionSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    LiteralUnionSchema {
        literals: literals.into_iter().map(Into::into).collect(),
        message: None,
        messages: Messages::default(),
    }
}

#[derive(Clone)]
pub struct LiteralUnionSchema {
    literals: Vec<String>,
    message: Option<String>,
    messages: Messages,
}

impl LiteralUnionSchema {
    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    /// Message used when the value matches none of the literals.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.messages.required = Some(message.into());
        self
    }

    pub fn i18n(mut self, manager: I18nManager) -> Self {
        self.messages.i18n = Some(manager);
        self
    }
}

impl FieldSchema for LiteralUnionSchema {
    fn validate(&self, raw: Option<&Value>) -> Result<Option<Value>, ValidationFailure> {
        let Some(value) = raw else {
            return Err(self.messages.required());
        };
        if self
            .literals
            .iter()
            .any(|literal| value.matches_option(literal))
        {
            return Ok(Some(value.clone()));
        }
        let options = quoted_options(&self.literals);
        let received = value.to_attr();
        Err(ValidationFailure::new(self.messages.render(
            &self.message,
            "validation.invalid_literal",
            &[("options", &options), ("received", &received)],
        )))
    }

    fn is_optional(&self) -> bool {
        false
    }

    fn shape(&self) -> SchemaShape {
        SchemaShape::Union(
            self.literals
                .iter()
                .map(|literal| SchemaShape::Literal(Value::Text(literal.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> I18nManager {
        let manager = I18nManager::new();
        manager.set_locale("en");
        manager
    }

    #[test]
    fn string_reports_every_failed_check() {
        let schema = string().min_len(5).i18n(english());
        let failure = schema
            .validate(Some(&Value::from("abc")))
            .expect_err("too short");
        assert_eq!(
            failure.messages(),
            ["String must contain at least 5 character(s)"]
        );

        let schema = string()
            .min_len_with(5, "too short")
            .max_len_with(2, "too long");
        let failure = schema
            .validate(Some(&Value::from("abc")))
            .expect_err("both checks fail");
        assert_eq!(failure.joined(), "too short, too long");
    }

    #[test]
    fn missing_required_value_fails_with_required_message() {
        let failure = string()
            .i18n(english())
            .validate(None)
            .expect_err("absent value");
        assert_eq!(failure.messages(), ["Required"]);

        let failure = boolean()
            .required_message("Please decide")
            .validate(None)
            .expect_err("absent flag");
        assert_eq!(failure.messages(), ["Please decide"]);
    }

    #[test]
    fn optional_accepts_absent_but_still_checks_present_values() {
        let schema = string().min_len_with(2, "short").optional();
        assert_eq!(schema.validate(None), Ok(None));
        assert!(schema.validate(Some(&Value::from("x"))).is_err());
        assert!(schema.is_optional());
        assert_eq!(
            schema.shape(),
            SchemaShape::Optional(Box::new(SchemaShape::String))
        );
    }

    #[test]
    fn number_parses_numeric_text_without_touching_input() {
        let schema = number().min(1).max(10).integer();
        assert_eq!(
            schema.validate(Some(&Value::from(" 7 "))),
            Ok(Some(Value::Number(Decimal::from(7))))
        );
        let failure = schema
            .i18n(english())
            .validate(Some(&Value::from("7.5")))
            .expect_err("fractional");
        assert_eq!(failure.messages(), ["Expected integer, received float"]);
    }

    #[test]
    fn number_rejects_text_and_empty_input() {
        let schema = number().i18n(english());
        let failure = schema
            .validate(Some(&Value::from("seven")))
            .expect_err("not numeric");
        assert_eq!(failure.messages(), ["Expected number, received string"]);
        let failure = schema
            .validate(Some(&Value::from("")))
            .expect_err("empty input");
        assert_eq!(failure.messages(), ["Required"]);
    }

    #[test]
    fn enum_lists_allowed_options_on_failure() {
        let schema = enumeration(["a", "b", "c"]).i18n(english());
        assert_eq!(
            schema.validate(Some(&Value::from("b"))),
            Ok(Some(Value::from("b")))
        );
        let failure = schema
            .validate(Some(&Value::from("z")))
            .expect_err("unknown option");
        assert_eq!(
            failure.messages(),
            ["Invalid enum value. Expected 'a' | 'b' | 'c', received 'z'"]
        );
    }

    #[test]
    fn literal_union_exposes_literal_shapes() {
        let schema = literals(["small", "large"]).message("pick a size");
        assert_eq!(
            schema.shape(),
            SchemaShape::Union(vec![
                SchemaShape::Literal(Value::from("small")),
                SchemaShape::Literal(Value::from("large")),
            ])
        );
        let failure = schema
            .validate(Some(&Value::from("medium")))
            .expect_err("not a literal");
        assert_eq!(failure.messages(), ["pick a size"]);
    }

    #[test]
    fn boolean_rejects_text() {
        let failure = boolean()
            .i18n(english())
            .validate(Some(&Value::from("true")))
            .expect_err("text is not a flag");
        assert_eq!(failure.messages(), ["Expected boolean, received string"]);
        assert_eq!(
            boolean().validate(Some(&Value::Bool(false))),
            Ok(Some(Value::Bool(false)))
        );
    }
}
