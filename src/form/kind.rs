use std::fmt::{Display, Formatter};

use crate::schema::SchemaShape;

/// Semantic kind of a field, decided once when the form is built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    /// Closed enumeration rendered as a radio group.
    ChoiceGroup(Vec<String>),
    /// Union of string literals rendered as a select list.
    ChoiceList(Vec<String>),
}

impl FieldKind {
    /// Returns `None` for shapes outside the five supported kinds. Optional
    /// wrappers classify as their inner shape.
    pub fn classify(shape: &SchemaShape) -> Option<FieldKind> {
        match shape {
            SchemaShape::String => Some(FieldKind::Text),
            SchemaShape::Number => Some(FieldKind::Number),
            SchemaShape::Boolean => Some(FieldKind::Boolean),
            SchemaShape::Enum(options) if !options.is_empty() => {
                Some(FieldKind::ChoiceGroup(options.clone()))
            }
            SchemaShape::Union(members) if !members.is_empty() => members
                .iter()
                .map(|member| match member {
                    SchemaShape::Literal(value) => value.as_text().map(str::to_string),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(FieldKind::ChoiceList),
            SchemaShape::Optional(inner) => Self::classify(inner),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::ChoiceGroup(_) => "choice-group",
            FieldKind::ChoiceList(_) => "choice-list",
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            FieldKind::ChoiceGroup(options) | FieldKind::ChoiceList(options) => options,
            _ => &[],
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::ChoiceGroup(_) | FieldKind::ChoiceList(_))
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn literal(value: &str) -> SchemaShape {
        SchemaShape::Literal(Value::from(value))
    }

    #[test]
    fn scalar_shapes_map_to_scalar_kinds() {
        assert_eq!(FieldKind::classify(&SchemaShape::String), Some(FieldKind::Text));
        assert_eq!(
            FieldKind::classify(&SchemaShape::Number),
            Some(FieldKind::Number)
        );
        assert_eq!(
            FieldKind::classify(&SchemaShape::Boolean),
            Some(FieldKind::Boolean)
        );
    }

    #[test]
    fn enum_and_literal_union_keep_option_order() {
        let group = FieldKind::classify(&SchemaShape::Enum(vec![
            "c".to_string(),
            "a".to_string(),
        ]))
        .expect("enum classifies");
        assert_eq!(group.name(), "choice-group");
        assert_eq!(group.options(), ["c", "a"]);

        let list = FieldKind::classify(&SchemaShape::Union(vec![literal("s"), literal("m")]))
            .expect("literal union classifies");
        assert_eq!(list, FieldKind::ChoiceList(vec!["s".into(), "m".into()]));
    }

    #[test]
    fn optional_wrapper_classifies_as_inner_shape() {
        let shape = SchemaShape::Optional(Box::new(SchemaShape::Enum(vec!["x".into()])));
        assert_eq!(
            FieldKind::classify(&shape),
            Some(FieldKind::ChoiceGroup(vec!["x".into()]))
        );
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        assert_eq!(FieldKind::classify(&SchemaShape::Other("date")), None);
        assert_eq!(FieldKind::classify(&SchemaShape::Enum(Vec::new())), None);
        assert_eq!(FieldKind::classify(&literal("lonely")), None);
        assert_eq!(
            FieldKind::classify(&SchemaShape::Union(vec![
                literal("a"),
                SchemaShape::Literal(Value::from(true)),
            ])),
            None
        );
        assert_eq!(
            FieldKind::classify(&SchemaShape::Union(vec![literal("a"), SchemaShape::String])),
            None
        );
    }
}
