//! Render capability.
//!
//! The form engine never draws anything. It computes props (values,
//! checked state, accessibility hints, handlers) and hands them to a
//! [`Renderer`]. [`ElementRenderer`] is the default host: it builds a
//! DOM-like [`Element`] tree whose handlers can be dispatched directly.

mod element;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::value::{ErrorKey, FieldKey, Value};

pub use element::{Element, ElementRenderer};

pub type ChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
pub type BlurHandler = Arc<dyn Fn() + Send + Sync>;
/// Called by the host once the control is attached, with the value the
/// control currently shows.
pub type MountHandler = Arc<dyn Fn(Option<&str>) + Send + Sync>;
pub type SubmitHandler = Arc<dyn Fn(&SubmitEvent) + Send + Sync>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeEvent {
    pub value: Value,
}

impl ChangeEvent {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: AtomicBool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

/// Pass-through display attributes supplied by the caller.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DisplayProps {
    pub id: Option<String>,
    pub class: Option<String>,
    pub error_class: Option<String>,
    pub disabled: bool,
    pub attrs: BTreeMap<String, String>,
}

impl DisplayProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Class appended while the field's error is visible.
    pub fn error_class(mut self, class: impl Into<String>) -> Self {
        self.error_class = Some(class.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// `class` plus `error_class` when `errorful`, trimmed; `None` if empty.
    pub fn resolved_class(&self, errorful: bool) -> Option<String> {
        let base = self.class.as_deref().unwrap_or_default();
        let error = if errorful {
            self.error_class.as_deref().unwrap_or_default()
        } else {
            ""
        };
        let joined = format!("{base} {error}");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputType {
    Text,
    Number,
    Checkbox,
    Radio,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Checkbox => "checkbox",
            InputType::Radio => "radio",
        }
    }
}

#[derive(Clone)]
pub struct InputProps {
    pub display: DisplayProps,
    pub input_type: InputType,
    pub name: FieldKey,
    pub value: String,
    pub checked: Option<bool>,
    pub role: Option<&'static str>,
    pub required: bool,
    pub errorful: bool,
    pub radio_value: Option<String>,
    pub on_change: ChangeHandler,
    pub on_blur: BlurHandler,
}

#[derive(Clone)]
pub struct GroupProps {
    pub display: DisplayProps,
    pub name: FieldKey,
    pub required: bool,
    pub errorful: bool,
}

#[derive(Clone)]
pub struct SelectProps {
    pub display: DisplayProps,
    pub id: String,
    pub name: FieldKey,
    pub value: Option<String>,
    pub required: bool,
    pub errorful: bool,
    pub on_change: ChangeHandler,
    pub on_blur: BlurHandler,
    pub on_mount: MountHandler,
}

#[derive(Clone, Debug)]
pub struct OptionProps {
    pub display: DisplayProps,
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct ErrorProps {
    pub display: DisplayProps,
    pub key: ErrorKey,
    pub message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SubmitProps {
    pub display: DisplayProps,
    pub submitting: bool,
    pub disabled: bool,
}

#[derive(Clone)]
pub struct FormProps {
    pub display: DisplayProps,
    pub aria_label: Option<String>,
    pub busy: bool,
    pub on_submit: SubmitHandler,
}

/// Primitive control renderers supplied by the host.
pub trait Renderer: Send + Sync + 'static {
    type Output;

    fn form(&self, props: FormProps, children: Vec<Self::Output>) -> Self::Output;

    /// Text, number and checkbox inputs.
    fn input(&self, props: InputProps) -> Self::Output;

    fn radio(&self, props: InputProps) -> Self::Output;

    fn group(&self, props: GroupProps, children: Vec<Self::Output>) -> Self::Output;

    fn select(&self, props: SelectProps, children: Vec<Self::Output>) -> Self::Output;

    fn option(&self, props: OptionProps) -> Self::Output;

    fn error(&self, props: ErrorProps) -> Self::Output;

    fn submit(&self, props: SubmitProps) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_class_applies_only_while_errorful() {
        let display = DisplayProps::new().class("field").error_class("field--error");
        assert_eq!(
            display.resolved_class(true).as_deref(),
            Some("field field--error")
        );
        assert_eq!(display.resolved_class(false).as_deref(), Some("field"));
        assert_eq!(DisplayProps::new().resolved_class(true), None);
        assert_eq!(
            DisplayProps::new()
                .error_class("bad")
                .resolved_class(true)
                .as_deref(),
            Some("bad")
        );
    }

    #[test]
    fn submit_event_tracks_prevent_default() {
        let event = SubmitEvent::new();
        assert!(!event.is_default_prevented());
        event.prevent_default();
        assert!(event.is_default_prevented());
    }
}
