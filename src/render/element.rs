use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use super::{
    BlurHandler, ChangeEvent, ChangeHandler, DisplayProps, ErrorProps, FormProps, GroupProps,
    InputProps, MountHandler, OptionProps, Renderer, SelectProps, SubmitEvent, SubmitHandler,
    SubmitProps,
};
use crate::value::Value;

#[derive(Clone, Default)]
struct Handlers {
    change: Option<ChangeHandler>,
    blur: Option<BlurHandler>,
    mount: Option<MountHandler>,
    submit: Option<SubmitHandler>,
}

/// DOM-like node produced by [`ElementRenderer`].
#[derive(Clone, Default)]
pub struct Element {
    tag: &'static str,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<Element>,
    handlers: Handlers,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    fn with_display(tag: &'static str, display: &DisplayProps) -> Self {
        let mut element = Self::new(tag);
        element.attrs = display.attrs.clone();
        if let Some(id) = &display.id {
            element.set_attr("id", id.clone());
        }
        if let Some(class) = &display.class {
            element.set_attr("class", class.clone());
        }
        element.set_attr("aria-disabled", display.disabled.to_string());
        element.set_flag("disabled", display.disabled);
        element
    }

    fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// HTML boolean attribute: present with an empty value, or absent.
    fn set_flag(&mut self, name: &str, on: bool) {
        if on {
            self.attrs.insert(name.to_string(), String::new());
        } else {
            self.attrs.remove(name);
        }
    }

    fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Depth-first search including `self`.
    pub fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(predicate))
    }

    pub fn find_all<'a>(&'a self, predicate: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(predicate, &mut found);
        found
    }

    fn collect<'a>(
        &'a self,
        predicate: &dyn Fn(&Element) -> bool,
        found: &mut Vec<&'a Element>,
    ) {
        if predicate(self) {
            found.push(self);
        }
        for child in &self.children {
            child.collect(predicate, found);
        }
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&Element> {
        self.find(&|element| element.attr(name) == Some(value))
    }

    /// Dispatches a change event. Returns `false` when no handler is bound.
    pub fn change(&self, value: impl Into<Value>) -> bool {
        let Some(handler) = &self.handlers.change else {
            return false;
        };
        handler(&ChangeEvent::new(value));
        true
    }

    pub fn blur(&self) -> bool {
        let Some(handler) = &self.handlers.blur else {
            return false;
        };
        handler();
        true
    }

    pub fn submit(&self) -> SubmitEvent {
        let event = SubmitEvent::new();
        if let Some(handler) = &self.handlers.submit {
            handler(&event);
        }
        event
    }

    /// Runs mount handlers across the tree. A select reports its `value`
    /// attribute, or the first option's value when it has none.
    pub fn mount(&self) {
        if let Some(handler) = &self.handlers.mount {
            let current = self.attr("value").map(str::to_string).or_else(|| {
                self.children
                    .iter()
                    .find(|child| child.tag == "option")
                    .and_then(|option| option.attr("value"))
                    .map(str::to_string)
            });
            handler(current.as_deref());
        }
        for child in &self.children {
            child.mount();
        }
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Element");
        debug.field("tag", &self.tag).field("attrs", &self.attrs);
        if let Some(text) = &self.text {
            debug.field("text", text);
        }
        if !self.children.is_empty() {
            debug.field("children", &self.children);
        }
        debug.finish()
    }
}

/// Default renderer mirroring plain HTML form controls.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElementRenderer;

impl ElementRenderer {
    fn input_element(&self, props: InputProps) -> Element {
        let mut element = Element::with_display("input", &props.display);
        match props.display.resolved_class(props.errorful) {
            Some(class) => element.set_attr("class", class),
            None => {
                element.attrs.remove("class");
            }
        }
        element.set_attr("type", props.input_type.as_str());
        element.set_attr("name", props.name.as_str());
        element.set_attr("value", props.value);
        if let Some(role) = props.role {
            element.set_attr("role", role);
        }
        if let Some(checked) = props.checked {
            element.set_attr("aria-checked", checked.to_string());
            element.set_flag("checked", checked);
        }
        if let Some(radio_value) = props.radio_value {
            element.set_attr("data-radio-value", radio_value);
        }
        element.set_attr("aria-required", props.required.to_string());
        element.set_attr("aria-invalid", props.errorful.to_string());
        element.handlers.change = Some(props.on_change);
        element.handlers.blur = Some(props.on_blur);
        element
    }
}

impl Renderer for ElementRenderer {
    type Output = Element;

    fn form(&self, props: FormProps, children: Vec<Element>) -> Element {
        let mut element = Element::with_display("form", &props.display);
        element.set_attr("aria-busy", props.busy.to_string());
        if let Some(label) = props.aria_label {
            element.set_attr("aria-label", label);
        }
        element.handlers.submit = Some(props.on_submit);
        element.with_children(children)
    }

    fn input(&self, props: InputProps) -> Element {
        self.input_element(props)
    }

    fn radio(&self, props: InputProps) -> Element {
        let required = props.required;
        let mut element = self.input_element(props);
        element.set_flag("required", required);
        element
    }

    fn group(&self, props: GroupProps, children: Vec<Element>) -> Element {
        let mut element = Element::with_display("div", &props.display);
        element.set_attr("role", "radiogroup");
        element.set_attr("data-name", props.name.as_str());
        element.set_attr("aria-required", props.required.to_string());
        element.set_attr("aria-invalid", props.errorful.to_string());
        element.with_children(children)
    }

    fn select(&self, props: SelectProps, children: Vec<Element>) -> Element {
        let mut element = Element::with_display("select", &props.display);
        element.set_attr("id", props.id);
        element.set_attr("name", props.name.as_str());
        element.set_attr("role", "listbox");
        element.set_attr("aria-required", props.required.to_string());
        element.set_attr("aria-invalid", props.errorful.to_string());
        if let Some(value) = props.value {
            element.set_attr("value", value);
        }
        element.handlers.change = Some(props.on_change);
        element.handlers.blur = Some(props.on_blur);
        element.handlers.mount = Some(props.on_mount);
        element.with_children(children)
    }

    fn option(&self, props: OptionProps) -> Element {
        let mut element = Element::with_display("option", &props.display);
        element.set_attr("role", "option");
        element.set_attr("value", props.value);
        element.set_attr("aria-selected", props.selected.to_string());
        element.set_flag("selected", props.selected);
        element.text = Some(props.label);
        element
    }

    fn error(&self, props: ErrorProps) -> Element {
        let mut element = Element::with_display("span", &props.display);
        element.set_attr("role", "alert");
        element.set_attr("data-error-for", props.key.as_str());
        element.text = props.message;
        element
    }

    fn submit(&self, props: SubmitProps) -> Element {
        let mut element = Element::with_display("button", &props.display);
        element.set_attr("type", "submit");
        element.set_flag("disabled", props.disabled);
        element.set_attr("aria-busy", props.submitting.to_string());
        element
    }
}
