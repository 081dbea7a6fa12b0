use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{trace, warn};

use super::controller::FormResult;
use super::kind::FieldKind;
use super::store::{FormStore, Subscription};
use crate::id::{FormId, capitalize, field_element_id};
use crate::render::{
    BlurHandler, ChangeEvent, ChangeHandler, DisplayProps, GroupProps, InputProps, InputType,
    MountHandler, OptionProps, Renderer, SelectProps,
};
use crate::schema::SchemaNode;
use crate::value::{FieldKey, Value};

/// Store access shared by a field binding, its option bindings and the
/// handlers they hand out to the renderer.
pub(crate) struct FieldCore {
    form: FormId,
    key: FieldKey,
    schema: SchemaNode,
    store: FormStore,
}

impl FieldCore {
    pub(crate) fn new(form: FormId, key: FieldKey, schema: SchemaNode, store: FormStore) -> Self {
        Self {
            form,
            key,
            schema,
            store,
        }
    }

    fn value(&self) -> FormResult<Option<Value>> {
        self.store.value(self.key)
    }

    /// Writes the raw value, then validates it and records the outcome.
    fn change(&self, value: Value) -> FormResult<()> {
        let result = self.schema.validate(Some(&value));
        self.store.set_value(self.key, value)?;
        trace!(
            form = %self.form,
            field = %self.key,
            valid = result.is_ok(),
            "Field changed"
        );
        self.store.record_validation(self.key, &result)
    }

    fn toggle(&self) -> FormResult<()> {
        let checked = self.value()?.and_then(|value| value.as_bool()).unwrap_or(false);
        self.change(Value::Bool(!checked))
    }

    fn touch(&self) -> FormResult<()> {
        self.store.touch(self.key)
    }

    /// Adopts the value an attached control already shows, unless the
    /// store holds one.
    fn seed(&self, shown: Option<&str>) -> FormResult<()> {
        let Some(shown) = shown else {
            return Ok(());
        };
        if self.value()?.is_some() {
            return Ok(());
        }
        trace!(form = %self.form, field = %self.key, value = shown, "Seeding field from control");
        self.store.set_value(self.key, Value::from(shown))
    }

    fn error_visible(&self) -> FormResult<bool> {
        let has_error = self.store.errors().with(|errors| errors.contains(self.key))?;
        Ok(has_error && self.store.touched().with(|touched| touched.is_touched(self.key))?)
    }

    fn required(&self) -> bool {
        !self.schema.is_optional()
    }

    fn report(&self, action: &'static str, result: FormResult<()>) {
        if let Err(error) = result {
            warn!(form = %self.form, field = %self.key, %error, "Field {action} failed");
        }
    }
}

fn change_handler(core: &Arc<FieldCore>, toggles: bool) -> ChangeHandler {
    let core = core.clone();
    Arc::new(move |event: &ChangeEvent| {
        let result = if toggles {
            core.toggle()
        } else {
            core.change(event.value.clone())
        };
        core.report("change", result);
    })
}

fn blur_handler(core: &Arc<FieldCore>) -> BlurHandler {
    let core = core.clone();
    Arc::new(move || core.report("blur", core.touch()))
}

/// One schema field bound to its form's store.
pub struct FieldBinding<R: Renderer> {
    core: Arc<FieldCore>,
    kind: FieldKind,
    renderer: Arc<R>,
    error_class: Option<String>,
    element_id: String,
}

impl<R: Renderer> Clone for FieldBinding<R> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            kind: self.kind.clone(),
            renderer: self.renderer.clone(),
            error_class: self.error_class.clone(),
            element_id: self.element_id.clone(),
        }
    }
}

impl<R: Renderer> FieldBinding<R> {
    pub(crate) fn new(
        core: FieldCore,
        kind: FieldKind,
        renderer: Arc<R>,
        error_class: Option<String>,
    ) -> Self {
        let element_id = field_element_id(core.form, core.key);
        Self {
            core: Arc::new(core),
            kind,
            renderer,
            error_class,
            element_id,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.core.key
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Capitalized key used by the field namespace.
    pub fn name(&self) -> String {
        capitalize(self.core.key.as_str())
    }

    pub fn display_name(&self) -> String {
        format!("Form.Field.{}", self.name())
    }

    pub fn is_required(&self) -> bool {
        self.core.required()
    }

    pub fn is_error_visible(&self) -> FormResult<bool> {
        self.core.error_visible()
    }

    /// One binding per allowed option; empty for scalar kinds.
    pub fn options(&self) -> Vec<OptionBinding<R>> {
        self.kind
            .options()
            .iter()
            .map(|value| OptionBinding {
                core: self.core.clone(),
                value: value.clone(),
                grouped: matches!(self.kind, FieldKind::ChoiceGroup(_)),
                renderer: self.renderer.clone(),
                error_class: self.error_class.clone(),
            })
            .collect()
    }

    /// Looks an option up by its value or its capitalized name.
    pub fn option(&self, name: &str) -> Option<OptionBinding<R>> {
        self.options()
            .into_iter()
            .find(|option| option.value == name || option.name() == name)
    }

    pub fn value(&self) -> FormResult<Option<Value>> {
        self.core.value()
    }

    /// Writes the raw value without validating it.
    pub fn set_value(&self, value: impl Into<Value>) -> FormResult<()> {
        self.core.store.set_value(self.core.key, value.into())
    }

    /// Calls `listener` whenever this field's raw value changes.
    pub fn use_value(
        &self,
        listener: impl Fn(Option<&Value>) + Send + Sync + 'static,
    ) -> FormResult<Subscription> {
        let key = self.core.key;
        let last = Mutex::new(self.value()?);
        self.core.store.values().subscribe(move |values| {
            let current = values.get(&key);
            let mut last = match last.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if last.as_ref() != current {
                *last = current.cloned();
                drop(last);
                listener(current);
            }
        })
    }

    /// Same path as a control's change event: write, validate, record.
    pub fn change(&self, value: impl Into<Value>) -> FormResult<()> {
        self.core.change(value.into())
    }

    /// Flips a boolean field. Unset counts as unchecked.
    pub fn toggle(&self) -> FormResult<()> {
        self.core.toggle()
    }

    pub fn blur(&self) -> FormResult<()> {
        self.core.touch()
    }

    fn display_with_error_class(&self, mut display: DisplayProps) -> DisplayProps {
        if display.error_class.is_none() {
            display.error_class = self.error_class.clone();
        }
        display
    }

    pub fn input_props(&self, display: DisplayProps) -> FormResult<InputProps> {
        let value = self.value()?;
        let (input_type, checked, role) = match self.kind {
            FieldKind::Boolean => {
                let checked = value.as_ref().and_then(Value::as_bool).unwrap_or(false);
                (InputType::Checkbox, Some(checked), Some("checkbox"))
            }
            FieldKind::Number => (InputType::Number, None, None),
            _ => (InputType::Text, None, None),
        };
        Ok(InputProps {
            display: self.display_with_error_class(display),
            input_type,
            name: self.core.key,
            value: value.as_ref().map(Value::to_attr).unwrap_or_default(),
            checked,
            role,
            required: self.core.required(),
            errorful: self.core.error_visible()?,
            radio_value: None,
            on_change: change_handler(&self.core, self.kind == FieldKind::Boolean),
            on_blur: blur_handler(&self.core),
        })
    }

    pub fn group_props(&self, display: DisplayProps) -> FormResult<GroupProps> {
        Ok(GroupProps {
            display,
            name: self.core.key,
            required: self.core.required(),
            errorful: self.core.error_visible()?,
        })
    }

    /// Each call yields a fresh `on_mount` that seeds at most once, so a
    /// newly attached control can seed again after a reset.
    pub fn select_props(&self, display: DisplayProps) -> FormResult<SelectProps> {
        let core = self.core.clone();
        let seeded = Arc::new(AtomicBool::new(false));
        let on_mount: MountHandler = Arc::new(move |shown: Option<&str>| {
            if seeded.swap(true, Ordering::SeqCst) {
                return;
            }
            core.report("mount", core.seed(shown));
        });
        Ok(SelectProps {
            display: self.display_with_error_class(display),
            id: self.element_id.clone(),
            name: self.core.key,
            value: self.value()?.as_ref().map(Value::to_attr),
            required: self.core.required(),
            errorful: self.core.error_visible()?,
            on_change: change_handler(&self.core, false),
            on_blur: blur_handler(&self.core),
            on_mount,
        })
    }

    /// Renders the control. Choice kinds render every option inside their
    /// container with default display props.
    pub fn render(&self, display: DisplayProps) -> FormResult<R::Output> {
        let children = self
            .options()
            .iter()
            .map(|option| option.render(DisplayProps::new()))
            .collect::<FormResult<Vec<_>>>()?;
        self.render_with(display, children)
    }

    /// Renders a choice container around caller-rendered options. Scalar
    /// kinds have no container and ignore `children`.
    pub fn render_with(
        &self,
        display: DisplayProps,
        children: Vec<R::Output>,
    ) -> FormResult<R::Output> {
        match self.kind {
            FieldKind::Text | FieldKind::Number | FieldKind::Boolean => {
                Ok(self.renderer.input(self.input_props(display)?))
            }
            FieldKind::ChoiceGroup(_) => {
                Ok(self.renderer.group(self.group_props(display)?, children))
            }
            FieldKind::ChoiceList(_) => {
                Ok(self.renderer.select(self.select_props(display)?, children))
            }
        }
    }
}

/// One allowed value of a choice field: a radio for groups, an option
/// item for lists.
pub struct OptionBinding<R: Renderer> {
    core: Arc<FieldCore>,
    value: String,
    grouped: bool,
    renderer: Arc<R>,
    error_class: Option<String>,
}

impl<R: Renderer> Clone for OptionBinding<R> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            value: self.value.clone(),
            grouped: self.grouped,
            renderer: self.renderer.clone(),
            error_class: self.error_class.clone(),
        }
    }
}

impl<R: Renderer> OptionBinding<R> {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn name(&self) -> String {
        capitalize(&self.value)
    }

    pub fn display_name(&self) -> String {
        format!(
            "Form.Field.{}.{}",
            capitalize(self.core.key.as_str()),
            self.name()
        )
    }

    /// True iff the field's raw value equals this option.
    pub fn is_selected(&self) -> FormResult<bool> {
        Ok(self
            .core
            .value()?
            .is_some_and(|current| current.matches_option(&self.value)))
    }

    /// Sets the field to this option and validates it.
    pub fn select(&self) -> FormResult<()> {
        self.core.change(Value::from(self.value.as_str()))
    }

    pub fn render(&self, display: DisplayProps) -> FormResult<R::Output> {
        let selected = self.is_selected()?;
        if !self.grouped {
            return Ok(self.renderer.option(OptionProps {
                display,
                value: self.value.clone(),
                label: self.value.clone(),
                selected,
            }));
        }

        let mut display = display;
        if display.error_class.is_none() {
            display.error_class = self.error_class.clone();
        }
        let on_change: ChangeHandler = {
            let core = self.core.clone();
            let option = self.value.clone();
            Arc::new(move |_: &ChangeEvent| {
                core.report("change", core.change(Value::from(option.as_str())));
            })
        };
        Ok(self.renderer.radio(InputProps {
            display,
            input_type: InputType::Radio,
            name: self.core.key,
            value: self.value.clone(),
            checked: Some(selected),
            role: Some("radio"),
            required: self.core.required(),
            errorful: self.core.error_visible()?,
            radio_value: Some(self.value.clone()),
            on_change,
            on_blur: blur_handler(&self.core),
        }))
    }
}
