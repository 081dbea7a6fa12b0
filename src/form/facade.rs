use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::binding::{FieldBinding, FieldCore};
use super::controller::{
    FormError, FormOptions, FormResult, FormUtils, SubmissionController, SubmitCallback,
    SubmitOutcome, SubmitPhase,
};
use super::error_view::{ErrorView, SubmitView};
use super::kind::FieldKind;
use super::model::{FormModel, ParsedFormData};
use super::store::{FormErrors, FormStore, RawFormData, TouchedFlags};
use crate::id::{FormId, capitalize};
use crate::render::{DisplayProps, ElementRenderer, FormProps, Renderer, SubmitEvent, SubmitHandler};
use crate::schema::FormSchema;
use crate::value::{ErrorKey, FieldKey, Value};

pub struct FormBuilder<R: Renderer = ElementRenderer> {
    schema: FormSchema,
    options: FormOptions,
    defaults: RawFormData,
    renderer: R,
}

impl FormBuilder<ElementRenderer> {
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            options: FormOptions::default(),
            defaults: RawFormData::new(),
            renderer: ElementRenderer,
        }
    }
}

impl<R: Renderer> FormBuilder<R> {
    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.options.aria_label = Some(label.into());
        self
    }

    pub fn error_class(mut self, class: impl Into<String>) -> Self {
        self.options.error_class = Some(class.into());
        self
    }

    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.options.single_flight = enabled;
        self
    }

    /// Seeds the value cell at construction. `reset()` does not restore it.
    pub fn default_value(mut self, key: impl Into<FieldKey>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn renderer<T: Renderer>(self, renderer: T) -> FormBuilder<T> {
        FormBuilder {
            schema: self.schema,
            options: self.options,
            defaults: self.defaults,
            renderer,
        }
    }

    pub fn build(self) -> FormResult<Form<R>> {
        if let Some(key) = self.schema.first_duplicate() {
            return Err(FormError::DuplicateField(key));
        }
        // `errors().get` resolves both spellings to the form-wide view.
        if let Some(key) = self
            .schema
            .keys()
            .find(|key| capitalize(key.as_str()) == capitalize(ErrorKey::SUBMISSION))
        {
            return Err(FormError::ReservedField(key));
        }
        if let Some(key) = self
            .defaults
            .keys()
            .find(|key| !self.schema.contains(**key))
        {
            return Err(FormError::UnknownField(key.to_string()));
        }
        let kinds = self
            .schema
            .iter()
            .map(|(key, schema)| {
                let shape = schema.shape();
                FieldKind::classify(&shape).ok_or_else(|| FormError::UnsupportedSchema {
                    key,
                    shape: shape.to_string(),
                })
            })
            .collect::<FormResult<Vec<_>>>()?;

        let id = FormId::next();
        let schema = Arc::new(self.schema);
        let store = FormStore::new(self.defaults);
        let renderer = Arc::new(self.renderer);

        let fields = schema
            .iter()
            .zip(kinds)
            .map(|((key, node), kind)| {
                FieldBinding::new(
                    FieldCore::new(id, key, node.clone(), store.clone()),
                    kind,
                    renderer.clone(),
                    self.options.error_class.clone(),
                )
            })
            .collect();
        let error_view =
            |key: ErrorKey| ErrorView::new(key, schema.clone(), store.clone(), renderer.clone());
        let errors = ErrorNamespace {
            fields: schema.keys().map(|key| error_view(key.into())).collect(),
            submission: error_view(ErrorKey::Submission),
        };
        let controller =
            SubmissionController::new(id, schema.clone(), store.clone(), self.options.single_flight);

        debug!(form = %id, fields = schema.len(), "Form built");
        Ok(Form {
            id,
            options: self.options,
            fields: FieldNamespace { fields },
            errors,
            submit: SubmitView::new(store.clone(), renderer.clone()),
            controller,
            schema,
            store,
            renderer,
        })
    }
}

/// A live form instance. Each instance owns its store; two forms built
/// from equal schemas never share state.
pub struct Form<R: Renderer = ElementRenderer> {
    id: FormId,
    options: FormOptions,
    schema: Arc<FormSchema>,
    store: FormStore,
    renderer: Arc<R>,
    fields: FieldNamespace<R>,
    errors: ErrorNamespace<R>,
    submit: SubmitView<R>,
    controller: SubmissionController,
}

impl Form<ElementRenderer> {
    pub fn new(schema: FormSchema) -> FormResult<Self> {
        FormBuilder::new(schema).build()
    }

    pub fn builder(schema: FormSchema) -> FormBuilder<ElementRenderer> {
        FormBuilder::new(schema)
    }
}

impl<R: Renderer> Form<R> {
    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn fields(&self) -> &FieldNamespace<R> {
        &self.fields
    }

    /// Field by key or capitalized name.
    pub fn field(&self, name: &str) -> FormResult<&FieldBinding<R>> {
        self.fields
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    pub fn errors(&self) -> &ErrorNamespace<R> {
        &self.errors
    }

    /// Error view by key or capitalized name; `"submission"` and
    /// `"Submission"` address the form-wide view.
    pub fn error(&self, name: &str) -> FormResult<&ErrorView<R>> {
        self.errors
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    pub fn submit_button(&self) -> &SubmitView<R> {
        &self.submit
    }

    /// Renders the container with no submit callback: a submit still
    /// validates, touches every field and settles immediately.
    pub fn render(&self, display: DisplayProps, children: Vec<R::Output>) -> FormResult<R::Output> {
        self.render_with(display, |_, _| Ok(()), children)
    }

    pub fn render_with<F>(
        &self,
        display: DisplayProps,
        on_submit: F,
        children: Vec<R::Output>,
    ) -> FormResult<R::Output>
    where
        F: Fn(ParsedFormData, FormUtils) -> FormResult<()> + Send + Sync + 'static,
    {
        let callback: SubmitCallback = Arc::new(on_submit);
        let controller = self.controller.clone();
        let form = self.id;
        let on_submit: SubmitHandler = Arc::new(move |event: &SubmitEvent| {
            let callback = callback.clone();
            match controller.handle(event, move |data, utils| callback(data, utils)) {
                Ok(outcome) => debug!(form = %form, ?outcome, "Submit event handled"),
                Err(error) => warn!(form = %form, %error, "Submit event failed"),
            }
        });
        Ok(self.renderer.form(
            FormProps {
                display,
                aria_label: self.options.aria_label.clone(),
                busy: self.store.submitting().read()?,
                on_submit,
            },
            children,
        ))
    }

    pub fn submit<F>(&self, handler: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(ParsedFormData, FormUtils) -> FormResult<()>,
    {
        self.controller.submit(handler)
    }

    pub async fn submit_async<F, Fut>(&self, handler: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(ParsedFormData, FormUtils) -> Fut,
        Fut: Future<Output = FormResult<()>>,
    {
        self.controller.submit_async(handler).await
    }

    pub fn submit_model<M, F>(&self, handler: F) -> FormResult<SubmitOutcome>
    where
        M: FormModel,
        F: FnOnce(M, FormUtils) -> FormResult<()>,
    {
        self.controller.submit_model(handler)
    }

    pub fn handle_submit<F>(&self, event: &SubmitEvent, handler: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(ParsedFormData, FormUtils) -> FormResult<()>,
    {
        self.controller.handle(event, handler)
    }

    pub fn reset(&self) -> FormResult<()> {
        debug!(form = %self.id, "Resetting form");
        self.store.reset()
    }

    pub fn use_reset(&self) -> ResetHandle {
        ResetHandle {
            form: self.id,
            store: self.store.clone(),
        }
    }

    pub fn utils(&self) -> FormUtils {
        self.controller.utils()
    }

    pub fn phase(&self) -> FormResult<SubmitPhase> {
        self.controller.phase()
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        Ok(FormSnapshot {
            values: self.store.values().read()?,
            errors: self.store.errors().read()?,
            touched: self.store.touched().read()?,
            submitting: self.store.submitting().read()?,
            submitted: self.store.submitted().read()?,
        })
    }
}

/// Reset callable from anywhere, independent of a submit attempt.
#[derive(Clone, Debug)]
pub struct ResetHandle {
    form: FormId,
    store: FormStore,
}

impl ResetHandle {
    pub fn reset(&self) -> FormResult<()> {
        debug!(form = %self.form, "Resetting form from reset handle");
        self.store.reset()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormSnapshot {
    pub values: RawFormData,
    pub errors: FormErrors,
    pub touched: TouchedFlags,
    pub submitting: bool,
    pub submitted: bool,
}

pub struct FieldNamespace<R: Renderer> {
    fields: Vec<FieldBinding<R>>,
}

impl<R: Renderer> FieldNamespace<R> {
    pub fn get(&self, name: &str) -> Option<&FieldBinding<R>> {
        self.fields
            .iter()
            .find(|field| field.key().as_str() == name || field.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldBinding<R>> + '_ {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct ErrorNamespace<R: Renderer> {
    fields: Vec<ErrorView<R>>,
    submission: ErrorView<R>,
}

impl<R: Renderer> ErrorNamespace<R> {
    pub fn get(&self, name: &str) -> Option<&ErrorView<R>> {
        if name == ErrorKey::SUBMISSION || name == capitalize(ErrorKey::SUBMISSION) {
            return Some(&self.submission);
        }
        self.fields
            .iter()
            .find(|view| view.key().as_str() == name || view.name() == name)
    }

    pub fn submission(&self) -> &ErrorView<R> {
        &self.submission
    }

    /// Per-field views in schema order, without the submission view.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorView<R>> + '_ {
        self.fields.iter()
    }
}
