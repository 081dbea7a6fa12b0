use std::sync::Arc;

use super::controller::FormResult;
use super::store::{FormStore, Subscription};
use crate::id::capitalize;
use crate::render::{DisplayProps, ErrorProps, Renderer, SubmitProps};
use crate::schema::FormSchema;
use crate::value::ErrorKey;

/// Error surface for one field or for the form-wide submission slot.
pub struct ErrorView<R: Renderer> {
    key: ErrorKey,
    schema: Arc<FormSchema>,
    store: FormStore,
    renderer: Arc<R>,
}

impl<R: Renderer> Clone for ErrorView<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            schema: self.schema.clone(),
            store: self.store.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<R: Renderer> ErrorView<R> {
    pub(crate) fn new(
        key: ErrorKey,
        schema: Arc<FormSchema>,
        store: FormStore,
        renderer: Arc<R>,
    ) -> Self {
        Self {
            key,
            schema,
            store,
            renderer,
        }
    }

    pub fn key(&self) -> ErrorKey {
        self.key
    }

    pub fn name(&self) -> String {
        capitalize(self.key.as_str())
    }

    pub fn display_name(&self) -> String {
        format!("Form.Error.{}", self.name())
    }

    /// A field view needs an error and a touched flag for its key. The
    /// submission view needs `submitted`, any error at all, and every
    /// schema field touched.
    pub fn is_visible(&self) -> FormResult<bool> {
        match self.key {
            ErrorKey::Field(key) => {
                let has_error = self.store.errors().with(|errors| errors.contains(key))?;
                Ok(has_error && self.store.touched().with(|touched| touched.is_touched(key))?)
            }
            ErrorKey::Submission => {
                if !self.store.submitted().read()? {
                    return Ok(false);
                }
                if !self.store.errors().with(|errors| errors.has_any())? {
                    return Ok(false);
                }
                self.store
                    .touched()
                    .with(|touched| touched.all_touched(self.schema.keys()))
            }
        }
    }

    /// Message shown while visible. The submission view may be visible
    /// with no message of its own when only field errors exist.
    pub fn message(&self) -> FormResult<Option<String>> {
        if !self.is_visible()? {
            return Ok(None);
        }
        self.store
            .errors()
            .with(|errors| errors.get(self.key).map(|error| error.message()))
    }

    /// `None` while hidden.
    pub fn render(&self, display: DisplayProps) -> FormResult<Option<R::Output>> {
        if !self.is_visible()? {
            return Ok(None);
        }
        let message = self
            .store
            .errors()
            .with(|errors| errors.get(self.key).map(|error| error.message()))?;
        Ok(Some(self.renderer.error(ErrorProps {
            display,
            key: self.key,
            message,
        })))
    }

    /// Calls `listener` whenever any cell this view depends on changes.
    pub fn watch(&self, listener: impl Fn() + Send + Sync + 'static) -> FormResult<Subscription> {
        let listener = Arc::new(listener);
        let errors = {
            let listener = listener.clone();
            self.store.errors().subscribe(move |_| listener())?
        };
        let touched = {
            let listener = listener.clone();
            self.store.touched().subscribe(move |_| listener())?
        };
        let submitted = self.store.submitted().subscribe(move |_| listener())?;
        Ok(Subscription::new(move || {
            drop(errors);
            drop(touched);
            drop(submitted);
        }))
    }
}

/// Submit button reflecting the live `submitting` flag.
pub struct SubmitView<R: Renderer> {
    store: FormStore,
    renderer: Arc<R>,
}

impl<R: Renderer> Clone for SubmitView<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<R: Renderer> SubmitView<R> {
    pub(crate) fn new(store: FormStore, renderer: Arc<R>) -> Self {
        Self { store, renderer }
    }

    pub fn display_name(&self) -> &'static str {
        "Form.Event.Submit"
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        self.store.submitting().read()
    }

    pub fn render(&self, display: DisplayProps) -> FormResult<R::Output> {
        let submitting = self.is_submitting()?;
        let disabled = submitting || display.disabled;
        Ok(self.renderer.submit(SubmitProps {
            display,
            submitting,
            disabled,
        }))
    }
}
