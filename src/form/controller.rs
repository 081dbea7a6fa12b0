use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use super::model::{FormModel, ParsedFormData};
use super::store::{FieldError, FormStore, TouchedFlags};
use crate::id::FormId;
use crate::render::SubmitEvent;
use crate::schema::FormSchema;
use crate::value::{ErrorKey, FieldKey};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    InvalidStateTransition { from: SubmitPhase, to: SubmitPhase },
    AlreadySubmitting,
    UnknownField(String),
    DuplicateField(FieldKey),
    ReservedField(FieldKey),
    UnsupportedSchema { key: FieldKey, shape: String },
    MissingField(FieldKey),
    FieldType { key: FieldKey, expected: &'static str },
    Rejected(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit phase transition: {from:?} -> {to:?}")
            }
            FormError::AlreadySubmitting => f.write_str("form submit is already in progress"),
            FormError::UnknownField(key) => write!(f, "form has no field named `{key}`"),
            FormError::DuplicateField(key) => write!(f, "field `{key}` is declared twice"),
            FormError::ReservedField(key) => {
                write!(f, "field name `{key}` is reserved for the form-wide error")
            }
            FormError::UnsupportedSchema { key, shape } => {
                write!(f, "field `{key}` has unsupported schema shape {shape}")
            }
            FormError::MissingField(key) => write!(f, "field `{key}` has no value"),
            FormError::FieldType { key, expected } => {
                write!(f, "field `{key}` does not hold a {expected}")
            }
            FormError::Rejected(reason) => write!(f, "submit rejected: {reason}"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormOptions {
    /// Accessible label of the form container.
    pub aria_label: Option<String>,
    /// Class applied to controls whose error is visible, unless the
    /// control's own display props name one.
    pub error_class: Option<String>,
    /// Reject a submit while a previous one is still in flight.
    pub single_flight: bool,
}

/// Submission state machine. `Blocked` and `Settled` are transient and
/// collapse back to `Idle` within the same attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitPhase {
    Idle,
    Validating,
    Blocked,
    Submitting,
    Settled,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed for `errors` fields; the callback was not invoked.
    Blocked { errors: usize },
    Submitted,
}

impl SubmitOutcome {
    pub fn is_submitted(self) -> bool {
        self == SubmitOutcome::Submitted
    }
}

/// Utilities handed to the submit callback.
#[derive(Clone, Debug)]
pub struct FormUtils {
    form: FormId,
    schema: Arc<FormSchema>,
    store: FormStore,
}

impl FormUtils {
    pub(super) fn new(form: FormId, schema: Arc<FormSchema>, store: FormStore) -> Self {
        Self {
            form,
            schema,
            store,
        }
    }

    /// Clears values, errors, touched flags and `submitting`.
    pub fn reset(&self) -> FormResult<()> {
        debug!(form = %self.form, "Resetting form from submit utilities");
        self.store.reset()
    }

    /// Writes a plain message into the error cell without validating.
    /// `"submission"` addresses the form-wide slot; any other key must be
    /// a schema field.
    pub fn set_error(
        &self,
        key: impl Into<ErrorKey>,
        message: impl Into<String>,
    ) -> FormResult<()> {
        let key = key.into();
        if let ErrorKey::Field(field) = key {
            if !self.schema.contains(field) {
                return Err(FormError::UnknownField(field.to_string()));
            }
        }
        debug!(form = %self.form, key = %key, "Setting manual error");
        self.store.set_error(key, message.into())
    }
}

pub type SubmitCallback = Arc<dyn Fn(ParsedFormData, FormUtils) -> FormResult<()> + Send + Sync>;

#[derive(Clone)]
pub struct SubmissionController {
    form: FormId,
    schema: Arc<FormSchema>,
    store: FormStore,
    phase: Arc<RwLock<SubmitPhase>>,
    single_flight: bool,
}

impl SubmissionController {
    pub(super) fn new(
        form: FormId,
        schema: Arc<FormSchema>,
        store: FormStore,
        single_flight: bool,
    ) -> Self {
        Self {
            form,
            schema,
            store,
            phase: Arc::new(RwLock::new(SubmitPhase::Idle)),
            single_flight,
        }
    }

    pub fn phase(&self) -> FormResult<SubmitPhase> {
        Ok(*read_lock(&self.phase, "reading submit phase")?)
    }

    pub fn utils(&self) -> FormUtils {
        FormUtils::new(self.form, self.schema.clone(), self.store.clone())
    }

    /// Entry point for a host submit event: prevents the default action,
    /// then runs [`submit`](Self::submit).
    pub fn handle<F>(&self, event: &SubmitEvent, handler: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(ParsedFormData, FormUtils) -> FormResult<()>,
    {
        event.prevent_default();
        self.submit(handler)
    }

    pub fn submit<F>(&self, handler: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(ParsedFormData, FormUtils) -> FormResult<()>,
    {
        let (data, settle) = match self.begin()? {
            Gate::Blocked(outcome) => return Ok(outcome),
            Gate::Open(data, settle) => (data, settle),
        };
        debug!(form = %self.form, fields = data.len(), "Invoking submit callback");
        let result = handler(data, self.utils());
        drop(settle);
        result.map(|()| SubmitOutcome::Submitted)
    }

    /// Like [`submit`](Self::submit) but awaits the callback. `submitting`
    /// stays true until the returned future settles or is dropped.
    pub async fn submit_async<F, Fut>(&self, handler: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(ParsedFormData, FormUtils) -> Fut,
        Fut: Future<Output = FormResult<()>>,
    {
        let (data, settle) = match self.begin()? {
            Gate::Blocked(outcome) => return Ok(outcome),
            Gate::Open(data, settle) => (data, settle),
        };
        debug!(form = %self.form, fields = data.len(), "Awaiting async submit callback");
        let result = handler(data, self.utils()).await;
        drop(settle);
        result.map(|()| SubmitOutcome::Submitted)
    }

    /// Submits with the validated raw data converted into a typed model.
    pub fn submit_model<M, F>(&self, handler: F) -> FormResult<SubmitOutcome>
    where
        M: FormModel,
        F: FnOnce(M, FormUtils) -> FormResult<()>,
    {
        self.submit(|data, utils| handler(data.parse::<M>()?, utils))
    }

    fn begin(&self) -> FormResult<Gate> {
        {
            let mut phase = write_lock(&self.phase, "starting submit")?;
            if self.single_flight && self.store.submitting().read()? {
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_phase(&mut phase, SubmitPhase::Validating)?;
        }
        debug!(form = %self.form, "Submit attempt started");

        let values = self.store.values().read()?;
        let mut data = ParsedFormData::default();
        let mut results = Vec::with_capacity(self.schema.len());
        for (key, schema) in self.schema.iter() {
            let raw = values.get(&key);
            if let Some(value) = raw {
                data.insert(key, value.clone());
            }
            results.push((key, schema.validate(raw)));
        }
        let failures = results.iter().filter(|(_, result)| result.is_err()).count();

        self.store
            .touched()
            .write(self.schema.keys().collect::<TouchedFlags>())?;
        self.store.errors().update(|errors| {
            for (key, result) in results {
                match result {
                    Ok(_) => errors.clear(key),
                    Err(failure) => errors.set(key, FieldError::Validation(failure)),
                }
            }
        })?;
        self.store.submitted().write(true)?;

        if failures > 0 {
            let mut phase = write_lock(&self.phase, "blocking submit")?;
            transition_submit_phase(&mut phase, SubmitPhase::Blocked)?;
            transition_submit_phase(&mut phase, SubmitPhase::Idle)?;
            debug!(form = %self.form, errors = failures, "Submit blocked by validation");
            return Ok(Gate::Blocked(SubmitOutcome::Blocked { errors: failures }));
        }

        {
            let mut phase = write_lock(&self.phase, "entering submitting phase")?;
            transition_submit_phase(&mut phase, SubmitPhase::Submitting)?;
        }
        self.store.submitting().write(true)?;
        Ok(Gate::Open(
            data,
            SettleGuard {
                form: self.form,
                store: self.store.clone(),
                phase: self.phase.clone(),
            },
        ))
    }
}

enum Gate {
    Blocked(SubmitOutcome),
    Open(ParsedFormData, SettleGuard),
}

/// Clears `submitting` exactly once per admitted attempt, on every exit
/// path including panics in the callback and dropped futures.
struct SettleGuard {
    form: FormId,
    store: FormStore,
    phase: Arc<RwLock<SubmitPhase>>,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if let Err(error) = self.store.submitting().write(false) {
            warn!(form = %self.form, %error, "Failed to clear submitting flag");
        }
        let mut phase = match self.phase.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *phase == SubmitPhase::Submitting {
            *phase = SubmitPhase::Settled;
        }
        *phase = SubmitPhase::Idle;
        debug!(form = %self.form, "Submit settled");
    }
}

pub(super) fn transition_submit_phase(
    phase: &mut SubmitPhase,
    next: SubmitPhase,
) -> FormResult<()> {
    let current = *phase;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitPhase::Idle, SubmitPhase::Validating)
            | (SubmitPhase::Submitting, SubmitPhase::Validating)
            | (SubmitPhase::Validating, SubmitPhase::Blocked)
            | (SubmitPhase::Validating, SubmitPhase::Submitting)
            | (SubmitPhase::Submitting, SubmitPhase::Settled)
            | (_, SubmitPhase::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    *phase = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_table_rejects_skipping_validation() {
        let mut phase = SubmitPhase::Idle;
        assert_eq!(
            transition_submit_phase(&mut phase, SubmitPhase::Submitting),
            Err(FormError::InvalidStateTransition {
                from: SubmitPhase::Idle,
                to: SubmitPhase::Submitting,
            })
        );
        assert_eq!(phase, SubmitPhase::Idle);
    }

    #[test]
    fn phase_table_accepts_full_cycle() {
        let mut phase = SubmitPhase::Idle;
        for next in [
            SubmitPhase::Validating,
            SubmitPhase::Submitting,
            SubmitPhase::Settled,
            SubmitPhase::Idle,
            SubmitPhase::Validating,
            SubmitPhase::Blocked,
            SubmitPhase::Idle,
        ] {
            transition_submit_phase(&mut phase, next).expect("allowed transition");
        }
        assert_eq!(phase, SubmitPhase::Idle);
    }

    #[test]
    fn blocked_cannot_jump_to_submitting() {
        let mut phase = SubmitPhase::Blocked;
        assert!(transition_submit_phase(&mut phase, SubmitPhase::Submitting).is_err());
    }

    #[test]
    fn errors_render_readable_messages() {
        assert_eq!(
            FormError::UnsupportedSchema {
                key: FieldKey::new("born"),
                shape: "date".to_string(),
            }
            .to_string(),
            "field `born` has unsupported schema shape date"
        );
        assert_eq!(
            FormError::AlreadySubmitting.to_string(),
            "form submit is already in progress"
        );
    }
}
