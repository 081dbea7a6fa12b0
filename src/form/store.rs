use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock, Weak};

use super::controller::{FormResult, read_lock, write_lock};
use crate::schema::ValidationFailure;
use crate::value::{ErrorKey, FieldKey, Value};

/// Raw values as last written by a control or `set_value`. Unset keys are
/// absent.
pub type RawFormData = BTreeMap<FieldKey, Value>;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct CellState<T> {
    value: T,
    listeners: BTreeMap<u64, Listener<T>>,
    next_listener: u64,
}

/// One independently subscribable piece of form state. Writes replace the
/// whole value and notify every listener after the lock is released.
pub struct StoreCell<T> {
    name: &'static str,
    state: Arc<RwLock<CellState<T>>>,
}

impl<T> Clone for StoreCell<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            state: self.state.clone(),
        }
    }
}

impl<T> StoreCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            state: Arc::new(RwLock::new(CellState {
                value: initial,
                listeners: BTreeMap::new(),
                next_listener: 0,
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn read(&self) -> FormResult<T> {
        Ok(read_lock(&self.state, "reading store cell")?.value.clone())
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> FormResult<R> {
        Ok(f(&read_lock(&self.state, "inspecting store cell")?.value))
    }

    pub fn write(&self, value: T) -> FormResult<()> {
        let (snapshot, listeners) = {
            let mut state = write_lock(&self.state, "writing store cell")?;
            state.value = value;
            (
                state.value.clone(),
                state.listeners.values().cloned().collect::<Vec<_>>(),
            )
        };
        for listener in listeners {
            listener(&snapshot);
        }
        Ok(())
    }

    /// Read-modify-write under a single lock acquisition.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> FormResult<()> {
        let (snapshot, listeners) = {
            let mut state = write_lock(&self.state, "updating store cell")?;
            f(&mut state.value);
            (
                state.value.clone(),
                state.listeners.values().cloned().collect::<Vec<_>>(),
            )
        };
        for listener in listeners {
            listener(&snapshot);
        }
        Ok(())
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&T) + Send + Sync + 'static,
    ) -> FormResult<Subscription> {
        let id = {
            let mut state = write_lock(&self.state, "subscribing to store cell")?;
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.insert(id, Arc::new(listener));
            id
        };

        let weak: Weak<RwLock<CellState<T>>> = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let mut state = match state.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            state.listeners.remove(&id);
        }))
    }

    pub fn listener_count(&self) -> FormResult<usize> {
        Ok(read_lock(&self.state, "counting store listeners")?
            .listeners
            .len())
    }
}

impl<T: Debug> Debug for StoreCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("StoreCell");
        debug.field("name", &self.name);
        match self.state.read() {
            Ok(state) => debug.field("value", &state.value),
            Err(_) => debug.field("value", &"<poisoned>"),
        };
        debug.finish()
    }
}

/// Keeps a listener attached until dropped.
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Leaves the listener attached for as long as the cell lives.
    pub fn detach(mut self) {
        self.unsubscribe.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.unsubscribe.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldError {
    Validation(ValidationFailure),
    Message(String),
}

impl FieldError {
    /// Structured failures join their messages with ", "; plain messages
    /// pass through unchanged.
    pub fn message(&self) -> String {
        match self {
            FieldError::Validation(failure) => failure.joined(),
            FieldError::Message(message) => message.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormErrors {
    entries: BTreeMap<ErrorKey, FieldError>,
}

impl FormErrors {
    pub fn get(&self, key: impl Into<ErrorKey>) -> Option<&FieldError> {
        self.entries.get(&key.into())
    }

    pub fn contains(&self, key: impl Into<ErrorKey>) -> bool {
        self.entries.contains_key(&key.into())
    }

    pub fn set(&mut self, key: impl Into<ErrorKey>, error: FieldError) {
        self.entries.insert(key.into(), error);
    }

    pub fn clear(&mut self, key: impl Into<ErrorKey>) {
        self.entries.remove(&key.into());
    }

    pub fn has_any(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorKey, &FieldError)> + '_ {
        self.entries.iter().map(|(key, error)| (*key, error))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TouchedFlags {
    flags: BTreeMap<FieldKey, bool>,
}

impl TouchedFlags {
    pub fn is_touched(&self, key: FieldKey) -> bool {
        self.flags.get(&key).copied().unwrap_or(false)
    }

    pub fn touch(&mut self, key: FieldKey) {
        self.flags.insert(key, true);
    }

    pub fn all_touched(&self, mut keys: impl Iterator<Item = FieldKey>) -> bool {
        keys.all(|key| self.is_touched(key))
    }

    pub fn touched_keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.flags
            .iter()
            .filter_map(|(key, touched)| touched.then_some(*key))
    }
}

impl FromIterator<FieldKey> for TouchedFlags {
    fn from_iter<I: IntoIterator<Item = FieldKey>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(|key| (key, true)).collect(),
        }
    }
}

/// The five cells owned by one form instance.
#[derive(Clone, Debug)]
pub struct FormStore {
    values: StoreCell<RawFormData>,
    errors: StoreCell<FormErrors>,
    touched: StoreCell<TouchedFlags>,
    submitting: StoreCell<bool>,
    submitted: StoreCell<bool>,
}

impl FormStore {
    pub fn new(initial_values: RawFormData) -> Self {
        Self {
            values: StoreCell::new("values", initial_values),
            errors: StoreCell::new("errors", FormErrors::default()),
            touched: StoreCell::new("touched", TouchedFlags::default()),
            submitting: StoreCell::new("submitting", false),
            submitted: StoreCell::new("submitted", false),
        }
    }

    pub fn values(&self) -> &StoreCell<RawFormData> {
        &self.values
    }

    pub fn errors(&self) -> &StoreCell<FormErrors> {
        &self.errors
    }

    pub fn touched(&self) -> &StoreCell<TouchedFlags> {
        &self.touched
    }

    pub fn submitting(&self) -> &StoreCell<bool> {
        &self.submitting
    }

    pub fn submitted(&self) -> &StoreCell<bool> {
        &self.submitted
    }

    pub fn value(&self, key: FieldKey) -> FormResult<Option<Value>> {
        self.values.with(|values| values.get(&key).cloned())
    }

    pub fn set_value(&self, key: FieldKey, value: Value) -> FormResult<()> {
        self.values.update(|values| {
            values.insert(key, value);
        })
    }

    pub fn touch(&self, key: FieldKey) -> FormResult<()> {
        self.touched.update(|touched| touched.touch(key))
    }

    pub fn record_validation(
        &self,
        key: FieldKey,
        result: &Result<Option<Value>, ValidationFailure>,
    ) -> FormResult<()> {
        self.errors.update(|errors| match result {
            Ok(_) => errors.clear(key),
            Err(failure) => errors.set(key, FieldError::Validation(failure.clone())),
        })
    }

    pub(crate) fn set_error(&self, key: ErrorKey, message: String) -> FormResult<()> {
        self.errors
            .update(|errors| errors.set(key, FieldError::Message(message)))
    }

    /// Clears values, errors, touched flags and `submitting`. The cells
    /// themselves and their listeners are kept; `submitted` is untouched.
    pub fn reset(&self) -> FormResult<()> {
        self.values.write(RawFormData::new())?;
        self.errors.write(FormErrors::default())?;
        self.touched.write(TouchedFlags::default())?;
        self.submitting.write(false)?;
        tracing::debug!("Form store reset");
        Ok(())
    }
}
