mod binding;
mod controller;
mod error_view;
mod facade;
mod kind;
mod model;
mod store;


pub use binding::{FieldBinding, OptionBinding};
pub use calmform_derive::FormModel;
pub use controller::{
    FormError, FormOptions, FormResult, FormUtils, SubmissionController, SubmitCallback,
    SubmitOutcome, SubmitPhase,
};
pub use error_view::{ErrorView, SubmitView};
pub use facade::{
    ErrorNamespace, FieldNamespace, Form, FormBuilder, FormSnapshot, ResetHandle,
};
pub use kind::FieldKind;
pub use model::{FormModel, FromFieldValue, ParsedFormData};
pub use store::{
    FieldError, FormErrors, FormStore, RawFormData, StoreCell, Subscription, TouchedFlags,
};

pub use crate::id::FormId;
pub use crate::value::{ErrorKey, FieldKey, Value};
