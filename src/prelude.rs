pub use crate::form::{
    ErrorKey, ErrorView, FieldBinding, FieldKey, FieldKind, Form, FormBuilder, FormError,
    FormModel, FormOptions, FormResult, FormUtils, FromFieldValue, OptionBinding, ParsedFormData,
    ResetHandle, SubmitOutcome, SubmitPhase, SubmitView, Value,
};
pub use crate::i18n::{I18nManager, Locale};
pub use crate::render::{ChangeEvent, DisplayProps, Element, ElementRenderer, Renderer, SubmitEvent};
pub use crate::schema::{
    FieldSchema, FieldSchemaExt, FormSchema, SchemaShape, ValidationFailure, boolean, enumeration,
    literals, number, string,
};
