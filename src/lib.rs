//! Schema-driven reactive forms.
//!
//! A [`form::Form`] is built from a [`schema::FormSchema`]: every field is
//! classified once, bound to a per-instance reactive store, and given an
//! error view. Rendering goes through a [`render::Renderer`]; the default
//! [`render::ElementRenderer`] produces a DOM-like tree whose handlers can
//! be dispatched directly.

pub mod form;
pub mod i18n;
pub mod id;
pub mod prelude;
pub mod render;
pub mod schema;
pub mod value;

pub use form::{Form, FormBuilder, FormError, FormResult};
pub use i18n::{I18nManager, Locale};
