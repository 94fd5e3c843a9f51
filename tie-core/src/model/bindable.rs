//! Typed data objects.
//!
//! `#[derive(Bindable)]` builds an [`Object`] from a plain struct so typed
//! models can be handed to an engine without assembling keys by hand.

use super::object::Object;

pub use tie_core_derive::Bindable;

/// A struct that converts into a bound data object.
pub trait Bindable: Sized {
    /// Object keys in field order, skipped fields excluded.
    fn keys() -> &'static [&'static str];

    /// Move every kept field into a fresh object.
    fn into_object(self) -> Object;
}
