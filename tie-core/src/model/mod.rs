//! The data tree bound to a document.
//!
//! - [`Value`]: tagged leaf/container values
//! - [`Object`]: shared containers whose slots can be watched
//! - [`Action`]: callables invoked by `click` bindings
//! - [`Bindable`]: typed structs that convert into objects

pub mod bindable;
pub mod object;
pub mod value;

pub use bindable::Bindable;
pub use object::{Object, ObserverId, PathObserver};
pub use value::{Action, Value};
