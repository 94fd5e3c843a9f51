//! # tie-core
//!
//! Two-way binding between plain data objects and document elements.
//!
//! Elements declare what they show in an attribute (`data-tie` by default):
//!
//! ```text
//! <input data-tie="value: user.name">
//! <span  data-tie="text: user.name, html: user.bio">
//! <button data-tie="click: actions.save">
//! ```
//!
//! A [`Tie`] scans the subtree for declarations, watches every slot of the
//! data object, and keeps the two in sync: writing `user.name` re-renders
//! both elements above, typing into the input writes `user.name`, and
//! clicking the button calls the action stored at `actions.save`.
//!
//! ## Core Components
//!
//! - **Model**: [`Object`], [`Value`] and [`Action`], the observed data tree
//! - **Host**: the [`Host`] trait the engine renders through, plus
//!   [`MemoryDocument`]
//! - **Binder**: declaration parsing and the [`BindingIndex`]
//! - **Engine**: [`Tie`], propagation in both directions
//!
//! ## Example
//!
//! ```rust,ignore
//! use tie_core::{MemoryDocument, Object, Tie};
//!
//! let doc = MemoryDocument::new();
//! let form = doc.create_element("form");
//! let input = doc.append_bound(form, "input", "data-tie", "value: name");
//! let label = doc.append_bound(form, "span", "data-tie", "text: name");
//!
//! let data = Object::new().with("name", "Ada");
//! let tie = Tie::new(doc.clone(), data.clone(), form)?;
//!
//! doc.type_into(input, "Grace", "keyup")?;
//! assert_eq!(doc.text_content(label), "Grace");
//! ```

// Self-alias for derive macro support within the crate
extern crate self as tie_core;

pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod intercept;
pub mod model;
pub mod path;

// Re-exports for convenience
pub use binder::{BindingIndex, BindingKind, BindingRule, ListenerRegistry, RuleParser};
pub use config::TieConfig;
pub use engine::{BindState, Tie};
pub use error::{Error, Result};
pub use host::{ElementId, Event, EventListener, Host, MemoryDocument};
pub use model::{Action, Bindable, Object, ObserverId, PathObserver, Value};
pub use path::Location;
