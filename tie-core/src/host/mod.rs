//! Host document abstraction.
//!
//! The engine never owns elements. It talks to whatever document the caller
//! renders into through the [`Host`] trait: attribute lookup, text/markup/value
//! writes and event subscription. [`MemoryDocument`] is a complete in-memory
//! host used by the tests and by headless consumers.

pub mod memory;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::MemoryDocument;

/// Opaque handle to an element, issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An event dispatched by the host to a subscribed listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event type, e.g. `change` or `click`.
    pub event_type: String,
    /// Element the event fired on.
    pub target: ElementId,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: ElementId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
        }
    }
}

/// Event callback. Subscription identity is the `Rc` allocation.
pub type EventListener = Rc<dyn Fn(&Event) -> Result<()>>;

/// Document operations the engine relies on.
///
/// Adding a listener that is already subscribed for the same element and
/// event type must be a no-op, so a listener fires at most once per event.
pub trait Host {
    /// Descendants of `root` carrying `attribute`, in document order.
    fn query_selector_all(&self, root: ElementId, attribute: &str) -> Vec<ElementId>;

    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    fn has_attribute(&self, element: ElementId, name: &str) -> bool {
        self.get_attribute(element, name).is_some()
    }

    /// Replace the rendered text of an element.
    fn set_text_content(&self, element: ElementId, text: &str);

    /// Replace the inner markup of an element. No sanitization is applied.
    fn set_inner_html(&self, element: ElementId, html: &str);

    /// Current editable value of a form element.
    fn value(&self, element: ElementId) -> String;

    fn set_value(&self, element: ElementId, value: &str);

    fn add_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener);

    fn remove_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener);
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn query_selector_all(&self, root: ElementId, attribute: &str) -> Vec<ElementId> {
        (**self).query_selector_all(root, attribute)
    }

    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String> {
        (**self).get_attribute(element, name)
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        (**self).set_attribute(element, name, value)
    }

    fn has_attribute(&self, element: ElementId, name: &str) -> bool {
        (**self).has_attribute(element, name)
    }

    fn set_text_content(&self, element: ElementId, text: &str) {
        (**self).set_text_content(element, text)
    }

    fn set_inner_html(&self, element: ElementId, html: &str) {
        (**self).set_inner_html(element, html)
    }

    fn value(&self, element: ElementId) -> String {
        (**self).value(element)
    }

    fn set_value(&self, element: ElementId, value: &str) {
        (**self).set_value(element, value)
    }

    fn add_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener) {
        (**self).add_event_listener(element, event_type, listener)
    }

    fn remove_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener) {
        (**self).remove_event_listener(element, event_type, listener)
    }
}
