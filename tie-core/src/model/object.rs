//! Observed key/value containers.
//!
//! Every slot of an [`Object`] can carry a watch: an observer plus the dotted
//! path under which the slot was reached. [`Object::get`] returns the stored
//! value untouched; [`Object::set`] stores a differing value and then tells
//! the observer that the path changed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::value::Value;
use crate::error::Result;

/// Identity of an observer, used to tell engines apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Receives change notifications from watched slots.
pub trait PathObserver {
    fn observer_id(&self) -> ObserverId;

    /// Called after the slot at `path` took a new value.
    fn path_changed(&self, path: &str) -> Result<()>;
}

struct Watch {
    observer: Weak<dyn PathObserver>,
    owner: ObserverId,
    path: String,
}

struct Slot {
    value: Value,
    watch: Option<Watch>,
}

#[derive(Default)]
struct ObjectData {
    slots: IndexMap<String, Slot>,
    observed_by: Option<ObserverId>,
}

/// A shared, mutable, insertion-ordered object.
///
/// Cloning the handle aliases the same container.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Store a value without notifying anyone. An existing watch is kept.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut data = self.0.borrow_mut();
        match data.slots.get_mut(&key) {
            Some(slot) => slot.value = value,
            None => {
                data.slots.insert(key, Slot { value, watch: None });
            }
        }
    }

    /// Current value of `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().slots.get(key).map(|slot| slot.value.clone())
    }

    /// Assign `key`, notifying the slot's observer if the value changed.
    ///
    /// A key that did not exist is added unobserved. The observer runs after
    /// the object is released, so it may read or write this object again.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let notify = {
            let mut data = self.0.borrow_mut();
            match data.slots.get_mut(key) {
                Some(slot) => {
                    if slot.value == value {
                        return Ok(());
                    }
                    slot.value = value;
                    slot.watch
                        .as_ref()
                        .map(|w| (w.observer.clone(), w.path.clone()))
                }
                None => {
                    data.slots.insert(key.to_string(), Slot { value, watch: None });
                    None
                }
            }
        };

        if let Some((observer, path)) = notify {
            // A dropped engine leaves stale watches behind; they are inert.
            if let Some(observer) = observer.upgrade() {
                observer.path_changed(&path)?;
            }
        }
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().slots.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().slots.keys().cloned().collect()
    }

    /// Key/value pairs in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .slots
            .iter()
            .map(|(k, slot)| (k.clone(), slot.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().slots.is_empty()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `key` currently notifies an observer when written.
    pub fn is_watched(&self, key: &str) -> bool {
        self.0
            .borrow()
            .slots
            .get(key)
            .map(|slot| slot.watch.is_some())
            .unwrap_or(false)
    }

    /// Path a watched slot reports, if any.
    pub fn watched_path(&self, key: &str) -> Option<String> {
        self.0
            .borrow()
            .slots
            .get(key)
            .and_then(|slot| slot.watch.as_ref().map(|w| w.path.clone()))
    }

    /// Engine currently observing this object.
    pub fn observed_by(&self) -> Option<ObserverId> {
        self.0.borrow().observed_by
    }

    /// Parse a JSON object document into a fresh tree.
    ///
    /// Arrays become objects keyed by index.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self::from(map))
    }

    /// Snapshot as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries()
            .into_iter()
            .map(|(k, v)| (k, v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    /// Whether any slot still reports to an observer that is alive.
    pub(crate) fn has_live_observer(&self) -> bool {
        self.0
            .borrow()
            .slots
            .values()
            .filter_map(|slot| slot.watch.as_ref())
            .any(|w| w.observer.strong_count() > 0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn mark_observed(&self, owner: Option<ObserverId>) {
        self.0.borrow_mut().observed_by = owner;
    }

    pub(crate) fn watch(&self, key: &str, observer: Weak<dyn PathObserver>, owner: ObserverId, path: String) {
        if let Some(slot) = self.0.borrow_mut().slots.get_mut(key) {
            slot.watch = Some(Watch {
                observer,
                owner,
                path,
            });
        }
    }

    /// Drop every watch installed by `owner`.
    pub(crate) fn unwatch(&self, owner: ObserverId) {
        let mut data = self.0.borrow_mut();
        for slot in data.slots.values_mut() {
            if slot.watch.as_ref().map(|w| w.owner) == Some(owner) {
                slot.watch = None;
            }
        }
        if data.observed_by == Some(owner) {
            data.observed_by = None;
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Object {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let object = Object::new();
        for (key, value) in map {
            object.insert(key, value);
        }
        object
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

/// Shallow: nested objects are not followed, the graph may be cyclic.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(data) => f
                .debug_struct("Object")
                .field("keys", &data.slots.keys().collect::<Vec<_>>())
                .field("observed_by", &data.observed_by)
                .finish(),
            Err(_) => f.write_str("Object { <borrowed> }"),
        }
    }
}
