//! Binding index and listener registry.

use indexmap::{IndexMap, IndexSet};

use super::rule::BindingKind;
use crate::host::ElementId;

/// Path → kind → elements, in document scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingIndex {
    paths: IndexMap<String, IndexMap<BindingKind, Vec<ElementId>>>,
}

impl BindingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `element` binds `path` as `kind`.
    ///
    /// Returns `false` when the triple was already present.
    pub fn insert(&mut self, path: &str, kind: BindingKind, element: ElementId) -> bool {
        let elements = self
            .paths
            .entry(path.to_string())
            .or_default()
            .entry(kind)
            .or_default();
        if elements.contains(&element) {
            return false;
        }
        elements.push(element);
        true
    }

    /// Bound paths in discovery order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    /// Kinds and elements bound to `path`, cloned so callers can update
    /// elements without holding the index.
    pub fn bindings_for(&self, path: &str) -> Vec<(BindingKind, Vec<ElementId>)> {
        self.paths
            .get(path)
            .map(|kinds| {
                kinds
                    .iter()
                    .map(|(kind, elements)| (kind.clone(), elements.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of (path, kind, element) entries.
    pub fn len(&self) -> usize {
        self.paths
            .values()
            .flat_map(|kinds| kinds.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// Event type → elements this engine subscribed to.
///
/// Every known event type always has an entry, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerRegistry {
    events: IndexMap<String, IndexSet<ElementId>>,
}

impl ListenerRegistry {
    pub fn new<'a>(event_types: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            events: event_types
                .into_iter()
                .map(|e| (e.to_string(), IndexSet::new()))
                .collect(),
        }
    }

    /// Record a subscription. Returns `false` if it was already recorded.
    pub fn register(&mut self, event_type: &str, element: ElementId) -> bool {
        self.events
            .entry(event_type.to_string())
            .or_default()
            .insert(element)
    }

    pub fn elements(&self, event_type: &str) -> Vec<ElementId> {
        self.events
            .get(event_type)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    /// Total number of recorded subscriptions.
    pub fn len(&self) -> usize {
        self.events.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every recorded subscription, leaving empty lists behind.
    pub fn drain(&mut self) -> Vec<(String, Vec<ElementId>)> {
        self.events
            .iter_mut()
            .map(|(event_type, set)| (event_type.clone(), set.drain(..).collect()))
            .collect()
    }
}
