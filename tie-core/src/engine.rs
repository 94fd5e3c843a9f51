//! The synchronization engine.
//!
//! [`Tie`] owns the data object, the binding index and the listener registry
//! for one element subtree. Property writes on the data object push values to
//! bound elements; change and click events on bound elements push back into
//! the data object or invoke actions.
//!
//! ## Lifecycle
//!
//! ```text
//! new ──► wrap data ──► clear listeners ──► bind ──► refresh ──► Bound
//!                                            ▲
//!          set_root_element / rebind ────────┘
//!          set_data: re-wrap + refresh only
//! ```
//!
//! Dropping a `Tie` leaves subscriptions on the host; call
//! [`Tie::clear_listeners`] first when the elements outlive the engine.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::binder::{self, BindingIndex, BindingKind, ListenerRegistry};
use crate::config::TieConfig;
use crate::error::{Error, Result};
use crate::host::{ElementId, Event, EventListener, Host};
use crate::intercept;
use crate::model::{Object, ObserverId, PathObserver, Value};
use crate::path;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Whether the engine currently holds a binding index for its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindState {
    /// No successful scan yet, or the last scan failed.
    Unbound,
    /// The index reflects the last scan of the root.
    Bound,
}

/// Decrements the propagation depth when dropped.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

struct Engine<H: Host> {
    id: ObserverId,
    host: H,
    config: TieConfig,
    data: RefCell<Object>,
    root: Cell<ElementId>,
    state: Cell<BindState>,
    bindings: RefCell<BindingIndex>,
    listeners: RefCell<ListenerRegistry>,
    /// The single handler subscribed on every listened element.
    listener: EventListener,
    depth: Cell<usize>,
}

impl<H: Host + 'static> Engine<H> {
    fn observer(self: &Rc<Self>) -> Weak<dyn PathObserver> {
        Rc::downgrade(self) as Weak<dyn PathObserver>
    }

    fn enter(&self, path: &str) -> Result<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.config.max_update_depth {
            return Err(Error::update_depth_exceeded(path, self.config.max_update_depth));
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard { depth: &self.depth })
    }

    fn install_data(self: &Rc<Self>, data: Object) -> Result<()> {
        intercept::ensure_available(&data, self.id)?;
        let previous = self.data.replace(data.clone());
        intercept::unwrap(&previous, self.id);
        let count = intercept::wrap(&data, &self.observer(), self.id)?;
        debug!("Wrapped {} properties", count);
        Ok(())
    }

    fn bind(&self) -> Result<()> {
        match binder::bind(&self.host, self.root.get(), &self.config) {
            Ok(index) => {
                *self.bindings.borrow_mut() = index;
                self.state.set(BindState::Bound);
                Ok(())
            }
            Err(e) => {
                self.bindings.borrow_mut().clear();
                self.state.set(BindState::Unbound);
                Err(e)
            }
        }
    }

    fn rebind(&self) -> Result<()> {
        self.clear_listeners();
        self.bind()?;
        self.refresh()
    }

    fn clear_listeners(&self) {
        let drained = self.listeners.borrow_mut().drain();
        let mut count = 0;
        for (event_type, elements) in drained {
            for element in elements {
                self.host
                    .remove_event_listener(element, &event_type, &self.listener);
                count += 1;
            }
        }
        debug!("Cleared {} listeners", count);
    }

    fn refresh(&self) -> Result<()> {
        debug!("Refreshing all bindings");
        let paths: Vec<String> = self.bindings.borrow().paths().map(String::from).collect();
        for path in paths {
            self.update_path(&path)?;
        }
        Ok(())
    }

    fn get_value(&self, path: &str) -> Result<Value> {
        let data = self.data.borrow().clone();
        Ok(path::resolve(&data, path)?.get().unwrap_or_default())
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        trace!("Updating value of '{}'", path);
        let data = self.data.borrow().clone();
        path::resolve(&data, path)?.set(value)
    }

    fn update_path(&self, path: &str) -> Result<()> {
        let bindings = self.bindings.borrow().bindings_for(path);
        if bindings.is_empty() {
            return Ok(());
        }

        let _guard = self.enter(path)?;
        trace!("Updating elements bound to '{}'", path);
        let value = self.get_value(path)?;
        for (kind, elements) in bindings {
            for element in elements {
                self.update_element_from_path(element, path, &kind, &value)?;
            }
        }
        Ok(())
    }

    fn update_element_from_path(
        &self,
        element: ElementId,
        path: &str,
        kind: &BindingKind,
        value: &Value,
    ) -> Result<()> {
        match kind {
            BindingKind::Text => self.host.set_text_content(element, &value.to_string()),
            BindingKind::Html => self.host.set_inner_html(element, &value.to_string()),
            BindingKind::Value => {
                self.host.set_value(element, &value.to_string());
                self.listen(element, path, &self.config.change_events);
            }
            BindingKind::Click => self.listen(element, path, &self.config.click_events),
            BindingKind::Other(kind) => return Err(Error::unsupported_kind(path, kind.as_str())),
        }
        Ok(())
    }

    fn listen(&self, element: ElementId, path: &str, events: &[String]) {
        for event_type in events {
            self.host
                .add_event_listener(element, event_type, &self.listener);
            if self.listeners.borrow_mut().register(event_type, element) {
                trace!("Listening to '{}' on {} for '{}'", event_type, element, path);
            }
            self.host
                .set_attribute(element, &self.config.event_attribute(event_type), path);
        }
    }

    fn on_event(&self, event: &Event) -> Result<()> {
        let event_type = event.event_type.as_str();
        let is_change = self.config.is_change_event(event_type);
        if !is_change && !self.config.is_click_event(event_type) {
            trace!("Ignoring '{}' event on {}", event_type, event.target);
            return Ok(());
        }

        let path = self
            .host
            .get_attribute(event.target, &self.config.event_attribute(event_type))
            .ok_or_else(|| Error::UnboundEvent {
                event_type: event_type.to_string(),
                element: event.target,
            })?;
        trace!("Got '{}' event for '{}'", event_type, path);

        let _guard = self.enter(&path)?;
        if is_change {
            let value = self.host.value(event.target);
            self.set_value(&path, Value::String(value))
        } else {
            self.on_click(&path, event)
        }
    }

    fn on_click(&self, path: &str, event: &Event) -> Result<()> {
        trace!("Relaying click to '{}'", path);
        match self.get_value(path)? {
            Value::Action(action) => action.call(event),
            _ => Err(Error::NotAnAction {
                path: path.to_string(),
            }),
        }
    }
}

impl<H: Host + 'static> PathObserver for Engine<H> {
    fn observer_id(&self) -> ObserverId {
        self.id
    }

    fn path_changed(&self, path: &str) -> Result<()> {
        self.update_path(path)
    }
}

/// Two-way binding between a data object and an element subtree.
pub struct Tie<H: Host + 'static> {
    inner: Rc<Engine<H>>,
}

impl<H: Host + 'static> Tie<H> {
    /// Bind `data` to the subtree under `root` with the default configuration.
    ///
    /// The data object is modified in place: every slot reachable from it is
    /// watched by this engine.
    pub fn new(host: H, data: impl Into<Object>, root: ElementId) -> Result<Self> {
        Self::with_config(host, TieConfig::default(), data, root)
    }

    /// Bind with a custom configuration.
    pub fn with_config(host: H, config: TieConfig, data: impl Into<Object>, root: ElementId) -> Result<Self> {
        config.validate()?;
        let id = ObserverId(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed));
        let listeners = ListenerRegistry::new(config.event_types());

        let inner = Rc::new_cyclic(|weak: &Weak<Engine<H>>| {
            let engine = weak.clone();
            let listener: EventListener = Rc::new(move |event: &Event| match engine.upgrade() {
                Some(engine) => engine.on_event(event),
                None => Err(Error::Detached),
            });
            Engine {
                id,
                host,
                config,
                data: RefCell::new(Object::new()),
                root: Cell::new(root),
                state: Cell::new(BindState::Unbound),
                bindings: RefCell::new(BindingIndex::new()),
                listeners: RefCell::new(listeners),
                listener,
                depth: Cell::new(0),
            }
        });

        debug!("Creating engine {:?} on {}", id, root);
        if let Err(e) = inner.install_data(data.into()).and_then(|_| inner.rebind()) {
            // nobody can clear these once the engine is gone
            inner.clear_listeners();
            let data = inner.data.borrow().clone();
            intercept::unwrap(&data, id);
            return Err(e);
        }
        Ok(Self { inner })
    }

    /// Replace the data object and refresh every bound path against it.
    ///
    /// The element index is kept; declarations are not re-scanned. The
    /// previous object stops reporting writes to this engine.
    pub fn set_data(&self, data: impl Into<Object>) -> Result<()> {
        debug!("Setting data");
        self.inner.install_data(data.into())?;
        self.inner.refresh()
    }

    /// Switch to a new root element, re-scan it and refresh.
    pub fn set_root_element(&self, root: ElementId) -> Result<()> {
        debug!("Setting root element {}", root);
        self.inner.clear_listeners();
        self.inner.root.set(root);
        self.inner.bind()?;
        self.inner.refresh()
    }

    /// Re-scan the current root, e.g. after its children were re-rendered.
    pub fn rebind(&self) -> Result<()> {
        self.inner.rebind()
    }

    /// Push every bound path's current value to its elements.
    pub fn refresh(&self) -> Result<()> {
        self.inner.refresh()
    }

    /// Unsubscribe from every listened element and forget the subscriptions.
    pub fn clear_listeners(&self) {
        self.inner.clear_listeners()
    }

    /// Push one path's current value to its elements.
    pub fn update_path(&self, path: &str) -> Result<()> {
        self.inner.update_path(path)
    }

    /// Handle an event as if the host had dispatched it to this engine.
    pub fn on_event(&self, event: &Event) -> Result<()> {
        self.inner.on_event(event)
    }

    /// Read the value at `path`; a missing final key reads as `Null`.
    pub fn get_value(&self, path: &str) -> Result<Value> {
        self.inner.get_value(path)
    }

    /// Write through the data object's observed setter.
    pub fn set_value(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.inner.set_value(path, value.into())
    }

    /// Handle to the bound data object.
    pub fn data(&self) -> Object {
        self.inner.data.borrow().clone()
    }

    pub fn root(&self) -> ElementId {
        self.inner.root.get()
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn config(&self) -> &TieConfig {
        &self.inner.config
    }

    pub fn state(&self) -> BindState {
        self.inner.state.get()
    }

    /// Bound paths in discovery order.
    pub fn bound_paths(&self) -> Vec<String> {
        self.inner
            .bindings
            .borrow()
            .paths()
            .map(String::from)
            .collect()
    }

    pub fn bindings_for(&self, path: &str) -> Vec<(BindingKind, Vec<ElementId>)> {
        self.inner.bindings.borrow().bindings_for(path)
    }

    /// Elements currently subscribed for `event_type`.
    pub fn listened_elements(&self, event_type: &str) -> Vec<ElementId> {
        self.inner.listeners.borrow().elements(event_type)
    }

    /// Total number of recorded subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<H: Host + 'static> std::fmt::Debug for Tie<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tie")
            .field("id", &self.inner.id)
            .field("root", &self.inner.root.get())
            .field("state", &self.inner.state.get())
            .field("paths", &self.bound_paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDocument;
    use crate::model::Action;
    use pretty_assertions::assert_eq;

    const ATTR: &str = "data-tie";

    fn form() -> (MemoryDocument, ElementId) {
        let doc = MemoryDocument::new();
        let root = doc.create_element("form");
        (doc, root)
    }

    #[test]
    fn test_scenario_type_into_input() {
        let (doc, root) = form();
        let input = doc.append_bound(root, "input", ATTR, "value: name");
        let span = doc.append_bound(root, "span", ATTR, "text: name");
        let data = Object::new().with("name", "X");

        let tie = Tie::new(doc.clone(), data.clone(), root).unwrap();
        assert_eq!(tie.state(), BindState::Bound);
        assert_eq!(doc.text_content(span), "X");
        assert_eq!(doc.value(input), "X");

        doc.type_into(input, "Y", "keyup").unwrap();
        assert_eq!(doc.text_content(span), "Y");
        assert_eq!(data.get("name").unwrap().as_str(), Some("Y"));
    }

    #[test]
    fn test_write_propagates_to_path_only() {
        let (doc, root) = form();
        let title = doc.append_bound(root, "h1", ATTR, "text: title");
        let body = doc.append_bound(root, "div", ATTR, "html: title");
        let other = doc.append_bound(root, "span", ATTR, "text: subtitle");
        let data = Object::new().with("title", "a").with("subtitle", "b");
        let _tie = Tie::new(doc.clone(), data.clone(), root).unwrap();

        doc.set_text_content(other, "untouched");
        data.set("title", "<b>new</b>").unwrap();

        assert_eq!(doc.text_content(title), "<b>new</b>");
        assert_eq!(doc.inner_html(body), "<b>new</b>");
        assert_eq!(doc.text_content(other), "untouched");
    }

    #[test]
    fn test_equal_write_is_noop() {
        let (doc, root) = form();
        let input = doc.append_bound(root, "input", ATTR, "value: n");
        let span = doc.append_bound(root, "span", ATTR, "text: n");
        let data = Object::new().with("n", 5);
        let tie = Tie::new(doc.clone(), data.clone(), root).unwrap();
        let before = tie.listener_count();

        doc.set_text_content(span, "tampered");
        data.set("n", 5).unwrap();
        assert_eq!(doc.text_content(span), "tampered");
        assert_eq!(tie.listener_count(), before);

        // the typed string differs from the number, so it is written
        doc.type_into(input, "5", "change").unwrap();
        assert_eq!(doc.text_content(span), "5");
        assert_eq!(data.get("n").unwrap().as_str(), Some("5"));
    }

    #[test]
    fn test_change_event_round_trip() {
        let (doc, root) = form();
        let first = doc.append_bound(root, "input", ATTR, "value: user.name");
        let second = doc.append_bound(root, "input", ATTR, "value: user.name");
        let label = doc.append_bound(root, "span", ATTR, "text: user.name");
        let data = Object::new().with("user", Object::new().with("name", "Grace"));
        let tie = Tie::new(doc.clone(), data, root).unwrap();

        doc.type_into(first, "Ada", "change").unwrap();

        assert_eq!(tie.get_value("user.name").unwrap().as_str(), Some("Ada"));
        assert_eq!(doc.value(second), "Ada");
        assert_eq!(doc.value(first), "Ada");
        assert_eq!(doc.text_content(label), "Ada");
    }

    #[test]
    fn test_click_invokes_action_with_event() {
        let (doc, root) = form();
        let button = doc.append_bound(root, "button", ATTR, "click: actions.save");
        let span = doc.append_bound(root, "span", ATTR, "text: status");

        let seen: Rc<RefCell<Vec<Event>>> = Rc::default();
        let record = Rc::clone(&seen);
        let data = Object::new()
            .with("status", "idle")
            .with(
                "actions",
                Object::new().with(
                    "save",
                    Action::new(move |event| {
                        record.borrow_mut().push(event.clone());
                        Ok(())
                    }),
                ),
            );
        let _tie = Tie::new(doc.clone(), data.clone(), root).unwrap();

        assert_eq!(
            doc.get_attribute(button, "data-tie-on-click").as_deref(),
            Some("actions.save")
        );

        doc.dispatch_event(button, "click").unwrap();
        assert_eq!(*seen.borrow(), vec![Event::new("click", button)]);
        assert_eq!(data.get("status").unwrap().as_str(), Some("idle"));
        assert_eq!(doc.text_content(span), "idle");
    }

    #[test]
    fn test_action_writes_propagate_synchronously() {
        let (doc, root) = form();
        let button = doc.append_bound(root, "button", ATTR, "click: increment");
        let span = doc.append_bound(root, "span", ATTR, "text: count");

        let data = Object::new().with("count", 0);
        let target = data.clone();
        data.insert(
            "increment",
            Action::new(move |_| {
                let next = target.get("count").and_then(|v| v.as_f64()).unwrap_or(0.0) + 1.0;
                target.set("count", next)
            }),
        );
        let _tie = Tie::new(doc.clone(), data.clone(), root).unwrap();

        doc.dispatch_event(button, "click").unwrap();
        doc.dispatch_event(button, "click").unwrap();
        assert_eq!(doc.text_content(span), "2");

        // break the data -> action -> data cycle
        data.insert("increment", Value::Null);
    }

    #[test]
    fn test_rebind_keeps_single_subscription() {
        let (doc, root) = form();
        let button = doc.append_bound(root, "button", ATTR, "click: hit");
        let input = doc.append_bound(root, "input", ATTR, "value: text");

        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let data = Object::new().with("text", "").with(
            "hit",
            Action::new(move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            }),
        );
        let tie = Tie::new(doc.clone(), data, root).unwrap();

        for _ in 0..5 {
            tie.clear_listeners();
            tie.rebind().unwrap();
            tie.refresh().unwrap();
        }

        assert_eq!(doc.listener_count(button, "click"), 1);
        assert_eq!(doc.listener_count(input, "change"), 1);
        assert_eq!(doc.listener_count(input, "keyup"), 1);
        assert_eq!(tie.listened_elements("click"), vec![button]);
        assert_eq!(tie.listener_count(), 3);

        doc.dispatch_event(button, "click").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_clear_listeners_unsubscribes() {
        let (doc, root) = form();
        let input = doc.append_bound(root, "input", ATTR, "value: text");
        let data = Object::new().with("text", "a");
        let tie = Tie::new(doc.clone(), data.clone(), root).unwrap();

        tie.clear_listeners();
        assert_eq!(doc.listener_count(input, "change"), 0);
        assert_eq!(tie.listener_count(), 0);

        doc.type_into(input, "b", "change").unwrap();
        assert_eq!(data.get("text").unwrap().as_str(), Some("a"));

        // data writes still reach elements and re-register value listeners
        data.set("text", "c").unwrap();
        assert_eq!(doc.value(input), "c");
        assert_eq!(doc.listener_count(input, "change"), 1);
    }

    #[test]
    fn test_stamped_event_attributes() {
        let (doc, root) = form();
        let input = doc.append_bound(root, "input", ATTR, "value: form.email");
        let span = doc.append_bound(root, "span", ATTR, "text: form.email");
        let data = Object::new().with("form", Object::new().with("email", "a@b.c"));
        let _tie = Tie::new(doc.clone(), data, root).unwrap();

        assert_eq!(doc.get_attribute(input, "data-tie-on-change").as_deref(), Some("form.email"));
        assert_eq!(doc.get_attribute(input, "data-tie-on-keyup").as_deref(), Some("form.email"));
        assert_eq!(doc.get_attribute(input, "data-tie-on-click"), None);
        assert_eq!(doc.get_attribute(span, "data-tie-on-change"), None);
    }

    #[test]
    fn test_unsupported_kind_fails() {
        let (doc, root) = form();
        doc.append_bound(root, "span", ATTR, "foo: path.x");
        let data = Object::new().with("path", Object::new().with("x", 1));

        let err = Tie::new(doc, data, root).unwrap_err();
        match err {
            Error::UnsupportedKind { path, kind } => {
                assert_eq!(path, "path.x");
                assert_eq!(kind, "foo");
            }
            other => panic!("Expected UnsupportedKind, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_construction_releases_listeners() {
        let (doc, root) = form();
        let input = doc.append_bound(root, "input", ATTR, "value: v");
        doc.append_bound(root, "span", ATTR, "foo: w");
        let data = Object::new().with("v", "a").with("w", 1);

        let err = Tie::new(doc.clone(), data.clone(), root).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind { ref kind, .. } if kind == "foo"));
        assert_eq!(doc.listener_count(input, "change"), 0);
        assert_eq!(doc.listener_count(input, "keyup"), 0);
        assert!(doc.type_into(input, "b", "change").is_ok());
        assert_eq!(data.observed_by(), None);
        assert!(!data.is_watched("v"));
    }

    #[test]
    fn test_nested_rewrap_paths() {
        let (doc, root) = form();
        let whole = doc.append_bound(root, "span", ATTR, "text: a");
        let leaf = doc.append_bound(root, "span", ATTR, "text: a.b");
        let inner = Object::new().with("b", 1);
        let data = Object::new().with("a", inner.clone());
        let _tie = Tie::new(doc.clone(), data.clone(), root).unwrap();
        assert_eq!(doc.text_content(leaf), "1");

        doc.set_text_content(whole, "untouched");
        inner.set("b", 2).unwrap();
        assert_eq!(doc.text_content(leaf), "2");
        assert_eq!(doc.text_content(whole), "untouched");

        doc.set_text_content(leaf, "untouched");
        let replacement = Object::new().with("b", 3);
        data.set("a", replacement.clone()).unwrap();
        assert_eq!(doc.text_content(whole), "[object Object]");
        assert_eq!(doc.text_content(leaf), "untouched");
        assert!(!replacement.is_watched("b"));

        replacement.set("b", 4).unwrap();
        assert_eq!(doc.text_content(leaf), "untouched");
    }

    /// Host that records every element write before delegating.
    #[derive(Clone, Default)]
    struct RecordingHost {
        doc: MemoryDocument,
        writes: Rc<RefCell<Vec<(&'static str, ElementId, String)>>>,
    }

    impl RecordingHost {
        fn record(&self, op: &'static str, element: ElementId, value: &str) {
            self.writes.borrow_mut().push((op, element, value.to_string()));
        }
    }

    impl Host for RecordingHost {
        fn query_selector_all(&self, root: ElementId, attribute: &str) -> Vec<ElementId> {
            self.doc.query_selector_all(root, attribute)
        }

        fn get_attribute(&self, element: ElementId, name: &str) -> Option<String> {
            self.doc.get_attribute(element, name)
        }

        fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
            self.doc.set_attribute(element, name, value)
        }

        fn set_text_content(&self, element: ElementId, text: &str) {
            self.record("text", element, text);
            self.doc.set_text_content(element, text)
        }

        fn set_inner_html(&self, element: ElementId, html: &str) {
            self.record("html", element, html);
            self.doc.set_inner_html(element, html)
        }

        fn value(&self, element: ElementId) -> String {
            self.doc.value(element)
        }

        fn set_value(&self, element: ElementId, value: &str) {
            self.record("value", element, value);
            self.doc.set_value(element, value)
        }

        fn add_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener) {
            self.doc.add_event_listener(element, event_type, listener)
        }

        fn remove_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener) {
            self.doc.remove_event_listener(element, event_type, listener)
        }
    }

    #[test]
    fn test_update_order_follows_scan_order() {
        let host = RecordingHost::default();
        let root = host.doc.create_element("form");
        let a = host.doc.append_bound(root, "span", ATTR, "text: v");
        let b = host.doc.append_bound(root, "input", ATTR, "value: v");
        let c = host.doc.append_bound(root, "span", ATTR, "text: v, html: v");
        let data = Object::new().with("v", 1);
        let tie = Tie::new(host.clone(), data.clone(), root).unwrap();

        assert_eq!(
            tie.bindings_for("v"),
            vec![
                (BindingKind::Text, vec![a, c]),
                (BindingKind::Value, vec![b]),
                (BindingKind::Html, vec![c]),
            ]
        );

        host.writes.borrow_mut().clear();
        data.set("v", 2).unwrap();
        assert_eq!(
            *host.writes.borrow(),
            vec![
                ("text", a, "2".to_string()),
                ("text", c, "2".to_string()),
                ("value", b, "2".to_string()),
                ("html", c, "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_data_refreshes_without_rescan() {
        let (doc, root) = form();
        let span = doc.append_bound(root, "span", ATTR, "text: name");
        let old = Object::new().with("name", "old");
        let tie = Tie::new(doc.clone(), old.clone(), root).unwrap();

        let late = doc.append_bound(root, "span", ATTR, "text: name");
        let new = Object::new().with("name", "new");
        tie.set_data(new.clone()).unwrap();

        assert_eq!(doc.text_content(span), "new");
        assert_eq!(doc.text_content(late), "");
        assert!(tie.data().ptr_eq(&new));

        old.set("name", "stale").unwrap();
        assert_eq!(doc.text_content(span), "new");
        assert!(!old.is_watched("name"));

        new.set("name", "newer").unwrap();
        assert_eq!(doc.text_content(span), "newer");
    }

    #[test]
    fn test_set_root_element_moves_bindings() {
        let doc = MemoryDocument::new();
        let first = doc.create_element("form");
        let second = doc.create_element("form");
        let old_input = doc.append_bound(first, "input", ATTR, "value: q");
        let new_span = doc.append_bound(second, "span", ATTR, "text: q");
        let data = Object::new().with("q", "hello");
        let tie = Tie::new(doc.clone(), data.clone(), first).unwrap();
        assert_eq!(doc.listener_count(old_input, "keyup"), 1);

        tie.set_root_element(second).unwrap();
        assert_eq!(tie.root(), second);
        assert_eq!(doc.listener_count(old_input, "keyup"), 0);
        assert_eq!(doc.text_content(new_span), "hello");
        assert_eq!(tie.bound_paths(), vec!["q"]);

        data.set("q", "bye").unwrap();
        assert_eq!(doc.text_content(new_span), "bye");
        assert_eq!(doc.value(old_input), "hello");
    }

    #[test]
    fn test_rebind_after_rerender() {
        let (doc, root) = form();
        let old = doc.append_bound(root, "input", ATTR, "value: v");
        let data = Object::new().with("v", "x");
        let tie = Tie::new(doc.clone(), data, root).unwrap();

        doc.remove_children(root);
        let fresh = doc.append_bound(root, "input", ATTR, "value: v");
        tie.rebind().unwrap();

        assert_eq!(doc.value(fresh), "x");
        assert_eq!(doc.listener_count(old, "change"), 0);
        assert_eq!(tie.listened_elements("change"), vec![fresh]);
    }

    #[test]
    fn test_malformed_rule_on_rebind_unbinds() {
        let (doc, root) = form();
        doc.append_bound(root, "span", ATTR, "text: v");
        let tie = Tie::new(doc.clone(), Object::new().with("v", 1), root).unwrap();

        let bad = doc.append_bound(root, "span", ATTR, "text v");
        let err = tie.rebind().unwrap_err();
        assert!(matches!(err, Error::MalformedRule { element, .. } if element == bad));
        assert_eq!(tie.state(), BindState::Unbound);
        assert!(tie.bound_paths().is_empty());
    }

    #[test]
    fn test_unresolvable_path_fails_refresh() {
        let (doc, root) = form();
        doc.append_bound(root, "span", ATTR, "text: user.name");
        let err = Tie::new(doc, Object::new().with("user", 3), root).unwrap_err();
        assert!(matches!(err, Error::UnresolvablePath { ref segment, .. } if segment == "user"));
    }

    #[test]
    fn test_missing_leaf_renders_empty() {
        let (doc, root) = form();
        let span = doc.append_bound(root, "span", ATTR, "text: user.nickname");
        let tie = Tie::new(doc.clone(), Object::new().with("user", Object::new()), root).unwrap();
        assert_eq!(doc.text_content(span), "");
        assert!(tie.get_value("user.nickname").unwrap().is_null());
    }

    #[test]
    fn test_data_bound_twice_rejected() {
        let (doc, root) = form();
        let data = Object::new().with("v", 1);
        let _first = Tie::new(doc.clone(), data.clone(), root).unwrap();
        let err = Tie::new(doc, data, root).unwrap_err();
        assert!(matches!(err, Error::AlreadyBound));
    }

    #[test]
    fn test_event_errors() {
        let (doc, root) = form();
        let span = doc.append_bound(root, "span", ATTR, "text: label");
        let fake = doc.append_bound(root, "button", ATTR, "click: label");
        let tie = Tie::new(doc.clone(), Object::new().with("label", "hi"), root).unwrap();

        let err = tie.on_event(&Event::new("change", span)).unwrap_err();
        assert!(matches!(err, Error::UnboundEvent { .. }));

        let err = doc.dispatch_event(fake, "click").unwrap_err();
        assert!(matches!(err, Error::NotAnAction { ref path } if path == "label"));

        assert!(tie.on_event(&Event::new("mouseover", span)).is_ok());
    }

    #[test]
    fn test_dropped_engine_is_detached() {
        let (doc, root) = form();
        let input = doc.append_bound(root, "input", ATTR, "value: v");
        let data = Object::new().with("v", "a");
        let tie = Tie::new(doc.clone(), data.clone(), root).unwrap();
        drop(tie);

        let err = doc.type_into(input, "b", "change").unwrap_err();
        assert!(matches!(err, Error::Detached));
        assert!(data.set("v", "c").is_ok());

        // the orphaned data can be bound again
        let again = Tie::new(doc.clone(), data.clone(), root).unwrap();
        assert_eq!(data.observed_by(), Some(again.inner.id));
        assert_eq!(doc.value(input), "c");
    }

    #[test]
    fn test_runaway_recursion_is_capped() {
        let (doc, root) = form();
        let button = doc.append_bound(root, "button", ATTR, "click: again");
        let span = doc.append_bound(root, "span", ATTR, "text: n");
        let host = doc.clone();
        let data = Object::new().with("n", 0).with(
            "again",
            Action::new(move |event| host.dispatch_event(event.target, "click")),
        );
        let config = TieConfig::default().with_max_update_depth(8);
        let _tie = Tie::with_config(doc.clone(), config, data.clone(), root).unwrap();

        let err = doc.dispatch_event(button, "click").unwrap_err();
        assert!(matches!(err, Error::UpdateDepthExceeded { max_depth: 8, .. }));

        // the depth counter unwinds with the error
        data.set("n", 1).unwrap();
        assert_eq!(doc.text_content(span), "1");
    }

    #[test]
    fn test_custom_config_events() {
        let doc = MemoryDocument::new();
        let root = doc.create_element("div");
        let input = doc.append_bound(root, "input", "x-bind", "value: v");
        let span = doc.append_bound(root, "span", "x-bind", "text: v");
        let config = TieConfig::default()
            .with_attribute("x-bind")
            .with_change_events(["input"]);
        let tie = Tie::with_config(doc.clone(), config, Object::new().with("v", ""), root).unwrap();

        assert_eq!(doc.get_attribute(input, "x-bind-on-input").as_deref(), Some("v"));
        doc.type_into(input, "typed", "input").unwrap();
        assert_eq!(doc.text_content(span), "typed");
        assert_eq!(tie.listened_elements("keyup"), Vec::<ElementId>::new());
    }

    #[test]
    fn test_set_value_api() {
        let (doc, root) = form();
        let span = doc.append_bound(root, "span", ATTR, "text: stats.count");
        let tie = Tie::new(
            doc.clone(),
            Object::new().with("stats", Object::new().with("count", 1)),
            root,
        )
        .unwrap();

        tie.set_value("stats.count", 41).unwrap();
        assert_eq!(doc.text_content(span), "41");
        assert!(tie.set_value("stats.count.deeper", 1).is_err());
    }
}
