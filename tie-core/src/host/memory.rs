//! In-memory document host.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use super::{ElementId, Event, EventListener, Host};
use crate::error::Result;

#[derive(Default)]
struct ElementData {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: IndexMap<String, String>,
    text: String,
    html: String,
    value: String,
    listeners: IndexMap<String, Vec<EventListener>>,
}

#[derive(Default)]
struct Tree {
    elements: Vec<ElementData>,
}

impl Tree {
    fn get(&self, id: ElementId) -> Option<&ElementData> {
        let element = self.elements.get(id.0);
        if element.is_none() {
            warn!("Unknown element {}", id);
        }
        element
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        let element = self.elements.get_mut(id.0);
        if element.is_none() {
            warn!("Unknown element {}", id);
        }
        element
    }
}

/// A shared in-memory element tree.
///
/// Cloning the handle shares the same tree, so a test can keep one clone while
/// the engine owns another.
#[derive(Clone, Default)]
pub struct MemoryDocument {
    tree: Rc<RefCell<Tree>>,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("elements", &self.tree.borrow().elements.len())
            .finish()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> ElementId {
        let mut tree = self.tree.borrow_mut();
        let id = ElementId(tree.elements.len());
        tree.elements.push(ElementData {
            tag: tag.into(),
            ..ElementData::default()
        });
        id
    }

    /// Create an element with a declaration attribute and append it to `parent`.
    pub fn append_bound(&self, parent: ElementId, tag: &str, attribute: &str, rules: &str) -> ElementId {
        let child = self.create_element(tag);
        self.set_attribute(child, attribute, rules);
        self.append_child(parent, child);
        child
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&self, parent: ElementId, child: ElementId) {
        self.detach(child);
        let mut tree = self.tree.borrow_mut();
        if tree.get(parent).is_none() {
            return;
        }
        if let Some(node) = tree.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = tree.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detach every child of `parent`, as a re-render would.
    ///
    /// Detached elements keep their attributes and listeners.
    pub fn remove_children(&self, parent: ElementId) {
        let mut tree = self.tree.borrow_mut();
        let children = match tree.get_mut(parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if let Some(node) = tree.get_mut(child) {
                node.parent = None;
            }
        }
    }

    fn detach(&self, child: ElementId) {
        let mut tree = self.tree.borrow_mut();
        let parent = match tree.get(child) {
            Some(node) => node.parent,
            None => return,
        };
        if let Some(parent) = parent {
            if let Some(node) = tree.get_mut(parent) {
                node.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = tree.get_mut(child) {
            node.parent = None;
        }
    }

    pub fn tag(&self, element: ElementId) -> Option<String> {
        self.tree.borrow().get(element).map(|n| n.tag.clone())
    }

    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.tree
            .borrow()
            .get(element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn text_content(&self, element: ElementId) -> String {
        self.tree
            .borrow()
            .get(element)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn inner_html(&self, element: ElementId) -> String {
        self.tree
            .borrow()
            .get(element)
            .map(|n| n.html.clone())
            .unwrap_or_default()
    }

    /// Number of listeners subscribed on `element` for `event_type`.
    pub fn listener_count(&self, element: ElementId, event_type: &str) -> usize {
        self.tree
            .borrow()
            .get(element)
            .and_then(|n| n.listeners.get(event_type))
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Fire `event_type` on `element`, invoking each listener once.
    ///
    /// Listeners run after the tree borrow is released so they may mutate the
    /// document. The first listener error is returned.
    pub fn dispatch_event(&self, element: ElementId, event_type: &str) -> Result<()> {
        let listeners: Vec<EventListener> = self
            .tree
            .borrow()
            .get(element)
            .and_then(|n| n.listeners.get(event_type))
            .cloned()
            .unwrap_or_default();

        let event = Event::new(event_type, element);
        for listener in listeners {
            listener(&event)?;
        }
        Ok(())
    }

    /// Set the element's value and fire `event_type`, like a user typing.
    pub fn type_into(&self, element: ElementId, value: &str, event_type: &str) -> Result<()> {
        self.set_value(element, value);
        self.dispatch_event(element, event_type)
    }

    fn collect_descendants(tree: &Tree, root: ElementId, attribute: &str, out: &mut Vec<ElementId>) {
        let Some(node) = tree.get(root) else {
            return;
        };
        for child in &node.children {
            if let Some(data) = tree.elements.get(child.0) {
                if data.attributes.contains_key(attribute) {
                    out.push(*child);
                }
            }
            Self::collect_descendants(tree, *child, attribute, out);
        }
    }
}

impl Host for MemoryDocument {
    fn query_selector_all(&self, root: ElementId, attribute: &str) -> Vec<ElementId> {
        let tree = self.tree.borrow();
        let mut found = Vec::new();
        Self::collect_descendants(&tree, root, attribute, &mut found);
        found
    }

    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .get(element)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.tree.borrow_mut().get_mut(element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn set_text_content(&self, element: ElementId, text: &str) {
        if let Some(node) = self.tree.borrow_mut().get_mut(element) {
            node.text = text.to_string();
        }
    }

    fn set_inner_html(&self, element: ElementId, html: &str) {
        if let Some(node) = self.tree.borrow_mut().get_mut(element) {
            node.html = html.to_string();
        }
    }

    fn value(&self, element: ElementId) -> String {
        self.tree
            .borrow()
            .get(element)
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, element: ElementId, value: &str) {
        if let Some(node) = self.tree.borrow_mut().get_mut(element) {
            node.value = value.to_string();
        }
    }

    fn add_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener) {
        if let Some(node) = self.tree.borrow_mut().get_mut(element) {
            let list = node.listeners.entry(event_type.to_string()).or_default();
            if !list.iter().any(|l| Rc::ptr_eq(l, listener)) {
                list.push(Rc::clone(listener));
            }
        }
    }

    fn remove_event_listener(&self, element: ElementId, event_type: &str, listener: &EventListener) {
        if let Some(node) = self.tree.borrow_mut().get_mut(element) {
            if let Some(list) = node.listeners.get_mut(event_type) {
                list.retain(|l| !Rc::ptr_eq(l, listener));
            }
        }
    }
}
