//! Installing and removing write observers on a data tree.
//!
//! [`wrap`] walks an object graph and watches every slot under its composed
//! dotted path, so a later [`Object::set`] anywhere in the graph reports the
//! full path to the observer. Values added or replaced after wrapping are not
//! walked: assigning a fresh object to `a` reports `a`, but writes inside the
//! new object go unobserved until the data is wrapped again.
//!
//! Each object is visited once per walk, so cyclic graphs terminate and an
//! object reachable through several paths reports the first one found.

use std::collections::HashSet;
use std::rc::Weak;

use tracing::trace;

use crate::error::{Error, Result};
use crate::model::{Object, ObserverId, PathObserver, Value};
use crate::path;

/// Fail if any object in the graph is observed by someone other than `owner`.
///
/// Objects left behind by a dropped observer are free to take over.
pub fn ensure_available(root: &Object, owner: ObserverId) -> Result<()> {
    let mut visited = HashSet::new();
    check(root, owner, &mut visited)
}

fn check(object: &Object, owner: ObserverId, visited: &mut HashSet<usize>) -> Result<()> {
    if !visited.insert(object.addr()) {
        return Ok(());
    }
    if let Some(existing) = object.observed_by() {
        if existing != owner && object.has_live_observer() {
            return Err(Error::AlreadyBound);
        }
    }
    for (_, value) in object.entries() {
        if let Value::Object(child) = value {
            check(&child, owner, visited)?;
        }
    }
    Ok(())
}

/// Watch every slot reachable from `root`. Returns the number of slots watched.
///
/// Wrapping a graph this owner already wraps replaces the previous watches;
/// no slot ever carries more than one.
pub fn wrap(root: &Object, observer: &Weak<dyn PathObserver>, owner: ObserverId) -> Result<usize> {
    ensure_available(root, owner)?;
    let mut visited = HashSet::new();
    Ok(install(root, "", observer, owner, &mut visited))
}

fn install(
    object: &Object,
    prefix: &str,
    observer: &Weak<dyn PathObserver>,
    owner: ObserverId,
    visited: &mut HashSet<usize>,
) -> usize {
    if !visited.insert(object.addr()) {
        return 0;
    }
    trace!("Wrapping '{}'", prefix);
    object.mark_observed(Some(owner));

    let mut count = 0;
    for (key, value) in object.entries() {
        let path = path::join(prefix, &key);
        object.watch(&key, observer.clone(), owner, path.clone());
        count += 1;

        if let Value::Object(child) = value {
            count += install(&child, &path, observer, owner, visited);
        }
    }
    count
}

/// Remove every watch `owner` installed in the graph reachable from `root`.
pub fn unwrap(root: &Object, owner: ObserverId) {
    let mut visited = HashSet::new();
    release(root, owner, &mut visited);
}

fn release(object: &Object, owner: ObserverId, visited: &mut HashSet<usize>) {
    if !visited.insert(object.addr()) {
        return;
    }
    object.unwatch(owner);
    for (_, value) in object.entries() {
        if let Value::Object(child) = value {
            release(&child, owner, visited);
        }
    }
}
