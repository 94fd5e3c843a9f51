//! Dotted path resolution.
//!
//! A path like `user.name` resolves to the object holding the last segment
//! (the owner) plus that segment (the key). Reads and writes both go through
//! the returned [`Location`], so they resolve identically.

use crate::error::{Error, Result};
use crate::model::{Object, Value};

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// The owner object and final key of a resolved path.
#[derive(Debug, Clone)]
pub struct Location {
    owner: Object,
    key: String,
}

impl Location {
    pub fn owner(&self) -> &Object {
        &self.owner
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value; `None` when the owner has no such key.
    pub fn get(&self) -> Option<Value> {
        self.owner.get(&self.key)
    }

    /// Write through the owner's observed setter.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        self.owner.set(&self.key, value)
    }
}

/// Join a prefix and a key into a path.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, key)
    }
}

/// Resolve `path` against `root`.
///
/// Every segment but the last must name an object. A single-segment path
/// resolves to `root` itself as owner.
pub fn resolve(root: &Object, path: &str) -> Result<Location> {
    let mut segments: Vec<&str> = path.split(SEPARATOR).collect();
    // split always yields at least one segment
    let key = segments.pop().unwrap_or_default();

    let mut owner = root.clone();
    for segment in segments {
        owner = match owner.get(segment) {
            Some(Value::Object(next)) => next,
            _ => return Err(Error::unresolvable_path(path, segment)),
        };
    }

    Ok(Location {
        owner,
        key: key.to_string(),
    })
}
