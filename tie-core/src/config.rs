//! Engine configuration.
//!
//! Defaults reproduce the classic `data-tie` markup: rules live in the
//! `data-tie` attribute, `change`/`keyup` feed `value` bindings back into the
//! data object and `click` dispatches to actions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default declaration attribute.
pub const DEFAULT_ATTRIBUTE: &str = "data-tie";

/// Default cap on re-entrant propagation.
pub const DEFAULT_MAX_UPDATE_DEPTH: usize = 64;

/// Configuration for a [`Tie`](crate::Tie) engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieConfig {
    /// Attribute carrying the binding declarations.
    pub attribute: String,
    /// Events that write an element's value back into the data object.
    pub change_events: Vec<String>,
    /// Events that invoke an action.
    pub click_events: Vec<String>,
    /// Whether the root element itself is scanned for declarations.
    pub include_root: bool,
    /// Maximum nesting of re-entrant path updates.
    pub max_update_depth: usize,
}

impl Default for TieConfig {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            change_events: vec!["change".to_string(), "keyup".to_string()],
            click_events: vec!["click".to_string()],
            include_root: false,
            max_update_depth: DEFAULT_MAX_UPDATE_DEPTH,
        }
    }
}

impl TieConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different declaration attribute.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Replace the change event list.
    pub fn with_change_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change_events = events.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the click event list.
    pub fn with_click_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.click_events = events.into_iter().map(Into::into).collect();
        self
    }

    /// Scan the root element too, not only its descendants.
    pub fn with_include_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }

    /// Set the re-entrant update cap.
    pub fn with_max_update_depth(mut self, depth: usize) -> Self {
        self.max_update_depth = depth;
        self
    }

    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Name of the attribute stamped on elements listening for `event_type`.
    pub fn event_attribute(&self, event_type: &str) -> String {
        format!("{}-on-{}", self.attribute, event_type)
    }

    /// Every event type the engine may subscribe to, change events first.
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.change_events
            .iter()
            .chain(self.click_events.iter())
            .map(String::as_str)
    }

    pub fn is_change_event(&self, event_type: &str) -> bool {
        self.change_events.iter().any(|e| e == event_type)
    }

    pub fn is_click_event(&self, event_type: &str) -> bool {
        self.click_events.iter().any(|e| e == event_type)
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.attribute.trim().is_empty() {
            return Err(Error::Config("attribute must not be empty".to_string()));
        }
        if self.change_events.is_empty() {
            return Err(Error::Config("change_events must not be empty".to_string()));
        }
        if self.click_events.is_empty() {
            return Err(Error::Config("click_events must not be empty".to_string()));
        }
        if self.max_update_depth == 0 {
            return Err(Error::Config(
                "max_update_depth must be at least 1".to_string(),
            ));
        }
        if let Some(shared) = self.change_events.iter().find(|e| self.is_click_event(e)) {
            return Err(Error::Config(format!(
                "event '{}' cannot be both a change and a click event",
                shared
            )));
        }
        Ok(())
    }
}
