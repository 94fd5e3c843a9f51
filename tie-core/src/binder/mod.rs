//! Declaration discovery.
//!
//! Scans an element subtree for the declaration attribute, parses each rule
//! and builds a fresh [`BindingIndex`]. A scan never merges with an earlier
//! index; callers swap the result in wholesale.
//!
//! ## Components
//!
//! - [`rule`]: `kind: path` parsing and [`BindingKind`]
//! - [`index`]: [`BindingIndex`] and [`ListenerRegistry`]

pub mod index;
mod proptest;
pub mod rule;

use tracing::{debug, trace};

use crate::config::TieConfig;
use crate::error::{Error, Result};
use crate::host::{ElementId, Host};

pub use index::{BindingIndex, ListenerRegistry};
pub use rule::{BindingKind, BindingRule, RuleParser};

/// Build the binding index for the subtree under `root`.
pub fn bind<H: Host + ?Sized>(host: &H, root: ElementId, config: &TieConfig) -> Result<BindingIndex> {
    let mut elements = Vec::new();
    if config.include_root && host.has_attribute(root, &config.attribute) {
        elements.push(root);
    }
    elements.extend(host.query_selector_all(root, &config.attribute));

    let mut index = BindingIndex::new();
    for element in &elements {
        process_element(host, *element, &config.attribute, &mut index)?;
    }

    debug!(
        "Bound {} elements under {} ({} paths)",
        elements.len(),
        root,
        index.paths().count()
    );
    Ok(index)
}

/// Add every rule declared on `element` to `index`.
pub fn process_element<H: Host + ?Sized>(
    host: &H,
    element: ElementId,
    attribute: &str,
    index: &mut BindingIndex,
) -> Result<()> {
    let Some(declaration) = host.get_attribute(element, attribute) else {
        return Ok(());
    };

    for rule in RuleParser::split_rules(&declaration) {
        parse_rule(element, rule, index)?;
    }
    Ok(())
}

/// Parse one rule and record it for `element`.
pub fn parse_rule(element: ElementId, rule: &str, index: &mut BindingIndex) -> Result<BindingRule> {
    let parsed = RuleParser::parse_rule(rule).ok_or_else(|| Error::malformed_rule(element, rule))?;
    trace!("Bound '{}' of '{}' to {}", parsed.kind, parsed.path, element);
    index.insert(&parsed.path, parsed.kind.clone(), element);
    Ok(parsed)
}
