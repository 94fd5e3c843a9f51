//! Property-based tests for rule parsing and the binding index.
//!
//! These tests check that:
//!
//! - Whitespace around the kind and the colon never changes the parsed rule
//! - Paths with embedded whitespace are always rejected
//! - A declaration parses into exactly one rule per comma-separated entry
//! - The index never records the same (path, kind, element) twice
