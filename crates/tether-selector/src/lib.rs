//! Selector utilities for Tether.
//!
//! This crate provides two independent pieces:
//!
//! - [`extract_attributes`]: collects the attribute names referenced by a
//!   selector's bracketed predicates. The lifecycle manager uses the result as
//!   the attribute allow-list for its mutation subscription.
//! - [`parse`]: parses a selector list into a typed [`SelectorList`] that host
//!   trees can evaluate against their nodes.
//!
//! # Example
//!
//! ```
//! use tether_selector::{extract_attributes, parse};
//!
//! assert_eq!(
//!     extract_attributes("[data-id][role=btn] > span"),
//!     vec!["data-id", "role"],
//! );
//!
//! let list = parse("button[copy-text], .card > a").unwrap();
//! assert_eq!(list.selectors.len(), 2);
//! ```

mod attributes;
mod error;
mod parser;
mod selector;

pub use attributes::extract_attributes;
pub use error::SelectorError;
pub use parser::parse;
pub use selector::{
    AttributeMatcher, AttributeOp, AttributeSelector, Combinator, ComplexSelector,
    CompoundSelector, SelectorList,
};
