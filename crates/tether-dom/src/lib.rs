//! In-memory document tree for Tether.
//!
//! This crate provides a small DOM-like tree that implements
//! [`HostTree`](tether_tree::HostTree):
//!
//! - [`Document`]: creates nodes, evaluates selectors and delivers mutation batches
//! - [`Node`]: element and text node handles with attributes and child lists
//! - [`ObserverHandle`]: RAII guard for a mutation subscription
//!
//! Mutation records are queued when changes happen and delivered only when
//! [`Document::flush_mutations`] runs, mirroring how browsers deliver
//! mutation observer callbacks after the current task.
//!
//! # Example
//!
//! ```
//! use tether_dom::Document;
//!
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! button.set_attribute("copy-text", "npm install tether").unwrap();
//! doc.root().append_child(&button).unwrap();
//!
//! let found = doc.query_selector_all(&doc.root(), "button[copy-text]").unwrap();
//! assert_eq!(found, vec![button]);
//! ```

mod document;
mod error;
mod host;
mod matcher;
mod node;
mod observer;

pub use document::Document;
pub use error::DomError;
pub use node::Node;
pub use observer::ObserverHandle;
