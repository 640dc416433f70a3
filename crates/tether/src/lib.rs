//! Selector-driven directive lifecycles.
//!
//! Tether keeps exactly one [`Directive`] instance bound to every node of a
//! live tree that matches a selector. Instances are created when a node
//! enters the tree or starts matching, receive [`Directive::on_change`] when
//! an observed attribute changes, and get [`Directive::on_detach`] when the
//! node leaves the tree or stops matching.
//!
//! The manager never rescans the tree after registration. It reacts to
//! mutation batches from the host tree (see [`HostTree`]), observing only
//! attributes named in the selector unless configured otherwise.
//!
//! # Example
//!
//! ```
//! use tether::{Directive, MutationRecord};
//! use tether_dom::{Document, Node};
//!
//! struct CopyButton {
//!     text: String,
//! }
//!
//! impl Directive<Node> for CopyButton {
//!     fn on_change(&mut self, node: &Node, _record: &MutationRecord<Node>) {
//!         self.text = node.get_attribute("copy-text").unwrap_or_default();
//!     }
//! }
//!
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! button.set_attribute("copy-text", "hello").unwrap();
//! doc.root().append_child(&button).unwrap();
//!
//! let manager = tether::register(doc.clone(), &doc.root(), "button[copy-text]", |node: &Node| {
//!     CopyButton { text: node.get_attribute("copy-text").unwrap_or_default() }
//! });
//!
//! button.set_attribute("copy-text", "bye").unwrap();
//! doc.flush_mutations();
//! assert_eq!(manager.instance(&button).unwrap().borrow().text, "bye");
//! ```

mod directive;
mod manager;

use std::rc::Rc;

pub use directive::Directive;
pub use manager::{Attach, DirectiveFactory, LifecycleManager};
pub use tether_config::LifecycleConfig;
pub use tether_tree::{HostTree, MutationRecord, ObserveOptions, StorageKey};

/// Bind `factory`-made directives to every node under `root` matching `selector`.
///
/// Runs the initial pass over `root`, then observes it. The returned manager
/// owns the subscription; dropping it stops updates.
pub fn register<T, D, F>(
    tree: T,
    root: &T::Node,
    selector: impl Into<String>,
    factory: F,
) -> Rc<LifecycleManager<T, D>>
where
    T: HostTree + 'static,
    D: Directive<T::Node>,
    F: Fn(&T::Node) -> D + 'static,
{
    register_with_config(tree, root, selector, factory, &LifecycleConfig::default())
}

/// [`register`] with explicit configuration.
pub fn register_with_config<T, D, F>(
    tree: T,
    root: &T::Node,
    selector: impl Into<String>,
    factory: F,
    config: &LifecycleConfig,
) -> Rc<LifecycleManager<T, D>>
where
    T: HostTree + 'static,
    D: Directive<T::Node>,
    F: Fn(&T::Node) -> D + 'static,
{
    let manager = Rc::new(LifecycleManager::with_config(tree, selector, factory, config));
    manager.attach_to(root);
    manager.observe(root);
    manager
}
