//! Lifecycle manager.
//!
//! Keeps one directive instance on every node under an observed root that
//! matches a selector, creating and destroying instances as mutation batches
//! arrive instead of rescanning the tree.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tether_config::LifecycleConfig;
use tether_tree::{HostTree, MutationRecord, ObserveOptions, StorageKey};

use crate::directive::Directive;

/// Selector for every element, used to sweep removed subtrees.
const ANY_ELEMENT: &str = "*";

/// Creates a directive instance for a newly matching node.
pub type DirectiveFactory<N, D> = Box<dyn Fn(&N) -> D>;

/// Outcome of [`LifecycleManager::attach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attach {
    /// A new instance was created and stored.
    Created,
    /// The node already had an instance; nothing was created.
    AlreadyPresent,
    /// The factory panicked; the node stays unattached.
    Failed,
}

/// Binds directive instances to nodes matching a selector.
///
/// Each manager mints its own [`StorageKey`] and stores instances in that
/// slot on the host tree's nodes, so several managers (even with the same
/// selector and directive type) can bind to the same node independently.
///
/// Per node the manager is in one of two states, unattached or attached:
///
/// | Event | Node state | Action |
/// |---|---|---|
/// | scan / added | matches, unattached | create |
/// | removed | attached | `on_detach`, erase |
/// | attribute changed | matches, unattached | create |
/// | attribute changed | matches, attached | `on_change` |
/// | attribute changed | no longer matches, attached | `on_detach`, erase |
///
/// Creating on an attached node and detaching an unattached node are no-ops.
///
/// # Subscriptions
///
/// A manager holds a single logical subscription. [`observe`](Self::observe)
/// may be called for several roots, but [`disconnect`](Self::disconnect)
/// stops all of them while only tearing down the root it is given. Instances
/// under the other roots stay attached with nothing left to update them.
pub struct LifecycleManager<T: HostTree, D> {
    tree: T,
    selector: String,
    watch_list: Vec<String>,
    key: StorageKey,
    factory: DirectiveFactory<T::Node, D>,
    isolate_callbacks: bool,
    subscriptions: RefCell<Vec<(T::Node, T::Subscription)>>,
}

impl<T, D> LifecycleManager<T, D>
where
    T: HostTree + 'static,
    D: Directive<T::Node>,
{
    /// Create a manager with default configuration.
    ///
    /// Nothing is scanned or observed yet; see [`crate::register`] for the
    /// usual entry point.
    pub fn new<F>(tree: T, selector: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&T::Node) -> D + 'static,
    {
        Self::with_config(tree, selector, factory, &LifecycleConfig::default())
    }

    /// Create a manager with explicit configuration.
    pub fn with_config<F>(
        tree: T,
        selector: impl Into<String>,
        factory: F,
        config: &LifecycleConfig,
    ) -> Self
    where
        F: Fn(&T::Node) -> D + 'static,
    {
        let selector = selector.into();
        let watch_list = build_watch_list(&selector, config);
        let key = StorageKey::mint();

        tracing::debug!(
            selector = %selector,
            ?key,
            ?watch_list,
            "Created lifecycle manager"
        );

        Self {
            tree,
            selector,
            watch_list,
            key,
            factory: Box::new(factory),
            isolate_callbacks: config.isolate_callbacks,
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    /// Selector this manager binds to.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Attribute names observed for changes. Empty means every attribute.
    pub fn watch_list(&self) -> &[String] {
        &self.watch_list
    }

    /// Slot key under which instances are stored.
    pub fn key(&self) -> StorageKey {
        self.key
    }

    /// Instance attached to `node`, if any.
    pub fn instance(&self, node: &T::Node) -> Option<Rc<RefCell<D>>> {
        self.tree
            .slot(node, self.key)?
            .downcast::<RefCell<D>>()
            .ok()
    }

    /// Whether `node` currently holds an instance from this manager.
    pub fn is_attached(&self, node: &T::Node) -> bool {
        self.tree.slot(node, self.key).is_some()
    }

    /// Create and store an instance for `node` unless one exists.
    ///
    /// Does not check the selector; callers decide whether the node matches.
    pub fn attach(&self, node: &T::Node) -> Attach {
        if self.is_attached(node) {
            return Attach::AlreadyPresent;
        }

        let Some(directive) = self.guard("factory", node, || (self.factory)(node)) else {
            return Attach::Failed;
        };

        let instance: Rc<dyn Any> = Rc::new(RefCell::new(directive));
        self.tree.set_slot(node, self.key, instance);
        tracing::debug!(selector = %self.selector, ?node, "Attached directive");
        Attach::Created
    }

    /// Erase the instance on `node` and call its `on_detach`.
    ///
    /// Returns `false` when the node had no instance. The slot is cleared
    /// before the callback runs, so a panicking callback never leaves it behind.
    pub fn detach(&self, node: &T::Node) -> bool {
        let Some(slot) = self.tree.take_slot(node, self.key) else {
            return false;
        };
        tracing::debug!(selector = %self.selector, ?node, "Detaching directive");

        if let Ok(instance) = slot.downcast::<RefCell<D>>() {
            self.guard("on_detach", node, || match instance.try_borrow_mut() {
                Ok(mut directive) => directive.on_detach(),
                Err(_) => tracing::warn!(
                    selector = %self.selector,
                    ?node,
                    "Directive detached from inside its own callback, skipping on_detach"
                ),
            });
        }
        true
    }

    /// Attach `root` if it matches, then every matching descendant.
    pub fn attach_to(&self, root: &T::Node) {
        if self.matches(root) {
            self.attach(root);
        }
        for node in self.tree.query_all(root, &self.selector) {
            self.attach(&node);
        }
    }

    /// Detach every attached descendant of `root`, then `root` itself.
    ///
    /// Descendants are torn down in document order before their ancestor.
    /// Whether a node still matches is not consulted: selectors with ancestor
    /// context (`nav li`) stop matching once a subtree is cut out of the tree.
    pub fn detach_from(&self, root: &T::Node) {
        for node in self.tree.query_all(root, ANY_ELEMENT) {
            self.detach(&node);
        }
        if self.tree.is_element(root) {
            self.detach(root);
        }
    }

    /// Apply a mutation batch, record by record, in delivery order.
    ///
    /// Matching is evaluated against the tree as it is now, not as it was
    /// when each record was queued. A node that lost and regained its match
    /// before the batch arrived therefore keeps its instance and sees the
    /// records as changes; a loss observed by this method always ends with a
    /// fresh instance on regain.
    pub fn process(&self, records: &[MutationRecord<T::Node>]) {
        tracing::trace!(
            selector = %self.selector,
            records = records.len(),
            "Processing mutation batch"
        );

        for record in records {
            match record {
                MutationRecord::ChildList { added, removed, .. } => {
                    for node in added.iter().filter(|n| self.is_element(n)) {
                        self.attach_to(node);
                    }
                    for node in removed.iter().filter(|n| self.is_element(n)) {
                        self.detach_from(node);
                    }
                }
                MutationRecord::Attributes { target, .. } => {
                    if !self.is_element(target) {
                        continue;
                    }
                    if self.in_observed_tree(target) && self.tree.matches(target, &self.selector) {
                        self.update(target, record);
                    } else {
                        self.detach(target);
                    }
                }
            }
        }
    }

    /// Subscribe to structural and watched attribute changes under `root`.
    ///
    /// The subscription holds only a weak reference to the manager; batches
    /// arriving after the manager is dropped are ignored.
    pub fn observe(self: &Rc<Self>, root: &T::Node) {
        let manager = Rc::downgrade(self);
        let options = ObserveOptions::subtree_with_attributes(self.watch_list.clone());
        let subscription = self.tree.observe(
            root,
            options,
            Box::new(move |batch| {
                if let Some(manager) = manager.upgrade() {
                    manager.process(batch);
                }
            }),
        );

        tracing::debug!(selector = %self.selector, ?root, "Observing");
        self.subscriptions
            .borrow_mut()
            .push((root.clone(), subscription));
    }

    /// Stop every subscription, then tear down all instances under `root`.
    pub fn disconnect(&self, root: &T::Node) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        if subscriptions.len() > 1 {
            tracing::warn!(
                selector = %self.selector,
                roots = subscriptions.len(),
                "Disconnecting a manager observing several roots; only the given root is torn down"
            );
        }
        drop(subscriptions);

        tracing::debug!(selector = %self.selector, ?root, "Disconnected");
        self.detach_from(root);
    }

    /// Whether any subscription is active.
    pub fn is_observing(&self) -> bool {
        !self.subscriptions.borrow().is_empty()
    }

    /// Construct if absent, otherwise forward the change.
    fn update(&self, node: &T::Node, record: &MutationRecord<T::Node>) {
        let Some(instance) = self.instance(node) else {
            self.attach(node);
            return;
        };

        self.guard("on_change", node, || match instance.try_borrow_mut() {
            Ok(mut directive) => directive.on_change(node, record),
            Err(_) => tracing::warn!(
                selector = %self.selector,
                ?node,
                "Directive is busy in another callback, skipping on_change"
            ),
        });
    }

    fn is_element(&self, node: &T::Node) -> bool {
        if self.tree.is_element(node) {
            return true;
        }
        tracing::trace!(?node, "Skipping non-element node");
        false
    }

    fn matches(&self, node: &T::Node) -> bool {
        self.tree.is_element(node) && self.tree.matches(node, &self.selector)
    }

    /// Whether `node` is under an observed root. Managers driven by hand
    /// (no subscriptions) treat every node as in the tree.
    fn in_observed_tree(&self, node: &T::Node) -> bool {
        let subscriptions = self.subscriptions.borrow();
        subscriptions.is_empty()
            || subscriptions
                .iter()
                .any(|(root, _)| self.tree.contains(root, node))
    }

    /// Run a user callback, catching panics when isolation is enabled.
    fn guard<R>(&self, callback: &'static str, node: &T::Node, f: impl FnOnce() -> R) -> Option<R> {
        if !self.isolate_callbacks {
            return Some(f());
        }

        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(payload) => {
                tracing::error!(
                    selector = %self.selector,
                    callback,
                    ?node,
                    panic = panic_message(payload.as_ref()),
                    "Directive callback panicked"
                );
                None
            }
        }
    }
}

/// Attribute names to observe for `selector` under `config`.
fn build_watch_list(selector: &str, config: &LifecycleConfig) -> Vec<String> {
    if config.observe_all_attributes {
        return Vec::new();
    }

    let mut watch_list = tether_selector::extract_attributes(selector);
    // An empty list already observes everything.
    if watch_list.is_empty() {
        return watch_list;
    }
    for extra in &config.extra_attributes {
        if !watch_list.contains(extra) {
            watch_list.push(extra.clone());
        }
    }
    watch_list
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
