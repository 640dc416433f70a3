//! Host tree trait.
//!
//! Provides [`HostTree`], the capabilities the lifecycle manager consumes from
//! the document it binds directives to.

use std::fmt;

use crate::key::{Slot, StorageKey};
use crate::mutation::{MutationCallback, ObserveOptions};

/// Capabilities of a live, externally mutated node tree.
///
/// Implementations are cheap-to-clone handles onto a shared document. All
/// methods take `&self`; trees rely on interior mutability and are expected to
/// be used from a single thread.
///
/// # Mutation delivery
///
/// [`observe`](Self::observe) must never invoke the callback from inside the
/// mutating call. Records are queued and delivered later as a batch, in the
/// order the changes happened.
///
/// # Extension slots
///
/// Every node carries a map from [`StorageKey`] to [`Slot`]. Tree consumers
/// other than the key's owner must treat these slots as opaque. Slots are
/// released with their node.
pub trait HostTree: Clone {
    /// Node handle. Equality is identity.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Keeps a subscription alive. Dropping it stops delivery.
    type Subscription;

    /// Whether `node` is an element (as opposed to text or comment nodes).
    fn is_element(&self, node: &Self::Node) -> bool;

    /// Whether `node` matches `selector`. Invalid selectors match nothing.
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    /// All descendants of `root` (excluding `root`) matching `selector`, in
    /// document order.
    fn query_all(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Whether `node` is `root` or one of its descendants.
    fn contains(&self, root: &Self::Node, node: &Self::Node) -> bool;

    /// Subscribe to mutations under `root`.
    fn observe(
        &self,
        root: &Self::Node,
        options: ObserveOptions,
        callback: MutationCallback<Self::Node>,
    ) -> Self::Subscription;

    /// Read the slot for `key` on `node`.
    fn slot(&self, node: &Self::Node, key: StorageKey) -> Option<Slot>;

    /// Store `value` in the slot for `key` on `node`, replacing any previous value.
    fn set_slot(&self, node: &Self::Node, key: StorageKey, value: Slot);

    /// Remove and return the slot for `key` on `node`.
    fn take_slot(&self, node: &Self::Node, key: StorageKey) -> Option<Slot>;
}
