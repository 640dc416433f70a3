//! Directive trait.

use tether_tree::MutationRecord;

/// Behavior bound to a single node that matches a manager's selector.
///
/// Instances are created by the manager's factory when a node starts
/// matching and live in that node's slot until it leaves the tree or stops
/// matching. Both callbacks are optional; the defaults do nothing.
///
/// # Example
///
/// ```
/// use tether::Directive;
/// use tether_dom::Node;
///
/// struct CopyButton {
///     text: String,
/// }
///
/// impl Directive<Node> for CopyButton {
///     fn on_change(&mut self, node: &Node, _record: &tether::MutationRecord<Node>) {
///         self.text = node.get_attribute("copy-text").unwrap_or_default();
///     }
/// }
/// ```
pub trait Directive<N>: 'static {
    /// An observed attribute changed and the node still matches.
    fn on_change(&mut self, _node: &N, _record: &MutationRecord<N>) {}

    /// The node left the tree or stopped matching. The instance is dropped
    /// right after this returns.
    fn on_detach(&mut self) {}
}
