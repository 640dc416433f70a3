//! [`HostTree`] implementation for [`Document`].

use tether_tree::{HostTree, MutationCallback, ObserveOptions, Slot, StorageKey};

use crate::document::Document;
use crate::matcher;
use crate::node::Node;
use crate::observer::ObserverHandle;

impl HostTree for Document {
    type Node = Node;
    type Subscription = ObserverHandle;

    fn is_element(&self, node: &Node) -> bool {
        node.is_element()
    }

    fn matches(&self, node: &Node, selector: &str) -> bool {
        self.compiled(selector)
            .is_some_and(|list| matcher::matches_list(node, &list))
    }

    fn query_all(&self, root: &Node, selector: &str) -> Vec<Node> {
        let Some(list) = self.compiled(selector) else {
            return Vec::new();
        };
        root.descendants()
            .into_iter()
            .filter(|node| matcher::matches_list(node, &list))
            .collect()
    }

    fn contains(&self, root: &Node, node: &Node) -> bool {
        root.contains(node)
    }

    fn observe(
        &self,
        root: &Node,
        options: ObserveOptions,
        callback: MutationCallback<Node>,
    ) -> ObserverHandle {
        Document::observe(self, root, options, callback)
    }

    fn slot(&self, node: &Node, key: StorageKey) -> Option<Slot> {
        node.slot(key)
    }

    fn set_slot(&self, node: &Node, key: StorageKey, value: Slot) {
        node.set_slot(key, value);
    }

    fn take_slot(&self, node: &Node, key: StorageKey) -> Option<Slot> {
        node.take_slot(key)
    }
}
