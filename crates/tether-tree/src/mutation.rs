//! Mutation records and subscription options.
//!
//! Host trees report changes as batches of [`MutationRecord`]s delivered to a
//! [`MutationCallback`] registered through [`HostTree::observe`](crate::HostTree::observe).

/// Kind of mutation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added to or removed from a node.
    ChildList,
    /// An attribute was set, changed or removed.
    Attributes,
}

/// A single change to the host tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord<N> {
    /// Children of `target` changed.
    ChildList {
        /// Parent whose child list changed.
        target: N,
        /// Nodes inserted under `target`, in insertion order.
        added: Vec<N>,
        /// Nodes removed from `target`, in removal order.
        removed: Vec<N>,
    },
    /// An attribute of `target` changed.
    Attributes {
        /// Element whose attribute changed.
        target: N,
        /// Attribute name.
        name: String,
        /// Value before the change (`None` if the attribute was absent).
        old_value: Option<String>,
    },
}

impl<N> MutationRecord<N> {
    /// Node the record was reported on.
    pub fn target(&self) -> &N {
        match self {
            Self::ChildList { target, .. } | Self::Attributes { target, .. } => target,
        }
    }

    /// Record kind.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::ChildList { .. } => MutationKind::ChildList,
            Self::Attributes { .. } => MutationKind::Attributes,
        }
    }

    /// Attribute name for attribute records.
    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Self::Attributes { name, .. } => Some(name),
            Self::ChildList { .. } => None,
        }
    }
}

/// Receives mutation batches, in delivery order.
pub type MutationCallback<N> = Box<dyn FnMut(&[MutationRecord<N>])>;

/// What a subscription observes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Report child additions and removals.
    pub child_list: bool,
    /// Report attribute changes.
    pub attributes: bool,
    /// Extend observation from the root to all of its descendants.
    pub subtree: bool,
    /// Restrict attribute records to these names. `None` reports every attribute.
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserveOptions {
    /// Structural and attribute changes anywhere under the root.
    ///
    /// An empty `watch_list` observes every attribute.
    ///
    /// # Example
    ///
    /// ```
    /// use tether_tree::ObserveOptions;
    ///
    /// let all = ObserveOptions::subtree_with_attributes(Vec::new());
    /// assert!(all.accepts_attribute("anything"));
    ///
    /// let narrow = ObserveOptions::subtree_with_attributes(vec!["open".to_owned()]);
    /// assert!(narrow.accepts_attribute("open"));
    /// assert!(!narrow.accepts_attribute("class"));
    /// ```
    #[must_use]
    pub fn subtree_with_attributes(watch_list: Vec<String>) -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            attribute_filter: (!watch_list.is_empty()).then_some(watch_list),
        }
    }

    /// Whether an attribute change named `name` should be reported.
    #[must_use]
    pub fn accepts_attribute(&self, name: &str) -> bool {
        self.attributes
            && self
                .attribute_filter
                .as_ref()
                .is_none_or(|filter| filter.iter().any(|n| n == name))
    }
}
