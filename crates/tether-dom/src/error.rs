use tether_selector::SelectorError;

/// Error raised by document operations.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// Insertion would create a cycle or give a text node children.
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(&'static str),
    /// Referenced node is not a child of the target.
    #[error("Node not found: {0}")]
    NotFound(&'static str),
    /// Attribute operation on a non-element node.
    #[error("Node is not an element")]
    NotAnElement,
    /// Node was created by a different document.
    #[error("Node belongs to a different document")]
    WrongDocument,
    /// Attribute name is empty or contains whitespace or quotes.
    #[error("Invalid attribute name {0:?}")]
    InvalidAttributeName(String),
    /// Selector failed to parse.
    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),
}
