//! Node handles.
//!
//! A [`Node`] is a reference-counted handle; cloning it yields another handle
//! to the same node and equality compares identity. Parents own their children,
//! children point back through weak references.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tether_tree::{MutationRecord, Slot, StorageKey};

use crate::document::{Document, DocumentInner};
use crate::error::DomError;

pub(crate) struct NodeCell {
    data: RefCell<NodeData>,
    slots: RefCell<HashMap<StorageKey, Slot>>,
    document: Weak<DocumentInner>,
}

struct NodeData {
    kind: NodeKind,
    parent: Weak<NodeCell>,
    children: Vec<Node>,
}

enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

/// Handle to an element or text node.
#[derive(Clone)]
pub struct Node(Rc<NodeCell>);

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl Node {
    pub(crate) fn new_element(document: Weak<DocumentInner>, tag: &str) -> Self {
        Self::new(
            document,
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attributes: Vec::new(),
            },
        )
    }

    pub(crate) fn new_text(document: Weak<DocumentInner>, text: &str) -> Self {
        Self::new(document, NodeKind::Text(text.to_owned()))
    }

    fn new(document: Weak<DocumentInner>, kind: NodeKind) -> Self {
        Self(Rc::new(NodeCell {
            data: RefCell::new(NodeData {
                kind,
                parent: Weak::new(),
                children: Vec::new(),
            }),
            slots: RefCell::new(HashMap::new()),
            document,
        }))
    }

    /// Document that created this node, if it is still alive.
    pub fn document(&self) -> Option<Document> {
        self.0.document.upgrade().map(Document::from_inner)
    }

    /// Whether this node is an element.
    pub fn is_element(&self) -> bool {
        matches!(self.0.data.borrow().kind, NodeKind::Element { .. })
    }

    /// Lowercased tag name for elements, `None` for text nodes.
    pub fn tag_name(&self) -> Option<String> {
        match &self.0.data.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Text content of a text node, `None` for elements.
    pub fn text(&self) -> Option<String> {
        match &self.0.data.borrow().kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    /// Attribute value, `None` when absent or when this is not an element.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        match &self.0.data.borrow().kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// All attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        match &self.0.data.borrow().kind {
            NodeKind::Element { attributes, .. } => attributes.clone(),
            NodeKind::Text(_) => Vec::new(),
        }
    }

    /// Set an attribute, queueing an attribute record even if the value is unchanged.
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        validate_attribute_name(name)?;

        let old_value = {
            let mut data = self.0.data.borrow_mut();
            let NodeKind::Element { attributes, .. } = &mut data.kind else {
                return Err(DomError::NotAnElement);
            };
            if let Some(entry) = attributes.iter_mut().find(|(n, _)| n == name) {
                Some(std::mem::replace(&mut entry.1, value.to_owned()))
            } else {
                attributes.push((name.to_owned(), value.to_owned()));
                None
            }
        };

        self.record(MutationRecord::Attributes {
            target: self.clone(),
            name: name.to_owned(),
            old_value,
        });
        Ok(())
    }

    /// Remove an attribute. Returns whether it was present; absent attributes
    /// queue no record.
    pub fn remove_attribute(&self, name: &str) -> Result<bool, DomError> {
        let old_value = {
            let mut data = self.0.data.borrow_mut();
            let NodeKind::Element { attributes, .. } = &mut data.kind else {
                return Err(DomError::NotAnElement);
            };
            let Some(index) = attributes.iter().position(|(n, _)| n == name) else {
                return Ok(false);
            };
            attributes.remove(index).1
        };

        self.record(MutationRecord::Attributes {
            target: self.clone(),
            name: name.to_owned(),
            old_value: Some(old_value),
        });
        Ok(true)
    }

    /// Parent node, if attached.
    pub fn parent(&self) -> Option<Node> {
        self.0.data.borrow().parent.upgrade().map(Node)
    }

    /// Child nodes in order.
    pub fn children(&self) -> Vec<Node> {
        self.0.data.borrow().children.clone()
    }

    /// Closest preceding sibling that is an element.
    pub fn previous_element_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings.iter().position(|s| s == self)?;
        siblings[..index].iter().rev().find(|s| s.is_element()).cloned()
    }

    fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings.iter().position(|s| s == self)?;
        siblings.get(index + 1).cloned()
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// All descendants in document (pre-)order, excluding this node.
    pub fn descendants(&self) -> Vec<Node> {
        let mut result = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            result.push(node);
        }
        result
    }

    /// Append `child`, moving it out of its current parent first.
    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is `None`.
    ///
    /// A child that already has a parent is removed from it first, which
    /// queues a removal record on the old parent.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        self.check_insertion(child)?;

        let reference = match reference {
            Some(r) if r.parent().as_ref() != Some(self) => {
                return Err(DomError::NotFound("reference node is not a child"));
            }
            Some(r) if r == child => child.next_sibling(),
            other => other.cloned(),
        };

        if let Some(old_parent) = child.parent() {
            old_parent.detach_child(child);
        }

        {
            let mut data = self.0.data.borrow_mut();
            let index = reference
                .as_ref()
                .and_then(|r| data.children.iter().position(|c| c == r))
                .unwrap_or(data.children.len());
            data.children.insert(index, child.clone());
        }
        child.0.data.borrow_mut().parent = Rc::downgrade(&self.0);

        self.record(MutationRecord::ChildList {
            target: self.clone(),
            added: vec![child.clone()],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Remove `child` from this node.
    pub fn remove_child(&self, child: &Node) -> Result<(), DomError> {
        if child.parent().as_ref() != Some(self) {
            return Err(DomError::NotFound("node is not a child"));
        }
        self.detach_child(child);
        Ok(())
    }

    /// Remove this node from its parent. No-op when detached.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent.detach_child(self);
        }
    }

    /// Whether this node matches `selector`.
    pub fn matches(&self, selector: &str) -> Result<bool, DomError> {
        let list = tether_selector::parse(selector)?;
        Ok(crate::matcher::matches_list(self, &list))
    }

    fn check_insertion(&self, child: &Node) -> Result<(), DomError> {
        if !Weak::ptr_eq(&self.0.document, &child.0.document) {
            return Err(DomError::WrongDocument);
        }
        if !self.is_element() {
            return Err(DomError::HierarchyRequest("text nodes cannot have children"));
        }
        if child.contains(self) {
            return Err(DomError::HierarchyRequest(
                "node cannot be inserted into itself or a descendant",
            ));
        }
        Ok(())
    }

    fn detach_child(&self, child: &Node) {
        {
            let mut data = self.0.data.borrow_mut();
            data.children.retain(|c| c != child);
        }
        child.0.data.borrow_mut().parent = Weak::new();

        self.record(MutationRecord::ChildList {
            target: self.clone(),
            added: Vec::new(),
            removed: vec![child.clone()],
        });
    }

    fn record(&self, record: MutationRecord<Node>) {
        if let Some(document) = self.0.document.upgrade() {
            document.enqueue(self, record);
        }
    }

    /// Run `f` against the element's tag and attributes; `None` for text nodes.
    pub(crate) fn with_element<R>(
        &self,
        f: impl FnOnce(&str, &[(String, String)]) -> R,
    ) -> Option<R> {
        match &self.0.data.borrow().kind {
            NodeKind::Element { tag, attributes } => Some(f(tag, attributes)),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn slot(&self, key: StorageKey) -> Option<Slot> {
        self.0.slots.borrow().get(&key).map(Rc::clone)
    }

    pub(crate) fn set_slot(&self, key: StorageKey, value: Slot) {
        self.0.slots.borrow_mut().insert(key, value);
    }

    pub(crate) fn take_slot(&self, key: StorageKey) -> Option<Slot> {
        self.0.slots.borrow_mut().remove(&key)
    }
}

fn validate_attribute_name(name: &str) -> Result<(), DomError> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '='));
    if invalid {
        return Err(DomError::InvalidAttributeName(name.to_owned()));
    }
    Ok(())
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(data) = self.0.data.try_borrow() else {
            return f.write_str("<node (borrowed)>");
        };
        match &data.kind {
            NodeKind::Element { tag, attributes } => {
                write!(f, "<{tag}")?;
                for (name, value) in attributes {
                    write!(f, " {name}={value:?}")?;
                }
                f.write_str(">")
            }
            NodeKind::Text(text) => write!(f, "#text {text:?}"),
        }
    }
}
