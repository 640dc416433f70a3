//! Document handle and mutation delivery.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tether_selector::SelectorList;
use tether_tree::{MutationCallback, MutationRecord, ObserveOptions};

use crate::error::DomError;
use crate::matcher;
use crate::node::Node;
use crate::observer::{Observer, ObserverHandle};

/// Upper bound on delivery rounds per flush.
///
/// Each round delivers every pending batch; callbacks that mutate the tree
/// schedule another round. A feedback loop between observers stops here.
const MAX_FLUSH_ROUNDS: usize = 1000;

pub(crate) struct DocumentInner {
    root: Node,
    observers: RefCell<Vec<Rc<Observer>>>,
    selectors: RefCell<HashMap<String, Option<Rc<SelectorList>>>>,
    flushing: Cell<bool>,
}

impl DocumentInner {
    /// Offer a freshly recorded mutation to every registered observer.
    pub(crate) fn enqueue(&self, target: &Node, record: MutationRecord<Node>) {
        for observer in self.observers.borrow().iter() {
            observer.offer(target, &record);
        }
    }

    pub(crate) fn unregister(&self, observer: &Rc<Observer>) {
        self.observers
            .borrow_mut()
            .retain(|o| !Rc::ptr_eq(o, observer));
    }
}

/// In-memory document.
///
/// `Document` is a cheap-to-clone handle. It owns a root `<html>` element,
/// creates nodes, evaluates selectors and delivers queued mutation records to
/// observers when [`flush_mutations`](Self::flush_mutations) is called, which
/// models the end of the current unit of work.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tether_dom::Document;
/// use tether_tree::ObserveOptions;
///
/// let doc = Document::new();
/// let seen = Rc::new(RefCell::new(0));
/// let counter = Rc::clone(&seen);
/// let _handle = doc.observe(
///     &doc.root(),
///     ObserveOptions::subtree_with_attributes(Vec::new()),
///     Box::new(move |batch| *counter.borrow_mut() += batch.len()),
/// );
///
/// let button = doc.create_element("button");
/// doc.root().append_child(&button).unwrap();
/// button.set_attribute("copy-text", "hello").unwrap();
/// assert_eq!(*seen.borrow(), 0); // nothing delivered inline
///
/// doc.flush_mutations();
/// assert_eq!(*seen.borrow(), 2);
/// ```
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with an `<html>` root element.
    #[must_use]
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<DocumentInner>| DocumentInner {
            root: Node::new_element(weak.clone(), "html"),
            observers: RefCell::new(Vec::new()),
            selectors: RefCell::new(HashMap::new()),
            flushing: Cell::new(false),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Self { inner }
    }

    /// Root element.
    pub fn root(&self) -> Node {
        self.inner.root.clone()
    }

    /// Create a detached element owned by this document.
    pub fn create_element(&self, tag: &str) -> Node {
        Node::new_element(Rc::downgrade(&self.inner), tag)
    }

    /// Create a detached text node owned by this document.
    pub fn create_text(&self, text: &str) -> Node {
        Node::new_text(Rc::downgrade(&self.inner), text)
    }

    /// Descendants of `root` matching `selector`, in document order.
    pub fn query_selector_all(&self, root: &Node, selector: &str) -> Result<Vec<Node>, DomError> {
        let list = tether_selector::parse(selector)?;
        Ok(root
            .descendants()
            .into_iter()
            .filter(|node| matcher::matches_list(node, &list))
            .collect())
    }

    /// Subscribe to mutations under `root`.
    ///
    /// Records are queued as mutations happen and delivered on the next
    /// [`flush_mutations`](Self::flush_mutations). Dropping the returned
    /// handle stops delivery.
    pub fn observe(
        &self,
        root: &Node,
        options: ObserveOptions,
        callback: MutationCallback<Node>,
    ) -> ObserverHandle {
        let observer = Rc::new(Observer::new(root.clone(), options, callback));
        self.inner
            .observers
            .borrow_mut()
            .push(Rc::clone(&observer));
        ObserverHandle::new(observer, Rc::downgrade(&self.inner))
    }

    /// Deliver queued mutation batches, one per observer per round.
    ///
    /// Repeats while callbacks queue further records. Returns the number of
    /// batches delivered. Calls made from inside a callback return `0`; the
    /// outer flush picks up whatever they would have delivered.
    pub fn flush_mutations(&self) -> usize {
        if self.inner.flushing.replace(true) {
            return 0;
        }

        let mut delivered = 0;
        let mut settled = false;

        for _ in 0..MAX_FLUSH_ROUNDS {
            let ready: Vec<Rc<Observer>> = self
                .inner
                .observers
                .borrow()
                .iter()
                .filter(|o| o.has_pending())
                .map(Rc::clone)
                .collect();

            if ready.is_empty() {
                settled = true;
                break;
            }

            for observer in ready {
                if observer.deliver() {
                    delivered += 1;
                }
            }
        }

        if !settled {
            tracing::warn!(
                rounds = MAX_FLUSH_ROUNDS,
                pending = self.pending_mutations(),
                "Mutation delivery did not settle, leaving remaining records queued"
            );
        }

        self.inner.flushing.set(false);
        delivered
    }

    /// Records queued across all observers.
    pub fn pending_mutations(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .map(|o| o.pending())
            .sum()
    }

    /// Parsed selector from the per-document cache.
    ///
    /// Invalid selectors are logged once and cached as `None`.
    pub(crate) fn compiled(&self, selector: &str) -> Option<Rc<SelectorList>> {
        if let Some(cached) = self.inner.selectors.borrow().get(selector) {
            return cached.clone();
        }

        let compiled = match tether_selector::parse(selector) {
            Ok(list) => Some(Rc::new(list)),
            Err(e) => {
                tracing::warn!(selector, error = %e, "Invalid selector, it will match nothing");
                None
            }
        };
        self.inner
            .selectors
            .borrow_mut()
            .insert(selector.to_owned(), compiled.clone());
        compiled
    }
}

#[cfg(test)]
mod tests {
    // Handles share Rc state and must stay on one thread
    static_assertions::assert_not_impl_any!(super::Document: Send, Sync);
    static_assertions::assert_not_impl_any!(crate::Node: Send, Sync);
    use super::*;
    use pretty_assertions::assert_eq;

    type Log = Rc<RefCell<Vec<Vec<MutationRecord<Node>>>>>;

    fn observe_into(doc: &Document, root: &Node, options: ObserveOptions) -> (Log, ObserverHandle) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let handle = doc.observe(
            root,
            options,
            Box::new(move |batch| sink.borrow_mut().push(batch.to_vec())),
        );
        (log, handle)
    }

    #[test]
    fn test_records_are_queued_until_flush() {
        let doc = Document::new();
        let (log, _handle) = observe_into(
            &doc,
            &doc.root(),
            ObserveOptions::subtree_with_attributes(Vec::new()),
        );

        let div = doc.create_element("div");
        doc.root().append_child(&div).unwrap();
        div.set_attribute("open", "").unwrap();

        assert!(log.borrow().is_empty());
        assert_eq!(doc.pending_mutations(), 2);

        assert_eq!(doc.flush_mutations(), 1);
        let batches = log.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![
                MutationRecord::ChildList {
                    target: doc.root(),
                    added: vec![div.clone()],
                    removed: Vec::new(),
                },
                MutationRecord::Attributes {
                    target: div.clone(),
                    name: "open".to_owned(),
                    old_value: None,
                },
            ]
        );
    }

    #[test]
    fn test_flush_without_pending_is_noop() {
        let doc = Document::new();
        assert_eq!(doc.flush_mutations(), 0);
    }

    #[test]
    fn test_attribute_filter() {
        let doc = Document::new();
        let (log, _handle) = observe_into(
            &doc,
            &doc.root(),
            ObserveOptions::subtree_with_attributes(vec!["open".to_owned()]),
        );
        let div = doc.create_element("div");
        doc.root().append_child(&div).unwrap();
        doc.flush_mutations();
        log.borrow_mut().clear();

        div.set_attribute("class", "x").unwrap();
        doc.flush_mutations();
        assert!(log.borrow().is_empty());

        div.set_attribute("open", "").unwrap();
        div.remove_attribute("open").unwrap();
        doc.flush_mutations();
        assert_eq!(
            log.borrow()[0],
            vec![
                MutationRecord::Attributes {
                    target: div.clone(),
                    name: "open".to_owned(),
                    old_value: None,
                },
                MutationRecord::Attributes {
                    target: div.clone(),
                    name: "open".to_owned(),
                    old_value: Some(String::new()),
                },
            ]
        );
    }

    #[test]
    fn test_without_subtree_only_root_is_observed() {
        let doc = Document::new();
        let (log, _handle) = observe_into(
            &doc,
            &doc.root(),
            ObserveOptions {
                child_list: true,
                ..Default::default()
            },
        );
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.root().append_child(&outer).unwrap();
        outer.append_child(&inner).unwrap();
        doc.flush_mutations();

        let batches = log.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].target(), &doc.root());
    }

    #[test]
    fn test_changes_outside_root_are_ignored() {
        let doc = Document::new();
        let watched = doc.create_element("section");
        let other = doc.create_element("aside");
        doc.root().append_child(&watched).unwrap();
        doc.root().append_child(&other).unwrap();

        let (log, _handle) = observe_into(
            &doc,
            &watched,
            ObserveOptions::subtree_with_attributes(Vec::new()),
        );
        other.set_attribute("hidden", "").unwrap();
        doc.flush_mutations();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_removal_is_reported_on_old_parent() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.root().append_child(&div).unwrap();
        let (log, _handle) = observe_into(
            &doc,
            &doc.root(),
            ObserveOptions::subtree_with_attributes(Vec::new()),
        );

        div.remove();
        doc.flush_mutations();
        assert_eq!(
            log.borrow()[0],
            vec![MutationRecord::ChildList {
                target: doc.root(),
                added: Vec::new(),
                removed: vec![div.clone()],
            }]
        );
    }

    #[test]
    fn test_dropping_handle_stops_delivery() {
        let doc = Document::new();
        let (log, handle) = observe_into(
            &doc,
            &doc.root(),
            ObserveOptions::subtree_with_attributes(Vec::new()),
        );
        doc.root().set_attribute("lang", "en").unwrap();
        assert_eq!(handle.pending(), 1);

        handle.disconnect();
        assert_eq!(doc.pending_mutations(), 0);
        doc.root().set_attribute("lang", "fr").unwrap();
        assert_eq!(doc.flush_mutations(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_callback_mutations_are_delivered_in_later_round() {
        let doc = Document::new();
        let (log, _handle) = observe_into(
            &doc,
            &doc.root(),
            ObserveOptions::subtree_with_attributes(Vec::new()),
        );

        let writer_doc = doc.clone();
        let _writer = doc.observe(
            &doc.root(),
            ObserveOptions {
                child_list: true,
                subtree: true,
                ..Default::default()
            },
            Box::new(move |_| {
                writer_doc.root().set_attribute("data-seen", "1").unwrap();
            }),
        );

        doc.root().append_child(&doc.create_element("p")).unwrap();
        assert_eq!(doc.flush_mutations(), 3);

        let batches = log.borrow();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1][0].attribute_name(), Some("data-seen"));
    }

    #[test]
    fn test_runaway_feedback_stops_at_round_limit() {
        let doc = Document::new();
        let writer_doc = doc.clone();
        let _handle = doc.observe(
            &doc.root(),
            ObserveOptions::subtree_with_attributes(Vec::new()),
            Box::new(move |_| {
                writer_doc.root().set_attribute("tick", "1").unwrap();
            }),
        );

        doc.root().set_attribute("tick", "0").unwrap();
        assert_eq!(doc.flush_mutations(), MAX_FLUSH_ROUNDS);
        assert_eq!(doc.pending_mutations(), 1);
    }

    #[test]
    fn test_query_selector_all() {
        let doc = Document::new();
        let list = doc.create_element("ul");
        let first = doc.create_element("li");
        let second = doc.create_element("li");
        second.set_attribute("class", "active").unwrap();
        doc.root().append_child(&list).unwrap();
        list.append_child(&first).unwrap();
        list.append_child(&second).unwrap();

        assert_eq!(
            doc.query_selector_all(&doc.root(), "ul > li").unwrap(),
            vec![first, second.clone()]
        );
        assert_eq!(
            doc.query_selector_all(&list, "li.active").unwrap(),
            vec![second]
        );
        assert!(matches!(
            doc.query_selector_all(&list, "li:first-child"),
            Err(DomError::Selector(_))
        ));
    }

    #[test]
    fn test_compiled_caches_invalid_selectors() {
        let doc = Document::new();
        assert!(doc.compiled("[open]").is_some());
        assert!(doc.compiled("a:hover").is_none());
        assert!(doc.compiled("a:hover").is_none());
        assert_eq!(doc.inner.selectors.borrow().len(), 2);
    }
}
