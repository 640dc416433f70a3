//! Queued mutation observers.
//!
//! Mutations are recorded into per-observer queues at the moment they happen
//! and handed to callbacks only when the document is flushed, so callbacks
//! never run inside the mutating call.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tether_tree::{MutationCallback, MutationRecord, ObserveOptions};

use crate::document::DocumentInner;
use crate::node::Node;

pub(crate) struct Observer {
    root: Node,
    options: ObserveOptions,
    queue: RefCell<Vec<MutationRecord<Node>>>,
    callback: RefCell<MutationCallback<Node>>,
    active: Cell<bool>,
}

impl Observer {
    pub(crate) fn new(
        root: Node,
        options: ObserveOptions,
        callback: MutationCallback<Node>,
    ) -> Self {
        Self {
            root,
            options,
            queue: RefCell::new(Vec::new()),
            callback: RefCell::new(callback),
            active: Cell::new(true),
        }
    }

    /// Queue `record` if it concerns this observer.
    pub(crate) fn offer(&self, target: &Node, record: &MutationRecord<Node>) {
        if !self.active.get() {
            return;
        }

        let interested = match record {
            MutationRecord::ChildList { .. } => self.options.child_list,
            MutationRecord::Attributes { name, .. } => self.options.accepts_attribute(name),
        };
        let in_scope =
            self.root == *target || (self.options.subtree && self.root.contains(target));

        if interested && in_scope {
            self.queue.borrow_mut().push(record.clone());
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.active.get() && !self.queue.borrow().is_empty()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Hand the queued batch to the callback. Returns whether a batch was delivered.
    pub(crate) fn deliver(&self) -> bool {
        let batch = self.queue.take();
        if batch.is_empty() || !self.active.get() {
            return false;
        }

        let Ok(mut callback) = self.callback.try_borrow_mut() else {
            // Re-entrant delivery from inside this observer's own callback.
            let mut queue = self.queue.borrow_mut();
            let newer = std::mem::replace(&mut *queue, batch);
            queue.extend(newer);
            return false;
        };
        (*callback)(&batch);
        true
    }

    fn deactivate(&self) {
        self.active.set(false);
        self.queue.borrow_mut().clear();
    }
}

/// Keeps a mutation subscription alive.
///
/// Uses RAII: dropping the handle stops delivery and discards queued records.
pub struct ObserverHandle {
    observer: Rc<Observer>,
    document: Weak<DocumentInner>,
}

impl ObserverHandle {
    pub(crate) fn new(observer: Rc<Observer>, document: Weak<DocumentInner>) -> Self {
        Self { observer, document }
    }

    /// Records queued but not yet delivered.
    pub fn pending(&self) -> usize {
        self.observer.pending()
    }

    /// Stop observing immediately (consumes the handle).
    pub fn disconnect(self) {
        drop(self);
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.observer.deactivate();
        if let Some(document) = self.document.upgrade() {
            document.unregister(&self.observer);
        }
    }
}
