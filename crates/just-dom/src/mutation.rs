//! Deferred, batched notification of tree and attribute changes.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::document::{Document, DocumentInner};
use crate::node::{Node, WeakNode};

static NEXT_OBSERVER_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Attributes,
    ChildList,
}

#[derive(Clone, Debug)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: Node,
    pub attribute_name: Option<String>,
    /// Previous attribute value; only filled when the observer asked for it.
    pub old_value: Option<String>,
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
}

impl MutationRecord {
    pub(crate) fn attribute(target: Node, name: String, old_value: Option<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            attribute_name: Some(name),
            old_value,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
        }
    }

    pub(crate) fn child_list(target: Node, added: Vec<Node>, removed: Vec<Node>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            attribute_name: None,
            old_value: None,
            added_nodes: added,
            removed_nodes: removed,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ObserveOptions {
    pub attributes: bool,
    pub attribute_old_value: bool,
    /// Lowercase attribute names; `None` observes every attribute.
    pub attribute_filter: Option<Vec<String>>,
    pub child_list: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    pub fn attributes_with_old_value(filter: Vec<String>) -> Self {
        Self {
            attributes: true,
            attribute_old_value: true,
            attribute_filter: Some(filter),
            ..Self::default()
        }
    }
}

type ObserverCallback = Rc<dyn Fn(&[MutationRecord], &MutationObserver)>;

struct ObserverInner {
    id: usize,
    callback: ObserverCallback,
    targets: RefCell<Vec<(WeakNode, ObserveOptions)>>,
    records: RefCell<Vec<MutationRecord>>,
    document: RefCell<Weak<DocumentInner>>,
}

#[derive(Clone)]
pub struct MutationObserver {
    inner: Rc<ObserverInner>,
}

impl MutationObserver {
    pub fn new(callback: impl Fn(&[MutationRecord], &MutationObserver) + 'static) -> Self {
        Self {
            inner: Rc::new(ObserverInner {
                id: NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed),
                callback: Rc::new(callback),
                targets: RefCell::new(Vec::new()),
                records: RefCell::new(Vec::new()),
                document: RefCell::new(Weak::new()),
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &MutationObserver) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Starts (or re-configures) observation of `target`.
    pub fn observe(&self, target: &Node, options: ObserveOptions) {
        {
            let mut targets = self.inner.targets.borrow_mut();
            match targets
                .iter_mut()
                .find(|(node, _)| node.upgrade().map(|n| n.ptr_eq(target)).unwrap_or(false))
            {
                Some(entry) => entry.1 = options,
                None => targets.push((target.downgrade(), options)),
            }
        }
        if let Some(document) = target.owner_document() {
            *self.inner.document.borrow_mut() = document.downgrade_inner();
            document.register_observer(self);
        }
    }

    /// Stops observing every target and drops pending records.
    pub fn disconnect(&self) {
        self.inner.targets.borrow_mut().clear();
        self.inner.records.borrow_mut().clear();
        let document = mem::take(&mut *self.inner.document.borrow_mut());
        if let Some(document) = document.upgrade() {
            Document::from_inner(document).unregister_observer(self);
        }
    }

    pub fn take_records(&self) -> Vec<MutationRecord> {
        mem::take(&mut *self.inner.records.borrow_mut())
    }

    pub fn pending(&self) -> usize {
        self.inner.records.borrow().len()
    }

    pub(crate) fn enqueue(&self, record: &MutationRecord) {
        let mut include_old_value = None;
        for (target, options) in self.inner.targets.borrow().iter() {
            let Some(target) = target.upgrade() else {
                continue;
            };
            let in_scope = target.ptr_eq(&record.target)
                || (options.subtree && target.is_inclusive_ancestor_of(&record.target));
            if !in_scope {
                continue;
            }
            match record.kind {
                MutationKind::Attributes => {
                    if !options.attributes {
                        continue;
                    }
                    if let Some(filter) = &options.attribute_filter {
                        let name = record.attribute_name.as_deref().unwrap_or_default();
                        if !filter.iter().any(|allowed| allowed == name) {
                            continue;
                        }
                    }
                    include_old_value =
                        Some(include_old_value.unwrap_or(false) || options.attribute_old_value);
                }
                MutationKind::ChildList => {
                    if !options.child_list {
                        continue;
                    }
                    include_old_value = Some(false);
                }
            }
        }
        if let Some(include_old_value) = include_old_value {
            let mut record = record.clone();
            if !include_old_value {
                record.old_value = None;
            }
            self.inner.records.borrow_mut().push(record);
        }
    }

    /// Hands pending records to the callback. Returns false when there was
    /// nothing to deliver.
    pub(crate) fn deliver(&self) -> bool {
        let records = self.take_records();
        if records.is_empty() {
            return false;
        }
        let callback = self.inner.callback.clone();
        callback(&records, self);
        true
    }
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("id", &self.inner.id)
            .field("targets", &self.inner.targets.borrow().len())
            .field("pending", &self.inner.records.borrow().len())
            .finish()
    }
}
