use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::DomError;
use crate::markup;
use crate::mutation::{MutationObserver, MutationRecord};
use crate::node::{Node, NodeKind};
use crate::registry::ElementRegistry;

/// Upper bound on observer delivery rounds in one `flush_mutations` call.
const MAX_FLUSH_ROUNDS: usize = 64;

pub(crate) struct DocumentInner {
    node: Node,
    body: Node,
    pub(crate) registry: ElementRegistry,
    observers: RefCell<Vec<MutationObserver>>,
}

impl DocumentInner {
    pub(crate) fn queue_mutation(&self, record: MutationRecord) {
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer.enqueue(&record);
        }
    }
}

/// An element tree rooted at a document node, together with its custom
/// element registry and mutation observer queue.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<DocumentInner>| {
            let node = Node::create(NodeKind::Document, weak.clone());
            let body = Node::create(NodeKind::Element("body".to_string()), weak.clone());
            node.push_child_unchecked(&body);
            DocumentInner {
                node,
                body,
                registry: ElementRegistry::default(),
                observers: RefCell::new(Vec::new()),
            }
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade_inner(&self) -> Weak<DocumentInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn inner(&self) -> &DocumentInner {
        &self.inner
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The document node, root of the tree.
    pub fn node(&self) -> Node {
        self.inner.node.clone()
    }

    pub fn body(&self) -> Node {
        self.inner.body.clone()
    }

    /// Creates an element, upgrading it when `tag` is a defined custom
    /// element. Construction failures are logged and leave the element
    /// un-upgraded.
    pub fn create_element(&self, tag: &str) -> Node {
        let node = self.new_element(tag);
        if let Err(err) = self.try_upgrade(&node) {
            log::error!("{err}");
        }
        node
    }

    pub fn try_create_element(&self, tag: &str) -> Result<Node, DomError> {
        let node = self.new_element(tag);
        self.try_upgrade(&node)?;
        Ok(node)
    }

    /// Creates a customized built-in: `<tag is="name">`.
    pub fn create_element_is(&self, tag: &str, is: &str) -> Node {
        let node = self.new_element(tag);
        node.set_attribute("is", is);
        if let Err(err) = self.try_upgrade(&node) {
            log::error!("{err}");
        }
        node
    }

    fn new_element(&self, tag: &str) -> Node {
        Node::create(
            NodeKind::Element(tag.to_ascii_lowercase()),
            self.downgrade_inner(),
        )
    }

    pub fn create_text_node(&self, text: &str) -> Node {
        let node = Node::create(NodeKind::Text, self.downgrade_inner());
        node.set_text_unchecked(text);
        node
    }

    pub fn create_fragment(&self) -> Node {
        Node::create(NodeKind::Fragment, self.downgrade_inner())
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.inner.node.get_element_by_id(id)
    }

    /// Parses markup into a fragment owned by this document. Elements outside
    /// `<template>` contents are upgraded.
    pub fn parse_fragment(&self, source: &str) -> Result<Node, DomError> {
        let fragment = markup::parse_fragment(self.downgrade_inner(), source)?;
        self.upgrade_all(&fragment);
        Ok(fragment)
    }

    pub(crate) fn upgrade_all(&self, root: &Node) {
        for node in root.descendants() {
            if let Err(err) = self.try_upgrade(&node) {
                log::error!("{err}");
            }
        }
    }

    /// Moves `node` (removing it from its parent) into this document.
    pub fn adopt_node(&self, node: &Node) -> Result<(), DomError> {
        if matches!(node.kind(), NodeKind::Document) {
            return Err(DomError::HierarchyRequest {
                parent: self.inner.node.describe(),
                child: node.describe(),
            });
        }
        node.remove();
        self.adopt_subtree(node);
        Ok(())
    }

    pub(crate) fn adopt_subtree(&self, node: &Node) {
        let old = node.document_inner();
        if old
            .as_ref()
            .map(|old| Rc::ptr_eq(old, &self.inner))
            .unwrap_or(false)
        {
            return;
        }
        let mut nodes = Vec::new();
        node.collect_shadow_including(&mut nodes);
        for node in &nodes {
            node.set_document(self.downgrade_inner());
            if let Some(content) = node.template_content() {
                let mut inert = Vec::new();
                content.collect_shadow_including(&mut inert);
                for inert in inert {
                    inert.set_document(self.downgrade_inner());
                }
            }
        }
        let Some(old) = old.map(Document::from_inner) else {
            return;
        };
        log::trace!("adopted {} node(s) into a new document", nodes.len());
        for node in nodes {
            if let Some(reactions) = node.reactions() {
                reactions.adopted(&node, &old, self);
            }
        }
    }

    pub(crate) fn register_observer(&self, observer: &MutationObserver) {
        let mut observers = self.inner.observers.borrow_mut();
        if !observers.iter().any(|existing| existing.ptr_eq(observer)) {
            observers.push(observer.clone());
        }
    }

    pub(crate) fn unregister_observer(&self, observer: &MutationObserver) {
        self.inner
            .observers
            .borrow_mut()
            .retain(|existing| !existing.ptr_eq(observer));
    }

    /// Delivers queued mutation records to their observers and repeats until
    /// no observer has pending records. Returns the number of delivered
    /// batches.
    pub fn flush_mutations(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_FLUSH_ROUNDS {
            let observers = self.inner.observers.borrow().clone();
            let mut progressed = false;
            for observer in observers {
                if observer.deliver() {
                    delivered += 1;
                    progressed = true;
                }
            }
            if !progressed {
                return delivered;
            }
        }
        log::warn!(
            "mutation delivery did not settle after {MAX_FLUSH_ROUNDS} rounds; remaining records stay queued"
        );
        delivered
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("node", &self.inner.node)
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}
