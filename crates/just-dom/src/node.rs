use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;

use crate::document::{Document, DocumentInner};
use crate::error::DomError;
use crate::event::Listener;
use crate::markup;
use crate::mutation::MutationRecord;
use crate::registry::ElementReactions;

pub type NodeId = usize;

static NEXT_NODE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadowMode {
    #[default]
    Open,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(String),
    Text,
    Fragment,
    ShadowRoot(ShadowMode),
}

pub(crate) struct NodeInner {
    id: NodeId,
    kind: NodeKind,
    document: RefCell<Weak<DocumentInner>>,
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<Node>>,
    attributes: RefCell<IndexMap<String, String>>,
    text: RefCell<String>,
    shadow_root: RefCell<Option<Node>>,
    shadow_host: RefCell<Weak<NodeInner>>,
    template_content: RefCell<Option<Node>>,
    pub(crate) listeners: RefCell<Vec<Listener>>,
    reactions: RefCell<Option<Rc<dyn ElementReactions>>>,
    upgrade_failed: Cell<bool>,
}

/// Shared handle to a node in a host tree. Clones refer to the same node.
#[derive(Clone)]
pub struct Node {
    pub(crate) inner: Rc<NodeInner>,
}

#[derive(Clone, Default)]
pub struct WeakNode {
    inner: Weak<NodeInner>,
}

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }
}

impl Node {
    pub(crate) fn create(kind: NodeKind, document: Weak<DocumentInner>) -> Node {
        let is_template = matches!(&kind, NodeKind::Element(name) if name == "template");
        let node = Node {
            inner: Rc::new(NodeInner {
                id: next_node_id(),
                kind,
                document: RefCell::new(document.clone()),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                attributes: RefCell::new(IndexMap::new()),
                text: RefCell::new(String::new()),
                shadow_root: RefCell::new(None),
                shadow_host: RefCell::new(Weak::new()),
                template_content: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                reactions: RefCell::new(None),
                upgrade_failed: Cell::new(false),
            }),
        };
        if is_template {
            let content = Node::create(NodeKind::Fragment, document);
            *node.inner.template_content.borrow_mut() = Some(content);
        }
        node
    }

    pub(crate) fn create_related(&self, kind: NodeKind) -> Node {
        let document = self.inner.document.borrow().clone();
        Node::create(kind, document)
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.inner.kind
    }

    /// Lowercase tag name for elements, `None` for every other node kind.
    pub fn local_name(&self) -> Option<&str> {
        match &self.inner.kind {
            NodeKind::Element(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Text)
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn owner_document(&self) -> Option<Document> {
        self.document_inner().map(Document::from_inner)
    }

    pub(crate) fn document_inner(&self) -> Option<Rc<DocumentInner>> {
        self.inner.document.borrow().upgrade()
    }

    pub(crate) fn set_document(&self, document: Weak<DocumentInner>) {
        *self.inner.document.borrow_mut() = document;
    }

    // ---------------------------------------------------------------------
    // Tree structure
    // ---------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.inner.parent.borrow().upgrade().map(|inner| Node { inner })
    }

    pub fn parent_element(&self) -> Option<Node> {
        self.parent().filter(Node::is_element)
    }

    pub fn children(&self) -> Vec<Node> {
        self.inner.children.borrow().clone()
    }

    pub fn child_elements(&self) -> Vec<Node> {
        self.inner
            .children
            .borrow()
            .iter()
            .filter(|child| child.is_element())
            .cloned()
            .collect()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.inner.children.borrow().first().cloned()
    }

    pub fn has_children(&self) -> bool {
        !self.inner.children.borrow().is_empty()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.inner.children.borrow();
        let index = siblings.iter().position(|sibling| sibling.ptr_eq(self))?;
        siblings.get(index + 1).cloned()
    }

    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    pub fn append(&self, nodes: impl IntoIterator<Item = Node>) -> Result<(), DomError> {
        for node in nodes {
            self.append_child(&node)?;
        }
        Ok(())
    }

    /// Inserts `child` before `reference`, or last when `reference` is `None`.
    ///
    /// Fragments are flattened into their children. A node that already has a
    /// parent is removed from it first, and nodes from another document are
    /// adopted. Elements that end up connected are upgraded when their tag is
    /// defined and receive their `connected` reaction once the insertion is
    /// complete.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        self.ensure_insertable(child)?;
        if let Some(reference) = reference {
            let is_child = reference
                .parent()
                .map(|parent| parent.ptr_eq(self))
                .unwrap_or(false);
            if !is_child {
                return Err(DomError::NotAChild {
                    parent: self.id(),
                    child: reference.id(),
                });
            }
        }
        let reference = match reference {
            Some(reference) if reference.ptr_eq(child) => child.next_sibling(),
            other => other.cloned(),
        };

        let nodes = if matches!(child.kind(), NodeKind::Fragment) {
            child.take_children()
        } else {
            child.remove();
            vec![child.clone()]
        };
        if nodes.is_empty() {
            return Ok(());
        }

        if let Some(document) = self.owner_document() {
            for node in &nodes {
                document.adopt_subtree(node);
            }
        }

        {
            let mut children = self.inner.children.borrow_mut();
            let index = reference
                .as_ref()
                .and_then(|reference| children.iter().position(|c| c.ptr_eq(reference)))
                .unwrap_or(children.len());
            for (offset, node) in nodes.iter().enumerate() {
                *node.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
                children.insert(index + offset, node.clone());
            }
        }
        self.queue_record(MutationRecord::child_list(
            self.clone(),
            nodes.clone(),
            Vec::new(),
        ));

        if self.is_connected() {
            let mut inserted = Vec::new();
            for node in &nodes {
                node.collect_shadow_including(&mut inserted);
            }
            for node in inserted {
                node.upgrade_and_connect();
            }
        }
        Ok(())
    }

    pub fn remove_child(&self, child: &Node) -> Result<(), DomError> {
        let index = self
            .inner
            .children
            .borrow()
            .iter()
            .position(|c| c.ptr_eq(child))
            .ok_or(DomError::NotAChild {
                parent: self.id(),
                child: child.id(),
            })?;
        let was_connected = child.is_connected();
        self.inner.children.borrow_mut().remove(index);
        *child.inner.parent.borrow_mut() = Weak::new();
        self.queue_record(MutationRecord::child_list(
            self.clone(),
            Vec::new(),
            vec![child.clone()],
        ));

        if was_connected {
            let mut removed = Vec::new();
            child.collect_shadow_including(&mut removed);
            for node in removed {
                if let Some(reactions) = node.reactions() {
                    reactions.disconnected(&node);
                }
            }
        }
        Ok(())
    }

    /// Detaches this node from its parent, if any.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            // The parent link was just read, so the child is present.
            let _ = parent.remove_child(self);
        }
    }

    pub(crate) fn push_child_unchecked(&self, child: &Node) {
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.borrow_mut().push(child.clone());
    }

    fn take_children(&self) -> Vec<Node> {
        let children = mem::take(&mut *self.inner.children.borrow_mut());
        for child in &children {
            *child.inner.parent.borrow_mut() = Weak::new();
        }
        children
    }

    fn ensure_insertable(&self, child: &Node) -> Result<(), DomError> {
        let parent_ok = matches!(
            self.kind(),
            NodeKind::Document | NodeKind::Element(_) | NodeKind::Fragment | NodeKind::ShadowRoot(_)
        );
        let child_ok = !matches!(child.kind(), NodeKind::Document | NodeKind::ShadowRoot(_));
        if !parent_ok || !child_ok || child.is_host_including_ancestor_of(self) {
            return Err(DomError::HierarchyRequest {
                parent: self.describe(),
                child: child.describe(),
            });
        }
        Ok(())
    }

    /// True when `self` is `other` or one of its ancestors, without crossing
    /// shadow boundaries.
    pub fn is_inclusive_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    fn is_host_including_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent().or_else(|| node.shadow_host());
        }
        false
    }

    /// Connected means the node's shadow-including root is a document node.
    pub fn is_connected(&self) -> bool {
        let mut current = self.clone();
        loop {
            let next = match current.kind() {
                NodeKind::Document => return true,
                NodeKind::ShadowRoot(_) => current.shadow_host(),
                _ => current.parent(),
            };
            match next {
                Some(node) => current = node,
                None => return false,
            }
        }
    }

    pub(crate) fn collect_shadow_including(&self, out: &mut Vec<Node>) {
        out.push(self.clone());
        if let Some(root) = self.shadow_root() {
            for child in root.children() {
                child.collect_shadow_including(out);
            }
        }
        for child in self.children() {
            child.collect_shadow_including(out);
        }
    }

    fn upgrade_and_connect(&self) {
        if !self.is_element() {
            return;
        }
        if !self.is_upgraded() {
            if let Some(document) = self.owner_document() {
                if let Err(err) = document.try_upgrade(self) {
                    log::error!("{err}");
                }
            }
        }
        if let Some(reactions) = self.reactions() {
            reactions.connected(self);
        }
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner
            .attributes
            .borrow()
            .contains_key(&name.to_ascii_lowercase())
    }

    /// Sets an attribute on an element. Every write is reported to mutation
    /// observers, including writes that do not change the stored string.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        if !self.is_element() {
            return;
        }
        let name = name.to_ascii_lowercase();
        let old_value = self
            .inner
            .attributes
            .borrow_mut()
            .insert(name.clone(), value.into());
        self.queue_record(MutationRecord::attribute(self.clone(), name, old_value));
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let old_value = self.inner.attributes.borrow_mut().shift_remove(&name);
        match old_value {
            Some(old_value) => {
                self.queue_record(MutationRecord::attribute(
                    self.clone(),
                    name,
                    Some(old_value),
                ));
                true
            }
            None => false,
        }
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.inner.attributes.borrow().keys().cloned().collect()
    }

    fn queue_record(&self, record: MutationRecord) {
        if let Some(document) = self.document_inner() {
            document.queue_mutation(record);
        }
    }

    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    pub fn text_content(&self) -> String {
        match self.kind() {
            NodeKind::Text => self.inner.text.borrow().clone(),
            NodeKind::Document => String::new(),
            _ => {
                let mut out = String::new();
                self.collect_text(&mut out);
                out
            }
        }
    }

    fn collect_text(&self, out: &mut String) {
        for child in self.children() {
            match child.kind() {
                NodeKind::Text => out.push_str(&child.inner.text.borrow()),
                NodeKind::Element(_) | NodeKind::Fragment => child.collect_text(out),
                _ => {}
            }
        }
    }

    /// Replaces all children with a single text node (none for empty text).
    pub fn set_text_content(&self, text: &str) {
        match self.kind() {
            NodeKind::Text => *self.inner.text.borrow_mut() = text.to_string(),
            NodeKind::Document => {}
            _ => {
                for child in self.children() {
                    let _ = self.remove_child(&child);
                }
                if !text.is_empty() {
                    let node = self.create_related(NodeKind::Text);
                    *node.inner.text.borrow_mut() = text.to_string();
                    let _ = self.append_child(&node);
                }
            }
        }
    }

    pub(crate) fn set_text_unchecked(&self, text: &str) {
        *self.inner.text.borrow_mut() = text.to_string();
    }

    // ---------------------------------------------------------------------
    // Cloning
    // ---------------------------------------------------------------------

    /// Copies this node (and its descendants when `deep`). `<template>`
    /// contents are copied but stay inert; other cloned elements are upgraded
    /// when their tag is defined.
    pub fn clone_node(&self, deep: bool) -> Node {
        let mut created = Vec::new();
        let clone = self.clone_into(deep, &mut created);
        if let Some(document) = self.owner_document() {
            for node in created {
                if let Err(err) = document.try_upgrade(&node) {
                    log::error!("{err}");
                }
            }
        }
        clone
    }

    fn clone_into(&self, deep: bool, created: &mut Vec<Node>) -> Node {
        let kind = match self.kind() {
            NodeKind::Document | NodeKind::ShadowRoot(_) => NodeKind::Fragment,
            other => other.clone(),
        };
        let clone = self.create_related(kind);
        *clone.inner.attributes.borrow_mut() = self.inner.attributes.borrow().clone();
        *clone.inner.text.borrow_mut() = self.inner.text.borrow().clone();
        if clone.is_element() {
            created.push(clone.clone());
        }
        if deep {
            if let Some(content) = self.template_content() {
                let copied = content.clone_into(true, &mut Vec::new());
                *clone.inner.template_content.borrow_mut() = Some(copied);
            }
            for child in self.children() {
                let copied = child.clone_into(true, created);
                clone.push_child_unchecked(&copied);
            }
        }
        clone
    }

    // ---------------------------------------------------------------------
    // Shadow roots and templates
    // ---------------------------------------------------------------------

    pub fn attach_shadow(&self, mode: ShadowMode) -> Result<Node, DomError> {
        let Some(name) = self.local_name() else {
            return Err(DomError::NotShadowHost {
                node: self.describe(),
            });
        };
        if self.inner.shadow_root.borrow().is_some() {
            return Err(DomError::ShadowRootExists {
                element: name.to_string(),
            });
        }
        let root = self.create_related(NodeKind::ShadowRoot(mode));
        *root.inner.shadow_host.borrow_mut() = Rc::downgrade(&self.inner);
        *self.inner.shadow_root.borrow_mut() = Some(root.clone());
        Ok(root)
    }

    /// The attached shadow root. Closed roots are returned as well; the mode
    /// is informational in this host.
    pub fn shadow_root(&self) -> Option<Node> {
        self.inner.shadow_root.borrow().clone()
    }

    pub fn shadow_host(&self) -> Option<Node> {
        self.inner
            .shadow_host
            .borrow()
            .upgrade()
            .map(|inner| Node { inner })
    }

    pub fn template_content(&self) -> Option<Node> {
        self.inner.template_content.borrow().clone()
    }

    // ---------------------------------------------------------------------
    // Queries (never enter shadow roots or template contents)
    // ---------------------------------------------------------------------

    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        for child in self.children() {
            child.collect_inclusive(&mut out);
        }
        out
    }

    fn collect_inclusive(&self, out: &mut Vec<Node>) {
        out.push(self.clone());
        for child in self.children() {
            child.collect_inclusive(out);
        }
    }

    pub fn query_all(&self, predicate: impl Fn(&Node) -> bool) -> Vec<Node> {
        self.descendants()
            .into_iter()
            .filter(|node| predicate(node))
            .collect()
    }

    pub fn query(&self, predicate: impl Fn(&Node) -> bool) -> Option<Node> {
        self.descendants().into_iter().find(|node| predicate(node))
    }

    pub fn elements_with_attribute(&self, name: &str) -> Vec<Node> {
        self.query_all(|node| node.is_element() && node.has_attribute(name))
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<Node> {
        let tag = tag.to_ascii_lowercase();
        self.query_all(|node| node.local_name() == Some(tag.as_str()))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.query(|node| node.is_element() && node.get_attribute("id").as_deref() == Some(id))
    }

    // ---------------------------------------------------------------------
    // Markup
    // ---------------------------------------------------------------------

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        let source = self.template_content().unwrap_or_else(|| self.clone());
        for child in source.children() {
            markup::serialize(&child, &mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        match self.kind() {
            NodeKind::Element(_) | NodeKind::Text => {
                let mut out = String::new();
                markup::serialize(self, &mut out);
                out
            }
            _ => self.inner_html(),
        }
    }

    /// Replaces the children (or a template's content) with parsed markup.
    pub fn set_inner_html(&self, source: &str) -> Result<(), DomError> {
        let content = self.template_content();
        let target = content.clone().unwrap_or_else(|| self.clone());
        let document = self.inner.document.borrow().clone();
        let fragment = markup::parse_fragment(document, source)?;
        if content.is_none() {
            if let Some(document) = self.owner_document() {
                document.upgrade_all(&fragment);
            }
        }
        for child in target.children() {
            target.remove_child(&child)?;
        }
        target.append_child(&fragment)
    }

    // ---------------------------------------------------------------------
    // Custom element state
    // ---------------------------------------------------------------------

    pub fn reactions(&self) -> Option<Rc<dyn ElementReactions>> {
        self.inner.reactions.borrow().clone()
    }

    pub fn is_upgraded(&self) -> bool {
        self.inner.reactions.borrow().is_some()
    }

    pub(crate) fn set_reactions(&self, reactions: Rc<dyn ElementReactions>) {
        *self.inner.reactions.borrow_mut() = Some(reactions);
    }

    pub(crate) fn upgrade_failed(&self) -> bool {
        self.inner.upgrade_failed.get()
    }

    pub(crate) fn mark_upgrade_failed(&self) {
        self.inner.upgrade_failed.set(true);
    }

    /// Short human readable label, e.g. `<page-nav>` or `#text`.
    pub fn describe(&self) -> String {
        match self.kind() {
            NodeKind::Document => "#document".to_string(),
            NodeKind::Element(name) => format!("<{name}>"),
            NodeKind::Text => "#text".to_string(),
            NodeKind::Fragment => "#document-fragment".to_string(),
            NodeKind::ShadowRoot(_) => "#shadow-root".to_string(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({} #{})", self.describe(), self.inner.id)
    }
}
