//! Arena storage for the node tree and borrowed read views over it.

use super::extension::ExtensionNode;
use super::node::{NodeKey, NodeKind, TextRun};
use crate::error::{EditorError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct NodeEntry {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

/// Nodes keyed by [`NodeKey`]. Parents are referenced by key only; ownership
/// flows from the root down through `children`.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: HashMap<NodeKey, NodeEntry>,
    next_key: u64,
}

impl Tree {
    pub(crate) fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeKey::ROOT,
            NodeEntry {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self { nodes, next_key: 1 }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub(crate) fn get(&self, key: NodeKey) -> Option<&NodeEntry> {
        self.nodes.get(&key)
    }

    pub(crate) fn entry(&self, key: NodeKey) -> Result<&NodeEntry> {
        self.nodes.get(&key).ok_or(EditorError::NodeNotFound(key))
    }

    pub(crate) fn entry_mut(&mut self, key: NodeKey) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(&key)
            .ok_or(EditorError::NodeNotFound(key))
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys().copied()
    }

    /// Add a detached node and return its fresh key.
    pub(crate) fn allocate(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(
            key,
            NodeEntry {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    pub(crate) fn remove_entry(&mut self, key: NodeKey) -> Option<NodeEntry> {
        self.nodes.remove(&key)
    }

    pub(crate) fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&key).map(|entry| &entry.kind)
    }

    pub(crate) fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|entry| entry.parent)
    }

    pub(crate) fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|child| *child == key)
    }

    /// Strict ancestors of `key`, nearest first.
    pub(crate) fn ancestors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        std::iter::successors(self.parent(key), move |current| self.parent(*current))
    }

    pub(crate) fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        self.ancestors(key).any(|candidate| candidate == ancestor)
    }

    /// `key` and all of its descendants in document order.
    pub(crate) fn preorder(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Child-index path from the root; paths compare in document order.
    pub(crate) fn path(&self, key: NodeKey) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = key;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            current = self.parent(current).unwrap_or(NodeKey::ROOT);
        }
        path.reverse();
        path
    }

    /// The direct child of the root that contains `key` (or the root itself).
    pub(crate) fn top_level(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        while let Some(parent) = self.parent(current) {
            if parent == NodeKey::ROOT {
                return current;
            }
            current = parent;
        }
        current
    }

    /// `key` itself or its nearest ancestor that holds inline content.
    pub(crate) fn nearest_block(&self, key: NodeKey) -> Option<NodeKey> {
        std::iter::once(key)
            .chain(self.ancestors(key))
            .find(|candidate| self.kind(*candidate).is_some_and(NodeKind::is_block))
    }

    pub(crate) fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.write_text(key, &mut out);
        out
    }

    fn write_text(&self, key: NodeKey, out: &mut String) {
        let Some(entry) = self.nodes.get(&key) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(run) => out.push_str(&run.text),
            NodeKind::Extension(ext) => out.push_str(&ext.text_content()),
            _ => {
                let last = entry.children.len().saturating_sub(1);
                for (index, child) in entry.children.iter().enumerate() {
                    self.write_text(*child, out);
                    let separates = self
                        .kind(*child)
                        .is_some_and(|kind| !kind.is_leaf() && !kind.is_inline());
                    if separates && index != last {
                        out.push_str("\n\n");
                    }
                }
            }
        }
    }
}

/// Borrowed, read-only view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    key: NodeKey,
    entry: &'a NodeEntry,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(tree: &'a Tree, key: NodeKey) -> Option<Self> {
        tree.get(key).map(|entry| Self { tree, key, entry })
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.entry.kind
    }

    pub fn type_tag(&self) -> &'a str {
        self.entry.kind.type_tag()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.entry
            .parent
            .and_then(|parent| NodeRef::new(self.tree, parent))
    }

    pub fn child_keys(&self) -> &'a [NodeKey] {
        &self.entry.children
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.entry
            .children
            .iter()
            .filter_map(move |child| NodeRef::new(tree, *child))
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        self.entry
            .children
            .get(index)
            .and_then(|child| NodeRef::new(self.tree, *child))
    }

    pub fn as_text(&self) -> Option<&'a TextRun> {
        self.entry.kind.as_text()
    }

    pub fn extension<T: ExtensionNode>(&self) -> Option<&'a T> {
        self.entry.kind.as_extension()?.downcast_ref::<T>()
    }

    pub fn text_content(&self) -> String {
        self.tree.text_content(self.key)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.key)
            .field("kind", &self.entry.kind)
            .field("children", &self.entry.children)
            .finish()
    }
}
