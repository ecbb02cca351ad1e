//! Batched, all-or-nothing mutation of a document tree.

use super::extension::ExtensionNode;
use super::node::{NodeKey, NodeKind, TextFormat, TextRun};
use super::tree::{NodeRef, Tree};
use crate::error::{EditorError, Result};
use crate::selection::{Point, Selection};
use std::collections::BTreeSet;

/// Delta emitted once per committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    /// Document version after the commit.
    pub version: u64,
    /// Nodes created or modified (including parents whose child list changed).
    pub updated: BTreeSet<NodeKey>,
    /// Nodes that no longer exist.
    pub removed: BTreeSet<NodeKey>,
}

/// Working copy handed to [`super::Document::update`].
///
/// Edits land on a private copy of the tree; nothing is visible to readers
/// until the closure returns `Ok` and the copy is swapped in.
pub struct Transaction {
    pub(crate) tree: Tree,
    pub(crate) selection: Option<Selection>,
    created: BTreeSet<NodeKey>,
    dirty: BTreeSet<NodeKey>,
    removed: BTreeSet<NodeKey>,
}

/// Outcome of a successful transaction before it is folded into the document.
pub(crate) struct Committed {
    pub(crate) tree: Tree,
    pub(crate) selection: Option<Selection>,
    pub(crate) updated: BTreeSet<NodeKey>,
    pub(crate) removed: BTreeSet<NodeKey>,
}

impl Transaction {
    pub(crate) fn new(tree: Tree, selection: Option<Selection>) -> Self {
        Self {
            tree,
            selection,
            created: BTreeSet::new(),
            dirty: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    pub fn node(&self, key: NodeKey) -> Option<NodeRef<'_>> {
        NodeRef::new(&self.tree, key)
    }

    pub fn kind(&self, key: NodeKey) -> Result<&NodeKind> {
        Ok(&self.tree.entry(key)?.kind)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.tree.parent(key)
    }

    pub fn children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.tree.children(key).to_vec()
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        self.tree.index_in_parent(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.tree.contains(key)
    }

    /// `key` and its descendants in document order.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        if !self.tree.contains(key) {
            return Vec::new();
        }
        self.tree.preorder(key)
    }

    /// The direct child of the root containing `key`.
    pub fn top_level(&self, key: NodeKey) -> NodeKey {
        self.tree.top_level(key)
    }

    pub(crate) fn path(&self, key: NodeKey) -> Vec<usize> {
        self.tree.path(key)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Create a detached node. It must be attached before the transaction
    /// ends or it is discarded.
    pub fn create(&mut self, kind: NodeKind) -> NodeKey {
        let key = self.tree.allocate(kind);
        self.created.insert(key);
        self.dirty.insert(key);
        key
    }

    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let index = self.tree.entry(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Attach a detached `child` under `parent` at `index`.
    pub fn insert_child(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> Result<()> {
        if child == NodeKey::ROOT {
            return Err(EditorError::validation("root cannot be attached"));
        }
        let child_entry = self.tree.entry(child)?;
        if child_entry.parent.is_some() {
            return Err(EditorError::validation(format!(
                "node {} is already attached",
                child
            )));
        }
        if parent == child || self.tree.is_ancestor(child, parent) {
            return Err(EditorError::validation("insertion would create a cycle"));
        }
        let child_kind = child_entry.kind.clone();
        let parent_entry = self.tree.entry(parent)?;
        parent_entry.kind.check_child(&child_kind)?;
        if index > parent_entry.children.len() {
            return Err(EditorError::validation(format!(
                "index {} out of bounds for {}",
                index, parent
            )));
        }
        self.tree.entry_mut(parent)?.children.insert(index, child);
        self.tree.entry_mut(child)?.parent = Some(parent);
        self.dirty.insert(parent);
        self.dirty.insert(child);
        Ok(())
    }

    pub fn insert_after(&mut self, sibling: NodeKey, node: NodeKey) -> Result<()> {
        let parent = self
            .tree
            .parent(sibling)
            .ok_or_else(|| EditorError::validation("cannot insert next to a detached node"))?;
        let index = self.tree.index_in_parent(sibling).unwrap_or(0);
        self.insert_child(parent, index + 1, node)
    }

    pub fn insert_before(&mut self, sibling: NodeKey, node: NodeKey) -> Result<()> {
        let parent = self
            .tree
            .parent(sibling)
            .ok_or_else(|| EditorError::validation("cannot insert next to a detached node"))?;
        let index = self.tree.index_in_parent(sibling).unwrap_or(0);
        self.insert_child(parent, index, node)
    }

    /// Unlink `key` from its parent without destroying it, so it can be
    /// re-attached elsewhere.
    pub fn detach(&mut self, key: NodeKey) -> Result<()> {
        let Some(parent) = self.tree.entry(key)?.parent else {
            return Ok(());
        };
        self.tree.entry_mut(parent)?.children.retain(|child| *child != key);
        self.tree.entry_mut(key)?.parent = None;
        self.dirty.insert(parent);
        self.dirty.insert(key);
        Ok(())
    }

    /// Move `key` under `parent` at `index`.
    pub fn move_to(&mut self, key: NodeKey, parent: NodeKey, index: usize) -> Result<()> {
        self.detach(key)?;
        let len = self.tree.entry(parent)?.children.len();
        self.insert_child(parent, index.min(len), key)
    }

    /// Destroy `key` and its whole subtree.
    pub fn remove(&mut self, key: NodeKey) -> Result<()> {
        if key == NodeKey::ROOT {
            return Err(EditorError::validation("root cannot be removed"));
        }
        self.detach(key)?;
        for doomed in self.tree.preorder(key) {
            self.tree.remove_entry(doomed);
            self.dirty.remove(&doomed);
            self.removed.insert(doomed);
        }
        Ok(())
    }

    /// Replace the kind of an existing node, keeping its position and children.
    pub fn set_kind(&mut self, key: NodeKey, kind: NodeKind) -> Result<()> {
        if key == NodeKey::ROOT || matches!(kind, NodeKind::Root) {
            return Err(EditorError::validation("root kind is fixed"));
        }
        let entry = self.tree.entry_mut(key)?;
        if kind.is_leaf() && !entry.children.is_empty() {
            return Err(EditorError::validation(format!(
                "{} cannot hold children",
                kind.type_tag()
            )));
        }
        if entry.kind != kind {
            entry.kind = kind;
            self.dirty.insert(key);
        }
        Ok(())
    }

    fn text_mut(&mut self, key: NodeKey) -> Result<&mut TextRun> {
        match &mut self.tree.entry_mut(key)?.kind {
            NodeKind::Text(run) => Ok(run),
            other => Err(EditorError::validation(format!(
                "{} is a {} node, not text",
                key,
                other.type_tag()
            ))),
        }
    }

    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        let run = self.text_mut(key)?;
        if run.text != text {
            run.text = text;
            self.dirty.insert(key);
        }
        Ok(())
    }

    pub fn set_format(&mut self, key: NodeKey, format: TextFormat) -> Result<()> {
        let run = self.text_mut(key)?;
        if run.format != format {
            run.format = format;
            self.dirty.insert(key);
        }
        Ok(())
    }

    /// Split a text node at `offset` chars; the tail moves into a new sibling
    /// with the same format, whose key is returned.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> Result<NodeKey> {
        let run = self.text_mut(key)?;
        let split_at = run.byte_index(offset);
        let tail = run.text.split_off(split_at);
        let format = run.format;
        self.dirty.insert(key);
        let tail_key = self.create(NodeKind::Text(TextRun::new(tail, format)));
        self.insert_after(key, tail_key)?;
        Ok(tail_key)
    }

    /// Mutate an extension payload in place.
    pub fn update_extension<T, F>(&mut self, key: NodeKey, edit: F) -> Result<()>
    where
        T: ExtensionNode,
        F: FnOnce(&mut T),
    {
        let entry = self.tree.entry_mut(key)?;
        let NodeKind::Extension(ext) = &mut entry.kind else {
            return Err(EditorError::validation(format!(
                "{} is not an extension node",
                key
            )));
        };
        let node = ext.downcast_mut::<T>().ok_or_else(|| {
            EditorError::validation(format!("{} has unexpected extension type", key))
        })?;
        edit(node);
        self.dirty.insert(key);
        Ok(())
    }

    /// Clamp a point onto the tree, or `None` if its node is gone.
    pub(crate) fn resolve_point(&self, point: Point) -> Option<Point> {
        let entry = self.tree.get(point.key)?;
        let max = match &entry.kind {
            NodeKind::Text(run) => run.char_len(),
            NodeKind::Extension(_) => return None,
            _ => entry.children.len(),
        };
        Some(Point::new(point.key, point.offset.min(max)))
    }

    pub(crate) fn finish(mut self) -> Committed {
        // Anything left detached is unreachable from the root and is dropped.
        let detached: Vec<NodeKey> = self
            .tree
            .keys()
            .filter(|key| *key != NodeKey::ROOT && self.tree.parent(*key).is_none())
            .collect();
        for key in detached {
            for doomed in self.tree.preorder(key) {
                if self.tree.remove_entry(doomed).is_some() {
                    self.removed.insert(doomed);
                }
            }
        }
        let created = std::mem::take(&mut self.created);
        self.removed.retain(|key| !created.contains(key));
        self.dirty.retain(|key| self.tree.contains(*key));
        let selection = self.selection.and_then(|selection| {
            let anchor = self.resolve_point(selection.anchor)?;
            let focus = self.resolve_point(selection.focus)?;
            Some(Selection {
                anchor,
                focus,
                format: selection.format,
            })
        });
        Committed {
            tree: self.tree,
            selection,
            updated: self.dirty,
            removed: self.removed,
        }
    }
}
