//! Document model: an ordered, typed node tree with transactional updates.
//!
//! The tree is stored in an arena keyed by [`NodeKey`]. Readers borrow it
//! through [`NodeRef`]; writers go through [`Document::update`], which applies
//! a batch of edits to a working copy and swaps it in only when the whole
//! batch succeeds. Each committed batch that touched anything yields exactly
//! one [`DocumentChange`].

mod extension;
mod node;
mod serialize;
mod transaction;
mod tree;

pub use extension::{ExtensionNode, ImportFn, NodeRegistry};
pub use node::{
    FormatFlag, HeadingTag, ListKind, NodeKey, NodeKind, TextFormat, TextRun, BASE_TYPE_TAGS,
};
pub use serialize::{SerializedDocument, SerializedNode};
pub use transaction::{DocumentChange, Transaction};
pub use tree::NodeRef;

use crate::error::{EditorError, Result};
use crate::selection::{Point, Selection};
use std::cmp::Ordering;
use tree::Tree;


/// The post body being edited.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) tree: Tree,
    selection: Option<Selection>,
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A root holding a single empty paragraph.
    pub fn new() -> Self {
        let mut doc = Self::bare();
        let paragraph = doc.tree.allocate(NodeKind::Paragraph);
        if let Ok(entry) = doc.tree.entry_mut(NodeKey::ROOT) {
            entry.children.push(paragraph);
        }
        if let Ok(entry) = doc.tree.entry_mut(paragraph) {
            entry.parent = Some(NodeKey::ROOT);
        }
        doc
    }

    /// A root with no children.
    pub(crate) fn bare() -> Self {
        Self {
            tree: Tree::new(),
            selection: None,
            version: 0,
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeKey::ROOT)
            .unwrap_or_else(|| unreachable!("documents always hold a root"))
    }

    pub fn node(&self, key: NodeKey) -> Option<NodeRef<'_>> {
        NodeRef::new(&self.tree, key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.tree.contains(key)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.children(NodeKey::ROOT).is_empty()
    }

    /// Incremented once per committed change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// All keys in document order, root first.
    pub fn keys_in_order(&self) -> Vec<NodeKey> {
        self.tree.preorder(NodeKey::ROOT)
    }

    pub fn parent_key(&self, key: NodeKey) -> Option<NodeKey> {
        self.tree.parent(key)
    }

    /// The direct child of the root containing `key`.
    pub fn top_level_key(&self, key: NodeKey) -> NodeKey {
        self.tree.top_level(key)
    }

    pub fn nearest_block_key(&self, key: NodeKey) -> Option<NodeKey> {
        self.tree.nearest_block(key)
    }

    /// Nearest strict ancestor of `key` matching `predicate`.
    pub fn find_ancestor(
        &self,
        key: NodeKey,
        predicate: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeKey> {
        self.tree
            .ancestors(key)
            .find(|ancestor| self.tree.kind(*ancestor).is_some_and(&predicate))
    }

    /// Plain-text projection; non-inline elements are separated by a blank line.
    pub fn text_content(&self) -> String {
        self.tree.text_content(NodeKey::ROOT)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Replace the active selection, seeding its pending format from the
    /// anchor text run.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] when a point refers to a missing
    /// node, an extension node, or an out-of-range offset.
    pub fn set_selection(&mut self, selection: Option<Selection>) -> Result<()> {
        let Some(mut selection) = selection else {
            self.selection = None;
            return Ok(());
        };
        self.check_point(selection.anchor)?;
        self.check_point(selection.focus)?;
        if let Some(run) = self.tree.kind(selection.anchor.key).and_then(NodeKind::as_text) {
            selection.format = run.format;
        }
        self.selection = Some(selection);
        Ok(())
    }

    /// Place a caret at the very end of the document.
    pub fn select_end(&mut self) {
        let last_text = self
            .keys_in_order()
            .into_iter()
            .rev()
            .find_map(|key| self.tree.kind(key)?.as_text().map(|run| (key, run.char_len())));
        let caret = match last_text {
            Some((key, len)) => Selection::caret(key, len),
            None => {
                let block = self
                    .keys_in_order()
                    .into_iter()
                    .rev()
                    .find(|key| self.tree.kind(*key).is_some_and(NodeKind::is_block));
                match block {
                    Some(key) => Selection::caret(key, self.tree.children(key).len()),
                    None => Selection::caret(NodeKey::ROOT, self.tree.children(NodeKey::ROOT).len()),
                }
            }
        };
        // Points built from live keys always validate.
        let _ = self.set_selection(Some(caret));
    }

    fn check_point(&self, point: Point) -> Result<()> {
        let entry = self.tree.entry(point.key)?;
        let max = match &entry.kind {
            NodeKind::Text(run) => run.char_len(),
            NodeKind::Extension(_) => {
                return Err(EditorError::validation(
                    "selection points cannot sit inside an extension node",
                ))
            }
            _ => entry.children.len(),
        };
        if point.offset > max {
            return Err(EditorError::validation(format!(
                "offset {} out of range for {}",
                point.offset, point.key
            )));
        }
        Ok(())
    }

    /// Compare two points in document order.
    pub fn compare_points(&self, a: Point, b: Point) -> Ordering {
        if a.key == b.key {
            return a.offset.cmp(&b.offset);
        }
        let path_a = self.point_path(a);
        let path_b = self.point_path(b);
        path_a.cmp(&path_b)
    }

    /// Position path of a point: element offsets behave like a child index.
    fn point_path(&self, point: Point) -> Vec<usize> {
        let mut path = self.tree.path(point.key);
        let is_text = self.tree.kind(point.key).is_some_and(|kind| kind.as_text().is_some());
        if !is_text {
            path.push(point.offset);
        }
        path
    }

    /// Selection endpoints ordered `(start, end)`.
    pub fn ordered_points(&self, selection: &Selection) -> (Point, Point) {
        if self.compare_points(selection.anchor, selection.focus) == Ordering::Greater {
            (selection.focus, selection.anchor)
        } else {
            (selection.anchor, selection.focus)
        }
    }

    /// Apply a batch of edits atomically.
    ///
    /// The closure edits a working copy; if it returns an error the document
    /// (tree, selection and version) is left exactly as it was. Selection
    /// changes made inside the batch are kept on success.
    ///
    /// # Returns
    /// `Some(change)` when at least one node was created, modified or
    /// removed; `None` for batches that touched nothing.
    pub fn update<F>(&mut self, edit: F) -> Result<Option<DocumentChange>>
    where
        F: FnOnce(&mut Transaction) -> Result<()>,
    {
        let mut txn = Transaction::new(self.tree.clone(), self.selection);
        edit(&mut txn)?;
        let committed = txn.finish();
        self.tree = committed.tree;
        self.selection = committed.selection;
        if committed.updated.is_empty() && committed.removed.is_empty() {
            return Ok(None);
        }
        self.version += 1;
        Ok(Some(DocumentChange {
            version: self.version,
            updated: committed.updated,
            removed: committed.removed,
        }))
    }

    /// Check the structural invariants: one root, consistent parent links,
    /// every node reachable, leaves childless.
    pub fn validate(&self) -> Result<()> {
        let reachable = self.tree.preorder(NodeKey::ROOT);
        if reachable.len() != self.tree.len() {
            return Err(EditorError::invalid(format!(
                "{} nodes are unreachable from the root",
                self.tree.len() - reachable.len()
            )));
        }
        for key in reachable {
            let entry = self.tree.entry(key)?;
            if key == NodeKey::ROOT {
                if entry.parent.is_some() || !matches!(entry.kind, NodeKind::Root) {
                    return Err(EditorError::invalid("malformed root"));
                }
            } else if matches!(entry.kind, NodeKind::Root) {
                return Err(EditorError::invalid(format!("nested root at {}", key)));
            }
            if entry.kind.is_leaf() && !entry.children.is_empty() {
                return Err(EditorError::invalid(format!("leaf {} has children", key)));
            }
            for child in &entry.children {
                if self.tree.parent(*child) != Some(key) {
                    return Err(EditorError::invalid(format!(
                        "child {} does not point back at {}",
                        child, key
                    )));
                }
            }
        }
        Ok(())
    }
}
