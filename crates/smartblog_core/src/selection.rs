//! Transient cursor/range positions inside a document.

use crate::document::{FormatFlag, NodeKey, TextFormat};

/// A position inside the tree.
///
/// On text nodes `offset` counts characters; on element nodes it is a child
/// index (`0..=children.len()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// Active range selection. Never persisted.
///
/// `format` is the pending inline format applied to newly typed text; it is
/// seeded from the anchor's text run whenever the selection moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
    pub format: TextFormat,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::PLAIN,
        }
    }

    /// Collapsed selection (a caret).
    pub fn caret(key: NodeKey, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn has_format(&self, flag: FormatFlag) -> bool {
        self.format.has(flag)
    }
}
