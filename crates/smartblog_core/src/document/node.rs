//! Node kinds stored in the document tree.

use super::extension::ExtensionNode;
use crate::error::{EditorError, Result};
use std::fmt;

/// Stable identity of a node within one [`super::Document`].
///
/// Keys are never reused inside a document; they are not preserved across a
/// serialize/deserialize cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub(crate) u64);

impl NodeKey {
    /// Key of the single root node of every document.
    pub const ROOT: NodeKey = NodeKey(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Heading level `h1` through `h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingTag::H1 => "h1",
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
            HeadingTag::H4 => "h4",
            HeadingTag::H5 => "h5",
            HeadingTag::H6 => "h6",
        }
    }

    /// Heading for a numeric level (1-6).
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingTag::H1),
            2 => Some(HeadingTag::H2),
            3 => Some(HeadingTag::H3),
            4 => Some(HeadingTag::H4),
            5 => Some(HeadingTag::H5),
            6 => Some(HeadingTag::H6),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let level = raw.strip_prefix('h')?.parse::<u8>().ok()?;
        Self::from_level(level)
    }
}

/// Kind of a list container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Number => "number",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bullet" => Some(ListKind::Bullet),
            "number" => Some(ListKind::Number),
            _ => None,
        }
    }
}

/// Inline formats that can be toggled on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
}

impl FormatFlag {
    fn bit(self) -> u32 {
        match self {
            FormatFlag::Bold => 1,
            FormatFlag::Italic => 1 << 1,
            FormatFlag::Underline => 1 << 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatFlag::Bold => "bold",
            FormatFlag::Italic => "italic",
            FormatFlag::Underline => "underline",
        }
    }
}

/// Bitmask of inline formats. Unknown bits are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextFormat(u32);

impl TextFormat {
    pub const PLAIN: TextFormat = TextFormat(0);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn has(self, flag: FormatFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn toggled(self, flag: FormatFlag) -> Self {
        Self(self.0 ^ flag.bit())
    }

    pub fn with(self, flag: FormatFlag, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | flag.bit())
        } else {
            Self(self.0 & !flag.bit())
        }
    }
}

/// Payload of a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub text: String,
    pub format: TextFormat,
}

impl TextRun {
    pub fn new(text: impl Into<String>, format: TextFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextFormat::PLAIN)
    }

    /// Length in characters; selection offsets inside text are char offsets.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub(crate) fn byte_index(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}

/// The closed set of base node kinds plus the extension escape hatch.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading(HeadingTag),
    Quote,
    List(ListKind),
    ListItem,
    Table,
    TableRow,
    TableCell { header: bool },
    Text(TextRun),
    Extension(Box<dyn ExtensionNode>),
}

/// Type tags reserved by the base kinds.
pub const BASE_TYPE_TAGS: &[&str] = &[
    "root",
    "paragraph",
    "heading",
    "quote",
    "list",
    "listitem",
    "table",
    "tablerow",
    "tablecell",
    "text",
];

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text(TextRun::plain(text))
    }

    pub fn extension(node: impl ExtensionNode) -> Self {
        NodeKind::Extension(Box::new(node))
    }

    /// Stable serialized type tag.
    pub fn type_tag(&self) -> &str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading(_) => "heading",
            NodeKind::Quote => "quote",
            NodeKind::List(_) => "list",
            NodeKind::ListItem => "listitem",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tablerow",
            NodeKind::TableCell { .. } => "tablecell",
            NodeKind::Text(_) => "text",
            NodeKind::Extension(ext) => ext.type_tag(),
        }
    }

    /// Leaves carry a payload and never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Text(_) | NodeKind::Extension(_))
    }

    /// Blocks hold inline content directly (text runs, inline extensions).
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::Quote | NodeKind::ListItem
        )
    }

    pub fn is_inline(&self) -> bool {
        match self {
            NodeKind::Text(_) => true,
            NodeKind::Extension(ext) => ext.is_inline(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            NodeKind::Text(run) => Some(run),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&dyn ExtensionNode> {
        match self {
            NodeKind::Extension(ext) => Some(ext.as_ref()),
            _ => None,
        }
    }

    /// Reject child placements the tree can never hold.
    pub(crate) fn check_child(&self, child: &NodeKind) -> Result<()> {
        if self.is_leaf() {
            return Err(EditorError::validation(format!(
                "{} nodes cannot have children",
                self.type_tag()
            )));
        }
        if matches!(child, NodeKind::Root) {
            return Err(EditorError::validation("root cannot be nested"));
        }
        Ok(())
    }
}
