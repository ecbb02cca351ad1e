//! Versioned JSON form of the document tree.
//!
//! ```json
//! {"root":{"type":"root","version":1,"children":[
//!   {"type":"paragraph","version":1,"children":[
//!     {"type":"text","version":1,"format":1,"text":"Hello"},
//!     {"type":"math","version":1,"inline":true,"latex":"x^2"}]}]}}
//! ```

use super::node::{HeadingTag, ListKind, NodeKey, NodeKind, TextFormat, TextRun};
use super::tree::Tree;
use super::{Document, NodeRegistry};
use crate::constants::{EMPTY_DOCUMENT, NODE_FORMAT_VERSION};
use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_version() -> u32 {
    NODE_FORMAT_VERSION
}

/// One serialized node: `type`, `version`, optional `children`, plus the
/// kind-specific fields flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SerializedNode>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Top-level envelope of a serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedDocument {
    pub root: SerializedNode,
}

impl SerializedNode {
    fn element(node_type: &str, children: Vec<SerializedNode>) -> Self {
        Self {
            node_type: node_type.to_string(),
            version: NODE_FORMAT_VERSION,
            children: Some(children),
            fields: Map::new(),
        }
    }

    fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

impl Document {
    /// Export the tree into its serialized form.
    pub fn to_serialized(&self) -> SerializedDocument {
        SerializedDocument {
            root: export_node(&self.tree, NodeKey::ROOT),
        }
    }

    /// Serialize to a compact JSON string.
    ///
    /// # Errors
    /// Returns [`EditorError::Serialization`] if an extension exports fields
    /// that cannot be encoded.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_serialized())?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_serialized())?)
    }

    /// Rebuild a document from JSON.
    ///
    /// An empty string or the `{}` sentinel yields [`Document::new`]. Node keys
    /// are freshly assigned.
    ///
    /// # Errors
    /// - [`EditorError::UnknownNodeType`] when a node's tag is neither a base
    ///   kind nor registered in `registry`.
    /// - [`EditorError::InvalidDocument`] / [`EditorError::Serialization`] for
    ///   malformed input.
    ///
    /// No partial tree is ever returned.
    pub fn from_json(json: &str, registry: &NodeRegistry) -> Result<Self> {
        let trimmed = json.trim();
        if trimmed.is_empty() || trimmed == EMPTY_DOCUMENT {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(trimmed)?;
        if value.as_object().is_some_and(Map::is_empty) {
            return Ok(Self::new());
        }
        let serialized: SerializedDocument = serde_json::from_value(value)?;
        Self::from_serialized(&serialized, registry)
    }

    pub fn from_serialized(serialized: &SerializedDocument, registry: &NodeRegistry) -> Result<Self> {
        let root = &serialized.root;
        if root.node_type != "root" {
            return Err(EditorError::invalid(format!(
                "top-level node must be root, found '{}'",
                root.node_type
            )));
        }
        let mut doc = Document::bare();
        for child in root.children.as_deref().unwrap_or_default() {
            import_node(&mut doc.tree, NodeKey::ROOT, child, registry)?;
        }
        doc.validate()?;
        Ok(doc)
    }
}

fn export_node(tree: &Tree, key: NodeKey) -> SerializedNode {
    let children: Vec<SerializedNode> = tree
        .children(key)
        .iter()
        .map(|child| export_node(tree, *child))
        .collect();
    let Some(kind) = tree.kind(key) else {
        return SerializedNode::element("paragraph", Vec::new());
    };
    match kind {
        NodeKind::Root => SerializedNode::element("root", children),
        NodeKind::Paragraph => SerializedNode::element("paragraph", children),
        NodeKind::Quote => SerializedNode::element("quote", children),
        NodeKind::ListItem => SerializedNode::element("listitem", children),
        NodeKind::Table => SerializedNode::element("table", children),
        NodeKind::TableRow => SerializedNode::element("tablerow", children),
        NodeKind::Heading(tag) => SerializedNode::element("heading", children)
            .with_field("tag", Value::from(tag.as_str())),
        NodeKind::List(list) => SerializedNode::element("list", children)
            .with_field("listType", Value::from(list.as_str())),
        NodeKind::TableCell { header } => SerializedNode::element("tablecell", children)
            .with_field("header", Value::from(*header)),
        NodeKind::Text(run) => SerializedNode {
            node_type: "text".to_string(),
            version: NODE_FORMAT_VERSION,
            children: None,
            fields: Map::new(),
        }
        .with_field("text", Value::from(run.text.as_str()))
        .with_field("format", Value::from(run.format.bits())),
        NodeKind::Extension(ext) => SerializedNode {
            node_type: ext.type_tag().to_string(),
            version: ext.version(),
            children: None,
            fields: ext.export_fields(),
        },
    }
}

fn import_kind(node: &SerializedNode, registry: &NodeRegistry) -> Result<NodeKind> {
    let kind = match node.node_type.as_str() {
        "root" => return Err(EditorError::invalid("root cannot be nested")),
        "paragraph" => NodeKind::Paragraph,
        "quote" => NodeKind::Quote,
        "listitem" => NodeKind::ListItem,
        "table" => NodeKind::Table,
        "tablerow" => NodeKind::TableRow,
        "heading" => {
            let raw = node.str_field("tag").unwrap_or_default();
            let tag = HeadingTag::parse(raw)
                .ok_or_else(|| EditorError::invalid(format!("bad heading tag '{}'", raw)))?;
            NodeKind::Heading(tag)
        }
        "list" => {
            let raw = node.str_field("listType").unwrap_or_default();
            let list = ListKind::parse(raw)
                .ok_or_else(|| EditorError::invalid(format!("bad list type '{}'", raw)))?;
            NodeKind::List(list)
        }
        "tablecell" => NodeKind::TableCell {
            header: node
                .fields
                .get("header")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        "text" => {
            let text = node.str_field("text").unwrap_or_default();
            let bits = node
                .fields
                .get("format")
                .and_then(Value::as_u64)
                .and_then(|bits| u32::try_from(bits).ok())
                .unwrap_or(0);
            NodeKind::Text(TextRun::new(text, TextFormat::from_bits(bits)))
        }
        other => NodeKind::Extension(registry.import(other, &node.fields, node.version)?),
    };
    Ok(kind)
}

fn import_node(
    tree: &mut Tree,
    parent: NodeKey,
    node: &SerializedNode,
    registry: &NodeRegistry,
) -> Result<()> {
    let kind = import_kind(node, registry)?;
    let children = node.children.as_deref().unwrap_or_default();
    if kind.is_leaf() && !children.is_empty() {
        return Err(EditorError::invalid(format!(
            "{} nodes cannot have children",
            kind.type_tag()
        )));
    }
    let key = tree.allocate(kind);
    tree.entry_mut(key)?.parent = Some(parent);
    tree.entry_mut(parent)?.children.push(key);
    for child in children {
        import_node(tree, key, child, registry)?;
    }
    Ok(())
}
