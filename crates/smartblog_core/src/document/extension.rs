//! Extension node trait and the registration table keyed by type tag.

use super::node::BASE_TYPE_TAGS;
use crate::error::{EditorError, Result};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// A leaf node kind defined outside the core base kinds.
///
/// Extensions are always leaves; they carry their own payload and serialize
/// it as flat fields next to `type` and `version`.
pub trait ExtensionNode: fmt::Debug + Send + Sync + 'static {
    /// Stable serialized type tag (for example `"math"`).
    fn type_tag(&self) -> &'static str;

    /// Payload version written next to the fields.
    fn version(&self) -> u32;

    /// Inline nodes sit among text runs; block nodes stand alone.
    fn is_inline(&self) -> bool {
        true
    }

    /// Contribution to the document's plain-text projection.
    fn text_content(&self) -> String {
        String::new()
    }

    /// Payload fields, excluding `type` and `version`.
    fn export_fields(&self) -> Map<String, Value>;

    fn clone_box(&self) -> Box<dyn ExtensionNode>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn ExtensionNode {
    pub fn downcast_ref<T: ExtensionNode>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: ExtensionNode>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl Clone for Box<dyn ExtensionNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for Box<dyn ExtensionNode> {
    fn eq(&self, other: &Self) -> bool {
        self.type_tag() == other.type_tag()
            && self.version() == other.version()
            && self.export_fields() == other.export_fields()
    }
}

/// Rebuilds an extension node from its serialized fields and version.
pub type ImportFn = fn(&Map<String, Value>, u32) -> Result<Box<dyn ExtensionNode>>;

/// Registration table for extension node kinds.
///
/// Base kinds are always understood; anything else must be registered here
/// before a document containing it can be loaded.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    extensions: BTreeMap<String, ImportFn>,
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NodeRegistry {
    /// Registry that only knows the base kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every extension shipped by this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.extensions.insert(
            crate::constants::MATH_NODE_TYPE.to_string(),
            crate::math::import_math_node,
        );
        registry
    }

    /// Register (or replace) the importer for `type_tag`.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] when the tag is empty or reserved
    /// by a base kind.
    pub fn register(&mut self, type_tag: &str, import: ImportFn) -> Result<()> {
        if type_tag.trim().is_empty() {
            return Err(EditorError::validation("extension type tag is empty"));
        }
        if BASE_TYPE_TAGS.contains(&type_tag) {
            return Err(EditorError::validation(format!(
                "type tag '{}' is reserved",
                type_tag
            )));
        }
        self.extensions.insert(type_tag.to_string(), import);
        Ok(())
    }

    /// Remove an extension; returns whether it was registered.
    pub fn unregister(&mut self, type_tag: &str) -> bool {
        self.extensions.remove(type_tag).is_some()
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.extensions.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub(crate) fn import(
        &self,
        type_tag: &str,
        fields: &Map<String, Value>,
        version: u32,
    ) -> Result<Box<dyn ExtensionNode>> {
        let import = self
            .extensions
            .get(type_tag)
            .ok_or_else(|| EditorError::UnknownNodeType(type_tag.to_string()))?;
        import(fields, version)
    }
}
