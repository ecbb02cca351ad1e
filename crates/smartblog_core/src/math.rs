//! LaTeX math extension node and its edit/display lifecycle.
//!
//! The node only stores formula source. Typesetting is delegated to a
//! [`Typesetter`]; when it fails the raw source is shown instead.

use crate::constants::{MATH_NODE_TYPE, MATH_NODE_VERSION};
use crate::document::{Document, DocumentChange, ExtensionNode, NodeKey};
use crate::error::{EditorError, RenderError, Result};
use serde_json::{Map, Value};
use std::any::Any;
use tracing::{debug, warn};

/// A formula leaf: raw LaTeX plus inline/block placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathNode {
    latex: String,
    inline: bool,
}

impl MathNode {
    pub fn new(latex: impl Into<String>, inline: bool) -> Self {
        Self {
            latex: latex.into(),
            inline,
        }
    }

    pub fn latex(&self) -> &str {
        &self.latex
    }

    pub fn inline(&self) -> bool {
        self.inline
    }

    pub(crate) fn set_latex(&mut self, latex: String) {
        self.latex = latex;
    }
}

impl ExtensionNode for MathNode {
    fn type_tag(&self) -> &'static str {
        MATH_NODE_TYPE
    }

    fn version(&self) -> u32 {
        MATH_NODE_VERSION
    }

    fn is_inline(&self) -> bool {
        self.inline
    }

    fn export_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("latex".to_string(), Value::from(self.latex.as_str()));
        fields.insert("inline".to_string(), Value::from(self.inline));
        fields
    }

    fn clone_box(&self) -> Box<dyn ExtensionNode> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Importer registered under the `math` tag. Missing `latex` reads as the
/// empty string and missing `inline` as `true`.
pub fn import_math_node(
    fields: &Map<String, Value>,
    _version: u32,
) -> Result<Box<dyn ExtensionNode>> {
    let latex = match fields.get("latex") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(latex)) => latex.clone(),
        Some(other) => {
            return Err(EditorError::invalid(format!(
                "math latex must be a string, found {}",
                other
            )))
        }
    };
    let inline = match fields.get("inline") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(inline)) => *inline,
        Some(other) => {
            return Err(EditorError::invalid(format!(
                "math inline must be a boolean, found {}",
                other
            )))
        }
    };
    Ok(Box::new(MathNode::new(latex, inline)))
}

/// External typesetting capability.
pub trait Typesetter {
    /// Render `source`; `display_mode` is true for block formulas.
    fn render(&self, source: &str, display_mode: bool) -> std::result::Result<String, RenderError>;
}

/// Interactive state of one math node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathViewState {
    Editing,
    Display,
}

/// What the host should show for a math node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathView {
    /// An input holding the in-progress source.
    Input { draft: String },
    /// Display state with nothing to typeset.
    Placeholder,
    /// Typeset markup from the [`Typesetter`].
    Rendered { markup: String, display_mode: bool },
    /// Typesetting failed; show the source verbatim.
    PlainText { source: String },
}

/// Edit/display state machine for one math node.
///
/// The stored `latex` only changes through [`MathEditor::commit`], which
/// writes the draft as a single document transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathEditor {
    key: NodeKey,
    state: MathViewState,
    draft: String,
}

impl MathEditor {
    /// Attach to the math node at `key`.
    ///
    /// # Returns
    /// `None` when `key` is not a math node. The editor starts in
    /// [`MathViewState::Editing`] for an empty formula, otherwise in
    /// [`MathViewState::Display`].
    pub fn attach(doc: &Document, key: NodeKey) -> Option<Self> {
        let node = doc.node(key)?.extension::<MathNode>()?;
        let state = if node.latex().is_empty() {
            MathViewState::Editing
        } else {
            MathViewState::Display
        };
        Some(Self {
            key,
            state,
            draft: node.latex().to_string(),
        })
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn state(&self) -> MathViewState {
        self.state
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Display → Editing on direct interaction; the draft restarts from the
    /// stored source.
    pub fn click(&mut self, doc: &Document) {
        if self.state == MathViewState::Display {
            self.draft = stored_latex(doc, self.key).unwrap_or_default();
            self.state = MathViewState::Editing;
        }
    }

    /// Replace the in-progress text. Ignored outside the editing state.
    pub fn input(&mut self, text: impl Into<String>) {
        if self.state == MathViewState::Editing {
            self.draft = text.into();
        }
    }

    /// Editing → Display on blur or confirm, writing the draft into the node.
    ///
    /// # Returns
    /// The change notification when the stored source actually changed.
    ///
    /// # Errors
    /// Returns [`EditorError::NodeNotFound`] if the node was removed while
    /// being edited; the editor is left untouched in that case.
    pub fn commit(&mut self, doc: &mut Document) -> Result<Option<DocumentChange>> {
        if self.state != MathViewState::Editing {
            return Ok(None);
        }
        let current = stored_latex(doc, self.key).ok_or(EditorError::NodeNotFound(self.key))?;
        let change = if current == self.draft {
            None
        } else {
            let key = self.key;
            let draft = self.draft.clone();
            doc.update(move |txn| txn.update_extension::<MathNode, _>(key, |node| node.set_latex(draft)))?
        };
        self.state = MathViewState::Display;
        Ok(change)
    }

    /// Abort editing: the draft is discarded and the stored source kept. An
    /// empty formula has no display form, so the editor stays open for it.
    pub fn cancel(&mut self, doc: &Document) {
        if self.state != MathViewState::Editing {
            return;
        }
        let stored = stored_latex(doc, self.key).unwrap_or_default();
        self.state = if stored.is_empty() {
            MathViewState::Editing
        } else {
            MathViewState::Display
        };
        self.draft = stored;
    }

    /// Produce the view for the current state. Typesetting failures degrade
    /// to plain text and are never returned as errors.
    pub fn view(&self, doc: &Document, typesetter: &dyn Typesetter) -> MathView {
        if self.state == MathViewState::Editing {
            return MathView::Input {
                draft: self.draft.clone(),
            };
        }
        let Some(node) = doc.node(self.key).and_then(|node| node.extension::<MathNode>()) else {
            return MathView::Placeholder;
        };
        render_math(node, typesetter)
    }
}

/// Typeset a math node in display state with the plain-text fallback.
pub fn render_math(node: &MathNode, typesetter: &dyn Typesetter) -> MathView {
    if node.latex().is_empty() {
        return MathView::Placeholder;
    }
    let display_mode = !node.inline();
    match typesetter.render(node.latex(), display_mode) {
        Ok(markup) => MathView::Rendered {
            markup,
            display_mode,
        },
        Err(err) => {
            warn!("typesetting failed, showing source: {}", err);
            MathView::PlainText {
                source: node.latex().to_string(),
            }
        }
    }
}

fn stored_latex(doc: &Document, key: NodeKey) -> Option<String> {
    let latex = doc.node(key)?.extension::<MathNode>()?.latex().to_string();
    Some(latex)
}

/// Every math node in the document, in document order.
pub fn math_node_keys(doc: &Document) -> Vec<NodeKey> {
    let keys: Vec<NodeKey> = doc
        .keys_in_order()
        .into_iter()
        .filter(|key| {
            doc.node(*key)
                .is_some_and(|node| node.extension::<MathNode>().is_some())
        })
        .collect();
    debug!(count = keys.len(), "collected math nodes");
    keys
}
