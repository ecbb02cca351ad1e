//! Read-only views of editor state.

use super::{EditorApp, SaveIndicator, SummaryState};
use smartblog_core::{
    Config, Document, EditorSession, FormatState, MathEditor, NodeKey, Post, PostStatus,
    PostSummary,
};

impl EditorApp {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Toolbar state from the last selection that was a range.
    pub fn format_state(&self) -> &FormatState {
        &self.format_state
    }

    /// The open post's record as last returned by the persistence worker.
    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    /// Whether a post is being fetched.
    pub fn is_loading(&self) -> bool {
        self.pending_open.is_some()
    }

    /// Title as currently edited, which may be ahead of the stored one.
    pub fn title(&self) -> &str {
        &self.edit_title
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn list_filter(&self) -> Option<PostStatus> {
        self.list_filter
    }

    pub fn summary(&self) -> &SummaryState {
        &self.summary
    }

    pub fn math_editor(&self, key: NodeKey) -> Option<&MathEditor> {
        self.math_editors.get(&key)
    }

    /// Keys of every math node with an attached editor, in key order.
    pub fn math_keys(&self) -> Vec<NodeKey> {
        self.math_editors.keys().copied().collect()
    }

    pub fn save_indicator(&self) -> SaveIndicator {
        if !self.session.is_open() {
            return SaveIndicator::Idle;
        }
        if self.autosave.is_saving() {
            SaveIndicator::Saving
        } else if self.session.is_dirty() {
            SaveIndicator::Unsaved
        } else if let Some(at) = self.session.last_saved_at() {
            SaveIndicator::Saved(at)
        } else {
            SaveIndicator::Idle
        }
    }

    /// Whether the debounce timer for content is armed.
    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }
}
