//! State of the one post currently open for editing.

use crate::constants::EMPTY_DOCUMENT;
use chrono::{DateTime, Utc};

/// Per-open-post snapshot tracking.
///
/// `is_dirty` is always `serialized_content != last_saved_content`; it is
/// only forced to `false` by [`EditorSession::open_post`] and the
/// `mark_saved*` family, both of which align the two snapshots first.
///
/// Every open bumps `epoch` so a save issued for an earlier open can be told
/// apart from one issued for the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    current_post_id: Option<String>,
    serialized_content: String,
    last_saved_content: String,
    is_dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
    epoch: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// A closed session at the empty-document baseline.
    pub fn new() -> Self {
        Self {
            current_post_id: None,
            serialized_content: EMPTY_DOCUMENT.to_string(),
            last_saved_content: EMPTY_DOCUMENT.to_string(),
            is_dirty: false,
            last_saved_at: None,
            epoch: 0,
        }
    }

    pub fn current_post_id(&self) -> Option<&str> {
        self.current_post_id.as_deref()
    }

    pub fn serialized_content(&self) -> &str {
        &self.serialized_content
    }

    pub fn last_saved_content(&self) -> &str {
        &self.last_saved_content
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_open(&self) -> bool {
        self.current_post_id.is_some()
    }

    /// Whether `post_id` and `epoch` still name this open session.
    pub fn is_current(&self, post_id: &str, epoch: u64) -> bool {
        self.epoch == epoch && self.current_post_id.as_deref() == Some(post_id)
    }

    /// Adopt `content` as both the working and persisted snapshot.
    pub fn open_post(&mut self, id: impl Into<String>, content: impl Into<String>) {
        let content = content.into();
        self.current_post_id = Some(id.into());
        self.last_saved_content = content.clone();
        self.serialized_content = content;
        self.is_dirty = false;
        self.last_saved_at = None;
        self.epoch += 1;
    }

    /// Record the latest serialized document.
    pub fn update_content(&mut self, content: impl Into<String>) {
        self.serialized_content = content.into();
        self.recompute_dirty();
    }

    /// The working snapshot has been persisted.
    pub fn mark_saved(&mut self) {
        self.mark_saved_at(Utc::now());
    }

    pub fn mark_saved_at(&mut self, at: DateTime<Utc>) {
        self.last_saved_content = self.serialized_content.clone();
        self.is_dirty = false;
        self.last_saved_at = Some(at);
    }

    /// An older snapshot was persisted while newer edits were made.
    ///
    /// Records `snapshot` as persisted and recomputes the dirty flag, which
    /// stays set unless the newer edits happen to match it.
    pub fn mark_persisted(&mut self, snapshot: impl Into<String>, at: DateTime<Utc>) {
        self.last_saved_content = snapshot.into();
        self.last_saved_at = Some(at);
        self.recompute_dirty();
    }

    /// Return to the empty-document baseline. The epoch keeps counting so
    /// acknowledgements for the closed post can never match a later open.
    pub fn close_post(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self::new();
        self.epoch = epoch;
    }

    fn recompute_dirty(&mut self) {
        self.is_dirty = self.serialized_content != self.last_saved_content;
    }
}
