//! Editing session driver for one open post.

mod state_accessors;
mod state_feedback;
mod state_ops;

use crate::backend::BackendHandle;
use chrono::{DateTime, Utc};
use smartblog_core::{
    AutosavePipeline, Config, Document, EditorSession, FormatState, MathEditor, NodeKey,
    NodeRegistry, Post, PostStatus, PostSummary,
};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

pub use state_feedback::{Notice, NoticeKind};

/// Shown when summarization is requested on a document with no text.
pub const EMPTY_EDITOR_MESSAGE: &str = "Editor is empty. Write some content first.";
/// Shown when the summarization collaborator fails.
pub const SUMMARY_FAILED_MESSAGE: &str = "Failed to generate summary. Please try again.";

/// Derived save status for the open post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    /// A content save is outstanding.
    Saving,
    /// Edits have not been persisted yet.
    Unsaved,
    /// Everything is persisted; carries the last save time.
    Saved(DateTime<Utc>),
    /// Nothing saved since the post was opened and nothing to save.
    Idle,
}

/// Progress of the on-demand summary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SummaryState {
    #[default]
    Idle,
    Loading { request_id: u64 },
    Ready(String),
    Failed(String),
}

/// Owns the document, session and autosave pipeline of the open post and
/// talks to the persistence worker over channels.
///
/// Nothing here blocks on I/O. Callers feed user commands in, then call
/// [`EditorApp::tick_at`] to drain worker replies and fire due timers.
pub struct EditorApp {
    backend: BackendHandle,
    config: Config,
    registry: NodeRegistry,
    document: Document,
    session: EditorSession,
    autosave: AutosavePipeline,
    explicit_save_seq: Option<u64>,
    explicit_save_queued: bool,
    format_state: FormatState,
    math_editors: BTreeMap<NodeKey, MathEditor>,
    post: Option<Post>,
    pending_open: Option<String>,
    edit_title: String,
    title_dirty: bool,
    title_last_edit_at: Option<Instant>,
    title_save_in_flight: bool,
    title_revision: u64,
    title_save_delay: Duration,
    publish_in_flight: bool,
    publish_queued: bool,
    posts: Vec<PostSummary>,
    list_filter: Option<PostStatus>,
    notices: VecDeque<Notice>,
    summary: SummaryState,
    summary_request_id: u64,
}

impl EditorApp {
    /// Build a driver with the default node registry (base kinds plus math).
    pub fn new(backend: BackendHandle, config: Config) -> Self {
        Self::with_registry(backend, config, NodeRegistry::with_defaults())
    }

    pub fn with_registry(backend: BackendHandle, config: Config, registry: NodeRegistry) -> Self {
        Self {
            backend,
            autosave: AutosavePipeline::from_config(&config),
            title_save_delay: config.title_save_delay(),
            config,
            registry,
            document: Document::new(),
            session: EditorSession::new(),
            explicit_save_seq: None,
            explicit_save_queued: false,
            format_state: FormatState::default(),
            math_editors: BTreeMap::new(),
            post: None,
            pending_open: None,
            edit_title: String::new(),
            title_dirty: false,
            title_last_edit_at: None,
            title_save_in_flight: false,
            title_revision: 0,
            publish_in_flight: false,
            publish_queued: false,
            posts: Vec::new(),
            list_filter: None,
            notices: VecDeque::new(),
            summary: SummaryState::Idle,
            summary_request_id: 0,
        }
    }
}

#[cfg(test)]
mod tests;
