//! Protocol types for the persistence worker.

use chrono::{DateTime, Utc};
use smartblog_core::{PersistenceError, Post, PostStatus, PostSummary, SaveTicket};

/// Commands issued by the editing thread for the worker to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCmd {
    /// Load a post for editing.
    FetchPost { id: String },
    /// Persist serialized document content for the save identified by `ticket`.
    SaveContent { ticket: SaveTicket, content: String },
    /// Persist a title edit. `revision` echoes back so late replies can be told apart.
    SaveTitle {
        id: String,
        title: String,
        revision: u64,
    },
    PublishPost { id: String },
    DeletePost { id: String },
    /// Refresh the post list, optionally filtered by status.
    ListPosts { status: Option<PostStatus> },
    /// Summarize plain text extracted from the open document.
    Summarize { request_id: u64, text: String },
}

/// Events produced by the worker and drained by the editing thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    PostLoaded { post: Post },
    PostLoadFailed { id: String, error: PersistenceError },
    /// The content save for `ticket` completed at `saved_at`.
    ContentSaved {
        ticket: SaveTicket,
        saved_at: DateTime<Utc>,
    },
    ContentSaveFailed {
        ticket: SaveTicket,
        error: PersistenceError,
    },
    TitleSaved { post: Post, revision: u64 },
    TitleSaveFailed {
        id: String,
        revision: u64,
        error: PersistenceError,
    },
    PostPublished { post: Post },
    PublishFailed { id: String, error: PersistenceError },
    PostDeleted { id: String },
    DeleteFailed { id: String, error: PersistenceError },
    /// Post list snapshot for the filter it was requested with.
    PostList {
        status: Option<PostStatus>,
        items: Vec<PostSummary>,
    },
    ListFailed { error: PersistenceError },
    SummaryReady { request_id: u64, summary: String },
    SummaryFailed {
        request_id: u64,
        error: PersistenceError,
    },
}
