//! Editing session driver for SmartBlog: a persistence worker thread and the
//! [`EditorApp`] that owns one open post.

pub mod app;
pub mod backend;

pub use app::{
    EditorApp, Notice, NoticeKind, SaveIndicator, SummaryState, EMPTY_EDITOR_MESSAGE,
    SUMMARY_FAILED_MESSAGE,
};
pub use backend::{spawn_backend, BackendCmd, BackendEvent, BackendHandle};
