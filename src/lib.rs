//! Root crate facade for SmartBlog: the editing core and the session driver.

pub use smartblog_core::{
    autosave, commands, config, constants, document, error, math, models, selection, session,
    store,
};
pub use smartblog_core::{
    Command, Config, Document, EditorError, EditorSession, MemoryPostStore, NodeRegistry,
    PersistenceError, Post, PostStatus, PostStore, Summarizer,
};
pub use smartblog_editor::{
    spawn_backend, BackendCmd, BackendEvent, BackendHandle, EditorApp, Notice, NoticeKind,
    SaveIndicator, SummaryState,
};
