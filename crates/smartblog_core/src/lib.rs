//! Core editing library for SmartBlog (document model, commands, autosave).

/// Debounced autosave pipeline.
pub mod autosave;
/// Editor commands and toolbar state.
pub mod commands;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Node tree, transactions and serialization.
pub mod document;
/// Error types for the core and its collaborators.
pub mod error;
/// LaTeX math extension node.
pub mod math;
/// Post records exchanged with the persistence collaborator.
pub mod models;
/// Cursor and range positions.
pub mod selection;
/// Open-post session state.
pub mod session;
/// Persistence and summarization collaborators.
pub mod store;

pub use autosave::{AutosavePipeline, SaveAck, SaveRequest, SaveTicket};
pub use commands::{execute, BlockType, Command, FormatState};
pub use config::Config;
pub use document::{Document, DocumentChange, NodeKey, NodeKind, NodeRegistry};
pub use error::{EditorError, PersistenceError, RenderError};
pub use math::{MathEditor, MathNode, MathView, MathViewState, Typesetter};
pub use models::post::{Post, PostStatus, PostSummary, UpdatePostRequest};
pub use selection::{Point, Selection};
pub use session::EditorSession;
pub use store::{MemoryPostStore, PostStore, StoreOp, Summarizer};
