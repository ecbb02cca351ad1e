//! Shared constants used across SmartBlog crates.

/// Default autosave debounce window in milliseconds.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 1_500;

/// Default debounce window for title edits in milliseconds.
pub const DEFAULT_TITLE_SAVE_DELAY_MS: u64 = 1_000;

/// Default number of user-facing notices kept at once.
pub const DEFAULT_NOTICE_LIMIT: usize = 4;

/// Serialized form of a post that has never been edited.
pub const EMPTY_DOCUMENT: &str = "{}";

/// Version stamped on every serialized base node.
pub const NODE_FORMAT_VERSION: u32 = 1;

/// Type tag of the math extension node.
pub const MATH_NODE_TYPE: &str = "math";

/// Version stamped on serialized math nodes.
pub const MATH_NODE_VERSION: u32 = 1;

/// Upper bounds accepted by table insertion.
pub const MAX_TABLE_ROWS: usize = 20;
/// Upper bound on table columns accepted by table insertion.
pub const MAX_TABLE_COLUMNS: usize = 10;
