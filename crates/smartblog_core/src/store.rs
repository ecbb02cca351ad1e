//! Collaborator interfaces for persistence and summarization, plus an
//! in-memory store used by the worker tests and local tooling.

use crate::error::PersistenceError;
use crate::models::post::{Post, PostStatus, UpdatePostRequest};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Result alias for collaborator calls.
pub type StoreResult<T> = std::result::Result<T, PersistenceError>;

/// Remote post persistence. Every call is fallible and blocking; callers
/// run it off the editing thread.
pub trait PostStore: Send + Sync {
    fn fetch_post(&self, id: &str) -> StoreResult<Post>;

    /// Apply a partial update and return the stored record.
    fn save_post(&self, id: &str, update: &UpdatePostRequest) -> StoreResult<Post>;

    /// Mark the post published and return the stored record.
    fn publish_post(&self, id: &str) -> StoreResult<Post>;

    fn delete_post(&self, id: &str) -> StoreResult<()>;

    /// Posts, most recently updated first, optionally filtered by status.
    fn list_posts(&self, status: Option<PostStatus>) -> StoreResult<Vec<Post>>;
}

/// Stateless text summarization.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> StoreResult<String>;
}

/// Operations of [`PostStore`], used for call logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Fetch,
    Save,
    Publish,
    Delete,
    List,
}

/// A recorded call against [`MemoryPostStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub id: Option<String>,
    pub update: Option<UpdatePostRequest>,
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: HashMap<String, Post>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, VecDeque<PersistenceError>>,
}

/// [`PostStore`] kept in process memory.
///
/// Failures can be queued per operation with [`MemoryPostStore::fail_next`];
/// each queued error is returned once, before the operation touches state.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    state: Mutex<MemoryState>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing posts.
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            for post in posts {
                state.posts.insert(post.id.clone(), post);
            }
        }
        store
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PersistenceError::new("Post store lock poisoned", Some(500)))
    }

    /// Insert or replace a post.
    pub fn insert(&self, post: Post) -> StoreResult<()> {
        self.state()?.posts.insert(post.id.clone(), post);
        Ok(())
    }

    /// Create a fresh draft and return it.
    pub fn create(&self, title: impl Into<String>) -> StoreResult<Post> {
        let post = Post::new(title.into());
        self.insert(post.clone())?;
        Ok(post)
    }

    /// Current stored copy of a post, without recording a call.
    pub fn get(&self, id: &str) -> Option<Post> {
        self.state().ok()?.posts.get(id).cloned()
    }

    /// Queue `error` for the next call of `op`.
    pub fn fail_next(&self, op: StoreOp, error: PersistenceError) {
        if let Ok(mut state) = self.state() {
            state.failures.entry(op).or_default().push_back(error);
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// Calls of one operation.
    pub fn calls_of(&self, op: StoreOp) -> Vec<StoreCall> {
        self.calls().into_iter().filter(|call| call.op == op).collect()
    }

    fn begin(
        &self,
        op: StoreOp,
        id: Option<&str>,
        update: Option<&UpdatePostRequest>,
    ) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.state()?;
        state.calls.push(StoreCall {
            op,
            id: id.map(str::to_string),
            update: update.cloned(),
        });
        if let Some(error) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            debug!(?op, error = %error, "injected store failure");
            return Err(error);
        }
        Ok(state)
    }
}

impl PostStore for MemoryPostStore {
    fn fetch_post(&self, id: &str) -> StoreResult<Post> {
        let state = self.begin(StoreOp::Fetch, Some(id), None)?;
        state
            .posts
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found(id))
    }

    fn save_post(&self, id: &str, update: &UpdatePostRequest) -> StoreResult<Post> {
        let mut state = self.begin(StoreOp::Save, Some(id), Some(update))?;
        let post = state
            .posts
            .get_mut(id)
            .ok_or_else(|| PersistenceError::not_found(id))?;
        post.apply_update(update);
        Ok(post.clone())
    }

    fn publish_post(&self, id: &str) -> StoreResult<Post> {
        let mut state = self.begin(StoreOp::Publish, Some(id), None)?;
        let post = state
            .posts
            .get_mut(id)
            .ok_or_else(|| PersistenceError::not_found(id))?;
        post.status = PostStatus::Published;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    fn delete_post(&self, id: &str) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::Delete, Some(id), None)?;
        state
            .posts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found(id))
    }

    fn list_posts(&self, status: Option<PostStatus>) -> StoreResult<Vec<Post>> {
        let state = self.begin(StoreOp::List, None, None)?;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| status.map_or(true, |wanted| post.status == wanted))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }
}
