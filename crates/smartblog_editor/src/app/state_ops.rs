//! Editor operations: opening and closing posts, commands, saves, post
//! actions, and handling of worker replies.

use super::state_feedback::failure_message;
use super::{EditorApp, NoticeKind, SummaryState, EMPTY_EDITOR_MESSAGE, SUMMARY_FAILED_MESSAGE};
use crate::backend::{BackendCmd, BackendEvent};
use smartblog_core::math::math_node_keys;
use smartblog_core::{
    execute, Command, Document, DocumentChange, FormatState, MathEditor, MathView, NodeKey,
    PersistenceError, Post, PostStatus, PostSummary, SaveRequest, Typesetter,
};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

impl EditorApp {
    /// Tear down the current session and request `id` from the worker.
    ///
    /// The document stays empty until [`BackendEvent::PostLoaded`] arrives.
    pub fn open_post(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.close_post();
        if self
            .backend
            .cmd_tx
            .send(BackendCmd::FetchPost { id: id.clone() })
            .is_err()
        {
            self.push_notice(NoticeKind::Error, "Load failed: backend unavailable.");
            return;
        }
        debug!(post_id = %id, "post requested");
        self.pending_open = Some(id);
    }

    /// Cancel the pending autosave and return every per-post field to its
    /// baseline. Replies still in flight for the closed post are dropped when
    /// they arrive.
    pub fn close_post(&mut self) {
        if let Some(id) = self.session.current_post_id() {
            debug!(post_id = id, "closing post");
        }
        self.autosave.cancel();
        self.explicit_save_seq = None;
        self.explicit_save_queued = false;
        self.session.close_post();
        self.document = Document::new();
        self.format_state = FormatState::default();
        self.math_editors.clear();
        self.post = None;
        self.pending_open = None;
        self.edit_title.clear();
        self.title_dirty = false;
        self.title_last_edit_at = None;
        self.title_save_in_flight = false;
        self.publish_in_flight = false;
        self.publish_queued = false;
        self.summary = SummaryState::Idle;
    }

    fn adopt_post(&mut self, post: Post) {
        let mut document = match Document::from_json(&post.content, &self.registry) {
            Ok(document) => document,
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "post content failed to load");
                self.push_notice(NoticeKind::Error, format!("Failed to load post: {}", err));
                return;
            }
        };
        document.select_end();
        self.session.open_post(post.id.clone(), post.content.clone());
        self.document = document;
        if let Some(state) = FormatState::from_document(&self.document) {
            self.format_state = state;
        }
        self.sync_math_editors();
        self.edit_title = post.title.clone();
        info!(post_id = %post.id, nodes = self.document.len(), "post opened");
        self.post = Some(post);
    }

    /// Run an editor command against the open document.
    ///
    /// # Returns
    /// `true` when the document changed. Invalid commands are no-ops.
    pub fn dispatch(&mut self, command: Command, now: Instant) -> bool {
        if !self.session.is_open() {
            debug!(command = command.name(), "command ignored: no open post");
            return false;
        }
        let change = execute(&mut self.document, command);
        if let Some(state) = FormatState::from_document(&self.document) {
            self.format_state = state;
        }
        match change {
            Some(change) => {
                self.on_document_changed(&change, now);
                true
            }
            None => false,
        }
    }

    /// Serialize after a committed change and restart the autosave window.
    fn on_document_changed(&mut self, change: &DocumentChange, now: Instant) {
        let content = match self.document.to_json() {
            Ok(content) => content,
            Err(err) => {
                warn!(version = change.version, error = %err, "document failed to serialize");
                return;
            }
        };
        self.session.update_content(content);
        self.autosave.on_content_changed(now);
        if !change.removed.is_empty() || !change.updated.is_empty() {
            self.sync_math_editors();
        }
    }

    /// Attach editors to new math nodes and drop those whose node is gone.
    fn sync_math_editors(&mut self) {
        let live: BTreeSet<NodeKey> = math_node_keys(&self.document).into_iter().collect();
        self.math_editors.retain(|key, _| live.contains(key));
        for key in live {
            if !self.math_editors.contains_key(&key) {
                if let Some(editor) = MathEditor::attach(&self.document, key) {
                    self.math_editors.insert(key, editor);
                }
            }
        }
    }

    pub fn math_click(&mut self, key: NodeKey) {
        if let Some(editor) = self.math_editors.get_mut(&key) {
            editor.click(&self.document);
        }
    }

    pub fn math_input(&mut self, key: NodeKey, text: impl Into<String>) {
        if let Some(editor) = self.math_editors.get_mut(&key) {
            editor.input(text);
        }
    }

    /// Commit the draft of the math node at `key`.
    ///
    /// # Returns
    /// `true` when the stored formula changed.
    pub fn math_commit(&mut self, key: NodeKey, now: Instant) -> bool {
        let Some(editor) = self.math_editors.get_mut(&key) else {
            return false;
        };
        match editor.commit(&mut self.document) {
            Ok(Some(change)) => {
                self.on_document_changed(&change, now);
                true
            }
            Ok(None) => false,
            Err(err) => {
                debug!(key = %key, error = %err, "math commit ignored");
                false
            }
        }
    }

    pub fn math_cancel(&mut self, key: NodeKey) {
        if let Some(editor) = self.math_editors.get_mut(&key) {
            editor.cancel(&self.document);
        }
    }

    pub fn math_view(&self, key: NodeKey, typesetter: &dyn Typesetter) -> Option<MathView> {
        self.math_editors
            .get(&key)
            .map(|editor| editor.view(&self.document, typesetter))
    }

    /// Save the open document immediately, bypassing the debounce window.
    /// A failure of this save is surfaced as a notice.
    ///
    /// While another save is in flight the flush is deferred; the save issued
    /// once it completes is the one reported.
    pub fn save_now(&mut self, now: Instant) {
        match self.autosave.flush(now, &self.session) {
            Some(request) => {
                self.explicit_save_seq = Some(request.ticket.seq);
                self.send_save(request);
            }
            None => self.explicit_save_queued = self.autosave.is_pending(),
        }
    }

    fn send_save(&mut self, request: SaveRequest) {
        let ticket = request.ticket.clone();
        if self
            .backend
            .cmd_tx
            .send(BackendCmd::SaveContent {
                ticket: request.ticket,
                content: request.content,
            })
            .is_err()
        {
            let ack = self.autosave.on_save_result(
                &ticket,
                Err(PersistenceError::unavailable()),
                &mut self.session,
            );
            debug!(?ack, "save not sent: backend unavailable");
            self.report_explicit_save_failure(ticket.seq, &PersistenceError::unavailable());
        }
    }

    fn report_explicit_save_failure(&mut self, seq: u64, error: &PersistenceError) {
        if self.explicit_save_seq == Some(seq) {
            self.explicit_save_seq = None;
            self.push_notice(
                NoticeKind::Error,
                format!("Save failed: {}", failure_message(error, "Failed to save post")),
            );
        }
    }

    /// Edit the open post's title; it is saved after its own debounce window.
    pub fn set_title(&mut self, title: impl Into<String>, now: Instant) {
        if !self.session.is_open() {
            return;
        }
        let title = title.into();
        if title == self.edit_title {
            return;
        }
        self.edit_title = title;
        self.title_dirty = true;
        self.title_last_edit_at = Some(now);
    }

    fn maybe_save_title(&mut self, now: Instant) {
        if !self.title_dirty || self.title_save_in_flight {
            return;
        }
        let Some(last_edit) = self.title_last_edit_at else {
            return;
        };
        if now.saturating_duration_since(last_edit) < self.title_save_delay {
            return;
        }
        let Some(id) = self.session.current_post_id().map(str::to_string) else {
            return;
        };
        self.title_revision += 1;
        if self
            .backend
            .cmd_tx
            .send(BackendCmd::SaveTitle {
                id,
                title: self.edit_title.clone(),
                revision: self.title_revision,
            })
            .is_err()
        {
            self.title_dirty = false;
            self.push_notice(NoticeKind::Error, "Title save failed: backend unavailable.");
            return;
        }
        self.title_dirty = false;
        self.title_save_in_flight = true;
    }

    /// Publish the open post. Pending edits are flushed first so the worker
    /// persists them before the publish call.
    ///
    /// When a save is already in flight the publish is queued behind the
    /// deferred flush and sent from [`EditorApp::tick_at`].
    pub fn publish(&mut self, now: Instant) {
        let Some(id) = self.session.current_post_id().map(str::to_string) else {
            return;
        };
        if self.publish_in_flight || self.publish_queued {
            return;
        }
        if let Some(request) = self.autosave.flush(now, &self.session) {
            self.send_save(request);
        }
        if self.autosave.is_pending() {
            debug!(post_id = %id, "publish queued behind in-flight save");
            self.publish_queued = true;
            return;
        }
        self.publish_in_flight = self.send_publish(id);
    }

    /// Send a queued publish once the deferred flush has been issued.
    fn maybe_send_queued_publish(&mut self) {
        if !self.publish_queued || self.autosave.is_pending() {
            return;
        }
        self.publish_queued = false;
        if let Some(id) = self.session.current_post_id().map(str::to_string) {
            self.publish_in_flight = self.send_publish(id);
        }
    }

    /// Publish any post by id, e.g. from the post list.
    pub fn publish_post(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.session.current_post_id() == Some(id.as_str()) {
            if self.publish_in_flight {
                return;
            }
            self.publish_in_flight = self.send_publish(id);
        } else {
            self.send_publish(id);
        }
    }

    fn send_publish(&mut self, id: String) -> bool {
        if self.backend.cmd_tx.send(BackendCmd::PublishPost { id }).is_err() {
            self.push_notice(NoticeKind::Error, "Publish failed: backend unavailable.");
            return false;
        }
        true
    }

    /// Delete a post. Deleting the open post tears the session down first,
    /// so no save for it can fire afterwards.
    pub fn delete_post(&mut self, id: impl Into<String>) {
        let id = id.into();
        let is_open = self.session.current_post_id() == Some(id.as_str())
            || self.pending_open.as_deref() == Some(id.as_str());
        if is_open {
            self.close_post();
        }
        if self
            .backend
            .cmd_tx
            .send(BackendCmd::DeletePost { id })
            .is_err()
        {
            self.push_notice(NoticeKind::Error, "Delete failed: backend unavailable.");
        }
    }

    /// Request the post list, optionally filtered by status. Replies for an
    /// older filter are discarded.
    pub fn refresh_posts(&mut self, status: Option<PostStatus>) {
        self.list_filter = status;
        if self
            .backend
            .cmd_tx
            .send(BackendCmd::ListPosts { status })
            .is_err()
        {
            self.push_notice(NoticeKind::Error, "Refresh failed: backend unavailable.");
        }
    }

    /// Summarize the open document's plain text. Never cached: every call
    /// issues a fresh request.
    pub fn request_summary(&mut self) {
        let text = self.document.text_content();
        if text.trim().is_empty() {
            self.summary = SummaryState::Failed(EMPTY_EDITOR_MESSAGE.to_string());
            return;
        }
        self.summary_request_id += 1;
        let request_id = self.summary_request_id;
        if self
            .backend
            .cmd_tx
            .send(BackendCmd::Summarize { request_id, text })
            .is_err()
        {
            self.summary = SummaryState::Failed(SUMMARY_FAILED_MESSAGE.to_string());
            return;
        }
        self.summary = SummaryState::Loading { request_id };
    }

    pub fn clear_summary(&mut self) {
        self.summary = SummaryState::Idle;
    }

    /// Drain worker replies, then fire the autosave and title timers that
    /// are due at `now`.
    pub fn tick_at(&mut self, now: Instant) {
        while let Ok(event) = self.backend.evt_rx.try_recv() {
            self.apply_event(event);
        }
        match self.autosave.poll(now, &self.session) {
            Some(request) => {
                if std::mem::take(&mut self.explicit_save_queued) {
                    self.explicit_save_seq = Some(request.ticket.seq);
                }
                self.send_save(request);
            }
            None if !self.autosave.is_pending() => self.explicit_save_queued = false,
            None => {}
        }
        self.maybe_send_queued_publish();
        self.maybe_save_title(now);
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn apply_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::PostLoaded { post } => {
                if self.pending_open.as_deref() != Some(post.id.as_str()) {
                    debug!(post_id = %post.id, "dropping load for a post no longer requested");
                    return;
                }
                self.pending_open = None;
                self.adopt_post(post);
            }
            BackendEvent::PostLoadFailed { id, error } => {
                if self.pending_open.as_deref() != Some(id.as_str()) {
                    return;
                }
                self.pending_open = None;
                warn!(post_id = %id, error = %error, "post failed to load");
                self.push_notice(
                    NoticeKind::Error,
                    failure_message(&error, "Failed to load post"),
                );
            }
            BackendEvent::ContentSaved { ticket, saved_at } => {
                let ack = self
                    .autosave
                    .on_save_result(&ticket, Ok(saved_at), &mut self.session);
                debug!(?ack, seq = ticket.seq, "content save acknowledged");
                if self.explicit_save_seq == Some(ticket.seq) {
                    self.explicit_save_seq = None;
                }
            }
            BackendEvent::ContentSaveFailed { ticket, error } => {
                let ack = self.autosave.on_save_result(
                    &ticket,
                    Err(error.clone()),
                    &mut self.session,
                );
                debug!(?ack, seq = ticket.seq, "content save failed");
                if self.session.is_current(&ticket.post_id, ticket.epoch) {
                    self.report_explicit_save_failure(ticket.seq, &error);
                }
            }
            BackendEvent::TitleSaved { post, revision } => {
                if !self.is_current_title_ack(&post.id, revision) {
                    return;
                }
                self.title_save_in_flight = false;
                self.update_listed(&post);
                if let Some(current) = self.post.as_mut() {
                    current.title = post.title;
                    current.updated_at = post.updated_at;
                }
            }
            BackendEvent::TitleSaveFailed {
                id,
                revision,
                error,
            } => {
                if !self.is_current_title_ack(&id, revision) {
                    return;
                }
                self.title_save_in_flight = false;
                warn!(post_id = %id, error = %error, "title save failed");
                self.push_notice(NoticeKind::Error, "Failed to save title");
            }
            BackendEvent::PostPublished { post } => {
                if self.session.current_post_id() == Some(post.id.as_str()) {
                    self.publish_in_flight = false;
                    if let Some(current) = self.post.as_mut() {
                        current.status = post.status;
                        current.updated_at = post.updated_at;
                    }
                }
                self.update_listed(&post);
                self.push_notice(NoticeKind::Success, "Post published successfully!");
            }
            BackendEvent::PublishFailed { id, error } => {
                if self.session.current_post_id() == Some(id.as_str()) {
                    self.publish_in_flight = false;
                }
                self.push_notice(
                    NoticeKind::Error,
                    failure_message(&error, "Failed to publish post"),
                );
            }
            BackendEvent::PostDeleted { id } => {
                self.posts.retain(|item| item.id != id);
                self.push_notice(NoticeKind::Success, "Post deleted.");
            }
            BackendEvent::DeleteFailed { id, error } => {
                warn!(post_id = %id, error = %error, "delete failed");
                self.push_notice(
                    NoticeKind::Error,
                    failure_message(&error, "Failed to delete post"),
                );
            }
            BackendEvent::PostList { status, items } => {
                if status != self.list_filter {
                    debug!(?status, "dropping list for a stale filter");
                    return;
                }
                self.posts = items;
            }
            BackendEvent::ListFailed { error } => {
                self.push_notice(
                    NoticeKind::Error,
                    failure_message(&error, "Failed to load posts"),
                );
            }
            BackendEvent::SummaryReady {
                request_id,
                summary,
            } => {
                if self.summary == (SummaryState::Loading { request_id }) {
                    self.summary = SummaryState::Ready(summary);
                } else {
                    debug!(request_id, "dropping stale summary");
                }
            }
            BackendEvent::SummaryFailed { request_id, error } => {
                if self.summary == (SummaryState::Loading { request_id }) {
                    warn!(request_id, error = %error, "summary failed");
                    self.summary = SummaryState::Failed(SUMMARY_FAILED_MESSAGE.to_string());
                }
            }
        }
    }

    fn is_current_title_ack(&self, id: &str, revision: u64) -> bool {
        self.title_save_in_flight
            && revision == self.title_revision
            && self.session.current_post_id() == Some(id)
    }

    /// Replace the list row for `post`, if listed and still matching the filter.
    fn update_listed(&mut self, post: &Post) {
        let filter = self.list_filter;
        if filter.is_some_and(|status| status != post.status) {
            self.posts.retain(|item| item.id != post.id);
            return;
        }
        if let Some(item) = self.posts.iter_mut().find(|item| item.id == post.id) {
            *item = PostSummary::from(post);
        }
    }
}
