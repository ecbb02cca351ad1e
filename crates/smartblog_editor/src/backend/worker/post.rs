//! Post command handlers for the persistence worker.

use super::WorkerState;
use crate::backend::BackendEvent;
use smartblog_core::{PostStatus, PostSummary, SaveTicket, UpdatePostRequest};
use tracing::{error, info, warn};

pub(super) fn handle_fetch_post(state: &mut WorkerState, id: String) {
    match state.store.fetch_post(&id) {
        Ok(post) => state.send(BackendEvent::PostLoaded { post }),
        Err(err) => {
            warn!("backend fetch failed for {}: {}", id, err);
            state.send(BackendEvent::PostLoadFailed { id, error: err });
        }
    }
}

pub(super) fn handle_save_content(state: &mut WorkerState, ticket: SaveTicket, content: String) {
    let update = UpdatePostRequest::content(content);
    match state.store.save_post(&ticket.post_id, &update) {
        Ok(post) => {
            info!(post_id = %ticket.post_id, seq = ticket.seq, "content persisted");
            state.send(BackendEvent::ContentSaved {
                ticket,
                saved_at: post.updated_at,
            });
        }
        Err(err) => {
            // Autosave failures stay silent on the editing side; log them here.
            error!("backend content save failed for {}: {}", ticket.post_id, err);
            state.send(BackendEvent::ContentSaveFailed { ticket, error: err });
        }
    }
}

pub(super) fn handle_save_title(state: &mut WorkerState, id: String, title: String, revision: u64) {
    match state.store.save_post(&id, &UpdatePostRequest::title(title)) {
        Ok(post) => state.send(BackendEvent::TitleSaved { post, revision }),
        Err(err) => {
            error!("backend title save failed for {}: {}", id, err);
            state.send(BackendEvent::TitleSaveFailed {
                id,
                revision,
                error: err,
            });
        }
    }
}

pub(super) fn handle_publish_post(state: &mut WorkerState, id: String) {
    match state.store.publish_post(&id) {
        Ok(post) => {
            info!(post_id = %post.id, "post published");
            state.send(BackendEvent::PostPublished { post });
        }
        Err(err) => {
            error!("backend publish failed for {}: {}", id, err);
            state.send(BackendEvent::PublishFailed { id, error: err });
        }
    }
}

pub(super) fn handle_delete_post(state: &mut WorkerState, id: String) {
    match state.store.delete_post(&id) {
        Ok(()) => {
            info!(post_id = %id, "post deleted");
            state.send(BackendEvent::PostDeleted { id });
        }
        Err(err) => {
            error!("backend delete failed for {}: {}", id, err);
            state.send(BackendEvent::DeleteFailed { id, error: err });
        }
    }
}

pub(super) fn handle_list_posts(state: &mut WorkerState, status: Option<PostStatus>) {
    match state.store.list_posts(status) {
        Ok(posts) => {
            let items: Vec<PostSummary> = posts.iter().map(PostSummary::from).collect();
            state.send(BackendEvent::PostList { status, items });
        }
        Err(err) => {
            error!("backend list failed: {}", err);
            state.send(BackendEvent::ListFailed { error: err });
        }
    }
}
