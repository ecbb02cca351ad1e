//! Persistence worker wiring.
//!
//! This module exposes the command/event protocol plus the worker spawn
//! helper used by the editing thread.

mod protocol;
mod worker;

pub use protocol::{BackendCmd, BackendEvent};
pub use worker::{spawn_backend, BackendHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use smartblog_core::store::StoreResult;
    use smartblog_core::{
        MemoryPostStore, PersistenceError, PostStatus, PostStore, SaveTicket, StoreOp, Summarizer,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct WordCount;

    impl Summarizer for WordCount {
        fn summarize(&self, text: &str) -> StoreResult<String> {
            if text.contains("fail") {
                return Err(PersistenceError::new("model offline", Some(503)));
            }
            Ok(format!("{} words", text.split_whitespace().count()))
        }
    }

    fn spawn(store: &Arc<MemoryPostStore>) -> BackendHandle {
        let store: Arc<dyn PostStore> = store.clone();
        spawn_backend(store, Arc::new(WordCount)).expect("spawn backend")
    }

    fn recv_event(rx: &crossbeam_channel::Receiver<BackendEvent>) -> BackendEvent {
        rx.recv_timeout(Duration::from_secs(2))
            .expect("expected backend event")
    }

    #[test]
    fn backend_fetches_post_and_reports_missing() {
        let store = Arc::new(MemoryPostStore::new());
        let post = store.create("First").expect("create");
        let backend = spawn(&store);

        backend
            .cmd_tx
            .send(BackendCmd::FetchPost {
                id: post.id.clone(),
            })
            .expect("send fetch");
        match recv_event(&backend.evt_rx) {
            BackendEvent::PostLoaded { post: loaded } => assert_eq!(loaded, post),
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(BackendCmd::FetchPost {
                id: "missing-id".to_string(),
            })
            .expect("send missing");
        match recv_event(&backend.evt_rx) {
            BackendEvent::PostLoadFailed { id, error } => {
                assert_eq!(id, "missing-id");
                assert_eq!(error.status, Some(404));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn backend_saves_content_and_echoes_ticket() {
        let store = Arc::new(MemoryPostStore::new());
        let post = store.create("Draft").expect("create");
        let backend = spawn(&store);
        let ticket = SaveTicket {
            post_id: post.id.clone(),
            epoch: 3,
            seq: 7,
        };

        backend
            .cmd_tx
            .send(BackendCmd::SaveContent {
                ticket: ticket.clone(),
                content: "{\"root\":{}}".to_string(),
            })
            .expect("send save");
        match recv_event(&backend.evt_rx) {
            BackendEvent::ContentSaved {
                ticket: echoed,
                saved_at,
            } => {
                assert_eq!(echoed, ticket);
                assert!(saved_at >= post.updated_at);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        let stored = store.get(&post.id).expect("stored");
        assert_eq!(stored.content, "{\"root\":{}}");
        assert_eq!(stored.title, "Draft");
    }

    #[test]
    fn backend_reports_save_failures_with_ticket() {
        let store = Arc::new(MemoryPostStore::new());
        let post = store.create("Draft").expect("create");
        store.fail_next(StoreOp::Save, PersistenceError::unavailable());
        let backend = spawn(&store);
        let ticket = SaveTicket {
            post_id: post.id.clone(),
            epoch: 1,
            seq: 1,
        };

        backend
            .cmd_tx
            .send(BackendCmd::SaveContent {
                ticket: ticket.clone(),
                content: "x".to_string(),
            })
            .expect("send save");
        match recv_event(&backend.evt_rx) {
            BackendEvent::ContentSaveFailed {
                ticket: echoed,
                error,
            } => {
                assert_eq!(echoed, ticket);
                assert_eq!(error, PersistenceError::unavailable());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(store.get(&post.id).map(|p| p.content), Some("{}".to_string()));
    }

    #[test]
    fn backend_titles_publishes_lists_and_deletes() {
        let store = Arc::new(MemoryPostStore::new());
        let post = store.create("Old").expect("create");
        let other = store.create("Other").expect("create");
        let backend = spawn(&store);

        backend
            .cmd_tx
            .send(BackendCmd::SaveTitle {
                id: post.id.clone(),
                title: "New".to_string(),
                revision: 2,
            })
            .expect("send title");
        match recv_event(&backend.evt_rx) {
            BackendEvent::TitleSaved { post: saved, revision } => {
                assert_eq!(saved.title, "New");
                assert_eq!(revision, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(BackendCmd::PublishPost {
                id: post.id.clone(),
            })
            .expect("send publish");
        match recv_event(&backend.evt_rx) {
            BackendEvent::PostPublished { post: published } => {
                assert_eq!(published.status, PostStatus::Published);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(BackendCmd::ListPosts {
                status: Some(PostStatus::Published),
            })
            .expect("send list");
        match recv_event(&backend.evt_rx) {
            BackendEvent::PostList { status, items } => {
                assert_eq!(status, Some(PostStatus::Published));
                let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
                assert_eq!(ids, vec![post.id.as_str()]);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(BackendCmd::DeletePost {
                id: other.id.clone(),
            })
            .expect("send delete");
        match recv_event(&backend.evt_rx) {
            BackendEvent::PostDeleted { id } => assert_eq!(id, other.id),
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(BackendCmd::DeletePost {
                id: other.id.clone(),
            })
            .expect("send second delete");
        match recv_event(&backend.evt_rx) {
            BackendEvent::DeleteFailed { error, .. } => assert_eq!(error.status, Some(404)),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn backend_summarizes_and_reports_failures() {
        let store = Arc::new(MemoryPostStore::new());
        let backend = spawn(&store);

        backend
            .cmd_tx
            .send(BackendCmd::Summarize {
                request_id: 1,
                text: "three small words".to_string(),
            })
            .expect("send summarize");
        match recv_event(&backend.evt_rx) {
            BackendEvent::SummaryReady {
                request_id,
                summary,
            } => {
                assert_eq!(request_id, 1);
                assert_eq!(summary, "3 words");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(BackendCmd::Summarize {
                request_id: 2,
                text: "please fail".to_string(),
            })
            .expect("send summarize");
        match recv_event(&backend.evt_rx) {
            BackendEvent::SummaryFailed { request_id, error } => {
                assert_eq!(request_id, 2);
                assert_eq!(error.status, Some(503));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
