//! Loading, title, publish, delete, list, summary and notice tests.

use super::*;
use chrono::Utc;
use smartblog_core::{PersistenceError, PostStatus, PostSummary};

const HELLO_DOC: &str = r#"{"root":{"type":"root","version":1,"children":[
    {"type":"paragraph","version":1,"children":[
        {"type":"text","version":1,"format":0,"text":"Hello world"}]}]}}"#;

fn summary_row(id: &str, status: PostStatus) -> PostSummary {
    PostSummary {
        id: id.to_string(),
        title: format!("Title {}", id),
        status,
        content_len: 2,
        updated_at: Utc::now(),
    }
}

#[test]
fn loaded_post_starts_clean_with_caret_at_end() {
    let mut harness = make_app();
    harness.app.open_post("p1");
    assert!(harness.app.is_loading());
    match recv_cmd(&harness.cmd_rx) {
        BackendCmd::FetchPost { id } => assert_eq!(id, "p1"),
        other => panic!("unexpected command: {:?}", other),
    }
    harness.reply(BackendEvent::PostLoaded {
        post: test_post("p1", HELLO_DOC),
    });
    harness.app.tick_at(Instant::now());

    assert!(!harness.app.is_loading());
    assert_eq!(harness.app.title(), "Title p1");
    assert_eq!(harness.app.session().serialized_content(), HELLO_DOC);
    assert!(!harness.app.session().is_dirty());
    assert_eq!(harness.app.document().text_content(), "Hello world");

    harness.type_text("!", Instant::now());
    assert!(harness.app.document().text_content().ends_with("world!"));
}

#[test]
fn unknown_node_type_aborts_the_open() {
    let mut harness = make_app();
    let content = r#"{"root":{"type":"root","version":1,"children":[
        {"type":"youtube","version":1,"videoId":"abc"}]}}"#;
    harness.open(test_post("p1", content));

    assert!(!harness.app.session().is_open());
    assert!(harness.app.post().is_none());
    let notices = harness.app.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert!(notices[0].message.contains("youtube"));
}

#[test]
fn load_failure_uses_collaborator_message_or_fallback() {
    let mut harness = make_app();
    harness.app.open_post("p1");
    let _ = recv_cmd(&harness.cmd_rx);
    harness.app.apply_event(BackendEvent::PostLoadFailed {
        id: "p1".to_string(),
        error: PersistenceError::not_found("p1"),
    });
    harness.app.open_post("p2");
    let _ = recv_cmd(&harness.cmd_rx);
    harness.app.apply_event(BackendEvent::PostLoadFailed {
        id: "p2".to_string(),
        error: PersistenceError::new("", None),
    });

    let messages: Vec<String> = harness
        .app
        .take_notices()
        .into_iter()
        .map(|notice| notice.message)
        .collect();
    assert_eq!(
        messages,
        vec!["Post 'p1' not found".to_string(), "Failed to load post".to_string()]
    );
    assert!(!harness.app.is_loading());
}

#[test]
fn late_load_for_abandoned_post_is_dropped() {
    let mut harness = make_app();
    harness.app.open_post("a");
    harness.app.open_post("b");
    harness.app.apply_event(BackendEvent::PostLoaded {
        post: test_post("a", HELLO_DOC),
    });
    assert!(!harness.app.session().is_open());
    assert!(harness.app.is_loading());

    harness.app.apply_event(BackendEvent::PostLoaded {
        post: test_post("b", "{}"),
    });
    assert_eq!(harness.app.session().current_post_id(), Some("b"));
}

#[test]
fn title_edits_are_debounced_into_one_save() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let start = Instant::now();
    harness.app.set_title("New", start);
    harness.app.set_title("New title", start + Duration::from_millis(300));

    harness.app.tick_at(start + Duration::from_millis(300) + TITLE_DELAY / 2);
    assert_no_cmd(&harness.cmd_rx);

    harness.app.tick_at(start + Duration::from_millis(300) + TITLE_DELAY);
    let revision = match recv_cmd(&harness.cmd_rx) {
        BackendCmd::SaveTitle {
            id,
            title,
            revision,
        } => {
            assert_eq!(id, "p1");
            assert_eq!(title, "New title");
            revision
        }
        other => panic!("unexpected command: {:?}", other),
    };
    assert_no_cmd(&harness.cmd_rx);

    let mut saved = test_post("p1", "{}");
    saved.title = "New title".to_string();
    harness.app.apply_event(BackendEvent::TitleSaved {
        post: saved,
        revision,
    });
    assert_eq!(harness.app.post().map(|post| post.title.as_str()), Some("New title"));
    assert!(!harness.app.session().is_dirty());
    assert_eq!(harness.app.notices().count(), 0);
}

#[test]
fn title_save_failure_is_surfaced() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let start = Instant::now();
    harness.app.set_title("Broken", start);
    harness.app.tick_at(start + TITLE_DELAY);
    let revision = match recv_cmd(&harness.cmd_rx) {
        BackendCmd::SaveTitle { revision, .. } => revision,
        other => panic!("unexpected command: {:?}", other),
    };

    harness.app.apply_event(BackendEvent::TitleSaveFailed {
        id: "p1".to_string(),
        revision,
        error: PersistenceError::unavailable(),
    });
    let notices = harness.app.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to save title");
    assert_eq!(harness.app.title(), "Broken");

    harness.app.tick_at(start + TITLE_DELAY * 4);
    assert_no_cmd(&harness.cmd_rx);
}

#[test]
fn publish_flushes_pending_edits_then_publishes() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let now = Instant::now();
    harness.type_text("ready", now);
    harness.app.publish(now);

    let (_, content) = harness.expect_save();
    assert!(content.contains("ready"));
    match recv_cmd(&harness.cmd_rx) {
        BackendCmd::PublishPost { id } => assert_eq!(id, "p1"),
        other => panic!("unexpected command: {:?}", other),
    }
    harness.app.publish(now);
    assert_no_cmd(&harness.cmd_rx);

    let mut published = test_post("p1", "{}");
    published.status = PostStatus::Published;
    harness.app.apply_event(BackendEvent::PostPublished { post: published });
    assert_eq!(
        harness.app.post().map(|post| post.status),
        Some(PostStatus::Published)
    );
    assert!(harness.app.session().is_dirty());
    let notices = harness.app.take_notices();
    assert_eq!(notices[0].kind, NoticeKind::Success);
    assert_eq!(notices[0].message, "Post published successfully!");
}

#[test]
fn publish_during_inflight_save_waits_for_the_newest_content() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let start = Instant::now();
    harness.type_text("draft", start);
    harness.app.tick_at(start + AUTOSAVE_DELAY);
    let (first, _) = harness.expect_save();

    let now = start + AUTOSAVE_DELAY + Duration::from_millis(10);
    harness.type_text(" final", now);
    harness.app.publish(now);
    harness.app.publish(now);
    harness.app.tick_at(now);
    assert_no_cmd(&harness.cmd_rx);

    harness.reply(BackendEvent::ContentSaved {
        ticket: first,
        saved_at: Utc::now(),
    });
    harness.app.tick_at(now);
    let (_, content) = harness.expect_save();
    assert!(content.contains("draft final"));
    match recv_cmd(&harness.cmd_rx) {
        BackendCmd::PublishPost { id } => assert_eq!(id, "p1"),
        other => panic!("unexpected command: {:?}", other),
    }
    assert_no_cmd(&harness.cmd_rx);
}

#[test]
fn closing_the_post_drops_a_queued_publish() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let start = Instant::now();
    harness.type_text("draft", start);
    harness.app.tick_at(start + AUTOSAVE_DELAY);
    let (first, _) = harness.expect_save();

    harness.type_text("!", start + AUTOSAVE_DELAY);
    harness.app.publish(start + AUTOSAVE_DELAY);
    harness.app.close_post();
    harness.reply(BackendEvent::ContentSaved {
        ticket: first,
        saved_at: Utc::now(),
    });
    harness.app.tick_at(start + AUTOSAVE_DELAY * 3);
    assert_no_cmd(&harness.cmd_rx);
}

#[test]
fn publish_failure_keeps_draft_status() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    harness.app.publish(Instant::now());
    let _ = recv_cmd(&harness.cmd_rx);
    harness.app.apply_event(BackendEvent::PublishFailed {
        id: "p1".to_string(),
        error: PersistenceError::new("", Some(500)),
    });
    assert_eq!(harness.app.post().map(|post| post.status), Some(PostStatus::Draft));
    let notices = harness.app.take_notices();
    assert_eq!(notices[0].message, "Failed to publish post");

    harness.app.publish(Instant::now());
    match recv_cmd(&harness.cmd_rx) {
        BackendCmd::PublishPost { id } => assert_eq!(id, "p1"),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn deleting_another_post_keeps_the_session() {
    let mut harness = make_app();
    harness.app.refresh_posts(None);
    let _ = recv_cmd(&harness.cmd_rx);
    harness.app.apply_event(BackendEvent::PostList {
        status: None,
        items: vec![
            summary_row("p1", PostStatus::Draft),
            summary_row("p2", PostStatus::Draft),
        ],
    });
    harness.open(test_post("p1", "{}"));

    harness.app.delete_post("p2");
    match recv_cmd(&harness.cmd_rx) {
        BackendCmd::DeletePost { id } => assert_eq!(id, "p2"),
        other => panic!("unexpected command: {:?}", other),
    }
    assert_eq!(harness.app.session().current_post_id(), Some("p1"));

    harness.app.apply_event(BackendEvent::PostDeleted {
        id: "p2".to_string(),
    });
    let ids: Vec<&str> = harness.app.posts().iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["p1"]);
    assert_eq!(harness.app.take_notices()[0].message, "Post deleted.");
}

#[test]
fn delete_failure_is_surfaced() {
    let mut harness = make_app();
    harness.app.delete_post("p9");
    let _ = recv_cmd(&harness.cmd_rx);
    harness.app.apply_event(BackendEvent::DeleteFailed {
        id: "p9".to_string(),
        error: PersistenceError::not_found("p9"),
    });
    let notices = harness.app.take_notices();
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert_eq!(notices[0].message, "Post 'p9' not found");
}

#[test]
fn list_replies_for_an_old_filter_are_dropped() {
    let mut harness = make_app();
    harness.app.refresh_posts(None);
    harness.app.refresh_posts(Some(PostStatus::Published));
    assert_eq!(harness.app.list_filter(), Some(PostStatus::Published));

    harness.app.apply_event(BackendEvent::PostList {
        status: None,
        items: vec![summary_row("draft", PostStatus::Draft)],
    });
    assert!(harness.app.posts().is_empty());

    harness.app.apply_event(BackendEvent::PostList {
        status: Some(PostStatus::Published),
        items: vec![summary_row("live", PostStatus::Published)],
    });
    assert_eq!(harness.app.posts().len(), 1);
    assert_eq!(harness.app.posts()[0].id, "live");
}

#[test]
fn summary_of_empty_editor_never_calls_the_collaborator() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    harness.app.request_summary();
    assert_eq!(
        harness.app.summary(),
        &SummaryState::Failed(EMPTY_EDITOR_MESSAGE.to_string())
    );
    assert_no_cmd(&harness.cmd_rx);
}

#[test]
fn summary_requests_are_fresh_and_stale_replies_dropped() {
    let mut harness = make_app();
    harness.open(test_post("p1", HELLO_DOC));

    harness.app.request_summary();
    let first = match recv_cmd(&harness.cmd_rx) {
        BackendCmd::Summarize { request_id, text } => {
            assert_eq!(text, "Hello world");
            request_id
        }
        other => panic!("unexpected command: {:?}", other),
    };
    harness.app.request_summary();
    let second = match recv_cmd(&harness.cmd_rx) {
        BackendCmd::Summarize { request_id, .. } => request_id,
        other => panic!("unexpected command: {:?}", other),
    };
    assert_ne!(first, second);

    harness.app.apply_event(BackendEvent::SummaryReady {
        request_id: first,
        summary: "old".to_string(),
    });
    assert_eq!(harness.app.summary(), &SummaryState::Loading { request_id: second });

    harness.app.apply_event(BackendEvent::SummaryReady {
        request_id: second,
        summary: "A greeting.".to_string(),
    });
    assert_eq!(harness.app.summary(), &SummaryState::Ready("A greeting.".to_string()));
}

#[test]
fn summary_failure_and_close_reset() {
    let mut harness = make_app();
    harness.open(test_post("p1", HELLO_DOC));
    harness.app.request_summary();
    let request_id = match recv_cmd(&harness.cmd_rx) {
        BackendCmd::Summarize { request_id, .. } => request_id,
        other => panic!("unexpected command: {:?}", other),
    };
    harness.app.apply_event(BackendEvent::SummaryFailed {
        request_id,
        error: PersistenceError::unavailable(),
    });
    assert_eq!(
        harness.app.summary(),
        &SummaryState::Failed(SUMMARY_FAILED_MESSAGE.to_string())
    );

    harness.app.request_summary();
    let request_id = match recv_cmd(&harness.cmd_rx) {
        BackendCmd::Summarize { request_id, .. } => request_id,
        other => panic!("unexpected command: {:?}", other),
    };
    harness.app.close_post();
    harness.app.apply_event(BackendEvent::SummaryReady {
        request_id,
        summary: "late".to_string(),
    });
    assert_eq!(harness.app.summary(), &SummaryState::Idle);
}

#[test]
fn notices_coalesce_repeats_and_stay_bounded() {
    let mut harness = make_app();
    for _ in 0..3 {
        harness.app.apply_event(BackendEvent::ListFailed {
            error: PersistenceError::unavailable(),
        });
    }
    assert_eq!(harness.app.notices().count(), 1);

    for id in ["a", "b", "c", "d"] {
        harness.app.apply_event(BackendEvent::DeleteFailed {
            id: id.to_string(),
            error: PersistenceError::not_found(id),
        });
    }
    let messages: Vec<&str> = harness
        .app
        .notices()
        .map(|notice| notice.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec!["Post 'b' not found", "Post 'c' not found", "Post 'd' not found"]
    );
    assert_eq!(harness.app.dismiss_notice(0).map(|n| n.message), Some("Post 'b' not found".to_string()));
    assert_eq!(harness.app.notices().count(), 2);
}
