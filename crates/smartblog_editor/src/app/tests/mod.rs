//! Behavior tests for the editing session driver.

use super::*;
use crate::backend::{BackendCmd, BackendEvent, BackendHandle};
use crossbeam_channel::{unbounded, Receiver, Sender};
use smartblog_core::{Command, Config, Post, SaveTicket};
use std::time::{Duration, Instant};

const AUTOSAVE_DELAY: Duration = Duration::from_millis(1_500);
const TITLE_DELAY: Duration = Duration::from_millis(1_000);

struct TestHarness {
    app: EditorApp,
    cmd_rx: Receiver<BackendCmd>,
    evt_tx: Sender<BackendEvent>,
}

fn test_config() -> Config {
    Config {
        autosave_delay_ms: AUTOSAVE_DELAY.as_millis() as u64,
        title_save_delay_ms: TITLE_DELAY.as_millis() as u64,
        notice_limit: 3,
        autosave_enabled: true,
    }
}

fn make_app() -> TestHarness {
    make_app_with_config(test_config())
}

fn make_app_with_config(config: Config) -> TestHarness {
    let (cmd_tx, cmd_rx) = unbounded();
    let (evt_tx, evt_rx) = unbounded();
    TestHarness {
        app: EditorApp::new(BackendHandle::from_channels(cmd_tx, evt_rx), config),
        cmd_rx,
        evt_tx,
    }
}

fn test_post(id: &str, content: &str) -> Post {
    let mut post = Post::new(format!("Title {}", id));
    post.id = id.to_string();
    post.content = content.to_string();
    post
}

fn recv_cmd(rx: &Receiver<BackendCmd>) -> BackendCmd {
    rx.recv_timeout(Duration::from_millis(200))
        .expect("expected outbound command")
}

fn assert_no_cmd(rx: &Receiver<BackendCmd>) {
    if let Ok(cmd) = rx.try_recv() {
        panic!("unexpected command: {:?}", cmd);
    }
}

impl TestHarness {
    /// Open `post` and feed back its load reply.
    fn open(&mut self, post: Post) {
        self.app.open_post(post.id.clone());
        match recv_cmd(&self.cmd_rx) {
            BackendCmd::FetchPost { id } => assert_eq!(id, post.id),
            other => panic!("unexpected command: {:?}", other),
        }
        self.app.apply_event(BackendEvent::PostLoaded { post });
    }

    fn type_text(&mut self, text: &str, now: Instant) -> bool {
        self.app.dispatch(Command::InsertText(text.to_string()), now)
    }

    /// Expect a content save and return its ticket and payload.
    fn expect_save(&self) -> (SaveTicket, String) {
        match recv_cmd(&self.cmd_rx) {
            BackendCmd::SaveContent { ticket, content } => (ticket, content),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn reply(&self, event: BackendEvent) {
        self.evt_tx.send(event).expect("send event");
    }
}

mod editing_and_math;
mod post_actions;
