//! Background worker thread for persistence and summarization calls.

mod post;
mod summary;

use crate::backend::{BackendCmd, BackendEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use smartblog_core::{PostStore, Summarizer};
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Handle for sending commands to, and receiving events from, the worker.
pub struct BackendHandle {
    pub cmd_tx: Sender<BackendCmd>,
    pub evt_rx: Receiver<BackendEvent>,
}

impl BackendHandle {
    /// Wrap an existing channel pair, so callers can drive the editor without
    /// a worker thread and observe or inject traffic directly.
    pub fn from_channels(cmd_tx: Sender<BackendCmd>, evt_rx: Receiver<BackendEvent>) -> Self {
        Self { cmd_tx, evt_rx }
    }
}

/// State owned by the worker thread and passed to every handler.
pub(super) struct WorkerState {
    pub(super) store: Arc<dyn PostStore>,
    pub(super) summarizer: Arc<dyn Summarizer>,
    pub(super) evt_tx: Sender<BackendEvent>,
}

impl WorkerState {
    pub(super) fn send(&self, event: BackendEvent) {
        // The editing side may already be gone during shutdown.
        let _ = self.evt_tx.send(event);
    }
}

/// Spawn the worker thread that performs blocking collaborator calls.
///
/// Calls run in command order, one at a time; the editing thread never
/// blocks on them and picks up [`BackendEvent`] replies when it ticks. The
/// thread exits once every command sender has been dropped.
///
/// # Returns
/// A [`BackendHandle`] containing the command sender and event receiver.
///
/// # Errors
/// Returns an error if the worker thread cannot be spawned.
pub fn spawn_backend(
    store: Arc<dyn PostStore>,
    summarizer: Arc<dyn Summarizer>,
) -> io::Result<BackendHandle> {
    let (cmd_tx, cmd_rx) = unbounded();
    let (evt_tx, evt_rx) = unbounded();

    thread::Builder::new()
        .name("smartblog-backend".to_string())
        .spawn(move || {
            let mut state = WorkerState {
                store,
                summarizer,
                evt_tx,
            };
            for cmd in cmd_rx.iter() {
                run_command(&mut state, cmd);
            }
            info!("backend worker stopped");
        })?;

    Ok(BackendHandle { cmd_tx, evt_rx })
}

fn run_command(state: &mut WorkerState, cmd: BackendCmd) {
    match cmd {
        BackendCmd::FetchPost { id } => post::handle_fetch_post(state, id),
        BackendCmd::SaveContent { ticket, content } => {
            post::handle_save_content(state, ticket, content)
        }
        BackendCmd::SaveTitle {
            id,
            title,
            revision,
        } => post::handle_save_title(state, id, title, revision),
        BackendCmd::PublishPost { id } => post::handle_publish_post(state, id),
        BackendCmd::DeletePost { id } => post::handle_delete_post(state, id),
        BackendCmd::ListPosts { status } => post::handle_list_posts(state, status),
        BackendCmd::Summarize { request_id, text } => {
            debug!(request_id, chars = text.chars().count(), "summarize requested");
            summary::handle_summarize(state, request_id, text)
        }
    }
}
