//! Debounced persistence of the open session's content.
//!
//! The pipeline never performs I/O itself. [`AutosavePipeline::poll`] hands
//! out at most one [`SaveRequest`] at a time; the caller sends it to the
//! persistence collaborator and feeds the outcome back through
//! [`AutosavePipeline::on_save_result`].

use crate::config::Config;
use crate::error::PersistenceError;
use crate::session::EditorSession;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Identifies one save call and the session open it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub post_id: String,
    pub epoch: u64,
    pub seq: u64,
}

/// Content to persist under `ticket.post_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub ticket: SaveTicket,
    pub content: String,
}

/// How a save acknowledgement was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAck {
    /// The session is clean.
    Saved,
    /// An older snapshot was persisted; newer edits are still pending.
    SavedOlder,
    /// The call failed; the session stays dirty.
    Failed(PersistenceError),
    /// The ticket belongs to a cancelled save or a different open.
    Stale,
}

/// The single cancellable debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SaveTimer {
    deadline: Instant,
}

#[derive(Debug)]
pub struct AutosavePipeline {
    delay: Duration,
    enabled: bool,
    timer: Option<SaveTimer>,
    in_flight: Option<SaveRequest>,
    next_seq: u64,
    last_error: Option<PersistenceError>,
}

impl AutosavePipeline {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            enabled: true,
            timer: None,
            in_flight: None,
            next_seq: 0,
            last_error: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut pipeline = Self::new(config.autosave_delay());
        pipeline.enabled = config.autosave_enabled;
        pipeline
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a debounce timer is armed.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.map(|timer| timer.deadline)
    }

    /// Whether a save call is outstanding.
    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&PersistenceError> {
        self.last_error.as_ref()
    }

    /// Restart the debounce window. Only the content present when the timer
    /// fires is saved.
    pub fn on_content_changed(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.timer = Some(SaveTimer {
            deadline: now + self.delay,
        });
    }

    /// Fire the timer if it has expired.
    ///
    /// # Returns
    /// A request when the window elapsed and the content differs from the
    /// persisted snapshot. While a save is in flight the expired timer is
    /// held and fires on a later poll.
    pub fn poll(&mut self, now: Instant, session: &EditorSession) -> Option<SaveRequest> {
        let timer = self.timer?;
        if now < timer.deadline || self.in_flight.is_some() {
            return None;
        }
        self.timer = None;
        self.start_save(session)
    }

    /// Save immediately, bypassing the debounce window.
    ///
    /// While a save is in flight the flush is deferred until it completes.
    pub fn flush(&mut self, now: Instant, session: &EditorSession) -> Option<SaveRequest> {
        if self.in_flight.is_some() {
            self.timer = Some(SaveTimer { deadline: now });
            return None;
        }
        self.timer = None;
        self.start_save(session)
    }

    fn start_save(&mut self, session: &EditorSession) -> Option<SaveRequest> {
        let post_id = session.current_post_id()?;
        if session.serialized_content() == session.last_saved_content() {
            debug!(post_id, "autosave skipped: content already persisted");
            return None;
        }
        self.next_seq += 1;
        let request = SaveRequest {
            ticket: SaveTicket {
                post_id: post_id.to_string(),
                epoch: session.epoch(),
                seq: self.next_seq,
            },
            content: session.serialized_content().to_string(),
        };
        debug!(post_id, seq = self.next_seq, bytes = request.content.len(), "autosave firing");
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Apply the outcome of the call issued for `ticket`.
    ///
    /// Acknowledgements for cancelled saves or for a session that has since
    /// been closed or reopened never touch `session`.
    pub fn on_save_result(
        &mut self,
        ticket: &SaveTicket,
        result: Result<DateTime<Utc>, PersistenceError>,
        session: &mut EditorSession,
    ) -> SaveAck {
        let request = match self.in_flight.take() {
            Some(request) if request.ticket == *ticket => request,
            other => {
                self.in_flight = other;
                debug!(post_id = %ticket.post_id, seq = ticket.seq, "dropping stale save ack");
                return SaveAck::Stale;
            }
        };
        if !session.is_current(&ticket.post_id, ticket.epoch) {
            debug!(post_id = %ticket.post_id, "save ack for a closed session ignored");
            return SaveAck::Stale;
        }
        match result {
            Ok(saved_at) => {
                self.last_error = None;
                if session.serialized_content() == request.content {
                    session.mark_saved_at(saved_at);
                    info!(post_id = %ticket.post_id, "post saved");
                    SaveAck::Saved
                } else {
                    session.mark_persisted(request.content, saved_at);
                    info!(post_id = %ticket.post_id, "older snapshot saved; newer edits pending");
                    SaveAck::SavedOlder
                }
            }
            Err(err) => {
                warn!(post_id = %ticket.post_id, error = %err, "autosave failed");
                self.last_error = Some(err.clone());
                SaveAck::Failed(err)
            }
        }
    }

    /// Drop the pending timer and forget any outstanding call; its ack will
    /// be reported as [`SaveAck::Stale`].
    pub fn cancel(&mut self) {
        if self.timer.take().is_some() {
            debug!("pending autosave cancelled");
        }
        self.in_flight = None;
        self.last_error = None;
    }
}
