//! Summarization handler for the persistence worker.

use super::WorkerState;
use crate::backend::BackendEvent;
use tracing::warn;

pub(super) fn handle_summarize(state: &mut WorkerState, request_id: u64, text: String) {
    match state.summarizer.summarize(&text) {
        Ok(summary) => state.send(BackendEvent::SummaryReady {
            request_id,
            summary,
        }),
        Err(err) => {
            warn!(request_id, "summarization failed: {}", err);
            state.send(BackendEvent::SummaryFailed {
                request_id,
                error: err,
            });
        }
    }
}
