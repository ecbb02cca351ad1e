//! User-facing notices for explicit actions.

use super::EditorApp;
use smartblog_core::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// The collaborator's message, or `fallback` when it sent none.
pub(super) fn failure_message(error: &PersistenceError, fallback: &str) -> String {
    if error.message.trim().is_empty() {
        fallback.to_string()
    } else {
        error.message.clone()
    }
}

impl EditorApp {
    /// Queue a notice. A repeat of the newest notice is coalesced and the
    /// oldest entries are dropped past the configured limit.
    pub(super) fn push_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        if let Some(last) = self.notices.back() {
            if last.kind == kind && last.message == message {
                return;
            }
        }
        self.notices.push_back(Notice { kind, message });
        while self.notices.len() > self.config.notice_limit.max(1) {
            self.notices.pop_front();
        }
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn dismiss_notice(&mut self, index: usize) -> Option<Notice> {
        self.notices.remove(index)
    }

    /// Remove and return every queued notice, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}
