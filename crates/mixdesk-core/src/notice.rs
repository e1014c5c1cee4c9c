//! User-visible, non-fatal notifications.

use crate::error::{ErrorCategory, MixdeskError};
use std::collections::VecDeque;

/// How loudly a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message for the user about something that did not go as asked.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub category: ErrorCategory,
    pub message: String,
}

impl Notice {
    /// Build a notice from an error, picking severity from its category.
    pub fn from_error(err: &MixdeskError) -> Self {
        let category = err.category();
        let severity = match category {
            ErrorCategory::Validation => Severity::Warning,
            ErrorCategory::Deserialization => Severity::Warning,
            ErrorCategory::Persistence | ErrorCategory::Internal => Severity::Error,
        };
        Self {
            severity,
            category,
            message: err.to_string(),
        }
    }

    /// An informational notice.
    pub fn info(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            category,
            message: message.into(),
        }
    }
}

/// Bounded FIFO of pending notices. The oldest entry is dropped on overflow.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    entries: VecDeque<Notice>,
    capacity: usize,
}

impl NoticeQueue {
    /// Create a queue holding at most `capacity` notices.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, notice: Notice) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(notice);
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new(32)
    }
}
