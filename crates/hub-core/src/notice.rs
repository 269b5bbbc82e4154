//! User-visible failure notices raised when a request fails.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::ErrorCode;
use crate::store::RequestId;

/// Notices beyond this many are dropped oldest-first.
pub const NOTICE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub request: Option<RequestId>,
    pub code: ErrorCode,
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    #[must_use]
    pub fn age(&self) -> Duration {
        self.raised_at.elapsed()
    }
}

/// Bounded FIFO of notices not yet dismissed.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn raise(&mut self, request: Option<RequestId>, code: ErrorCode, message: impl Into<String>) {
        if self.queue.len() == NOTICE_CAPACITY {
            self.queue.pop_front();
        }
        self.queue.push_back(Notice {
            request,
            code,
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Notice> {
        self.queue.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    /// Remove and return the most recent notice.
    pub fn dismiss_latest(&mut self) -> Option<Notice> {
        self.queue.pop_back()
    }

    /// Drop notices older than `ttl`.
    pub fn expire(&mut self, ttl: Duration) {
        self.queue.retain(|n| n.age() < ttl);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Notice> + '_ {
        self.queue.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_drops_oldest() {
        let mut notices = Notices::default();
        for i in 0..=NOTICE_CAPACITY {
            notices.raise(None, ErrorCode::TransportFailed, format!("n{i}"));
        }
        assert_eq!(notices.len(), NOTICE_CAPACITY);
        assert_eq!(notices.iter().next().map(|n| n.message.as_str()), Some("n1"));
        assert_eq!(
            notices.latest().map(|n| n.message.clone()),
            Some(format!("n{NOTICE_CAPACITY}"))
        );
    }

    #[test]
    fn dismiss_and_expire() {
        let mut notices = Notices::default();
        notices.raise(Some(RequestId(1)), ErrorCode::GraphqlError, "a");
        notices.raise(Some(RequestId(2)), ErrorCode::GraphqlError, "b");
        assert_eq!(notices.dismiss_latest().map(|n| n.message), Some("b".into()));
        notices.expire(Duration::ZERO);
        assert!(notices.is_empty());
    }
}
