//! Multiplexer side of a session.
//!
//! A [`Selector`] owns the readiness registrations of many sessions. A
//! session never discovers its selector on its own: it is handed a
//! [`Registration`] at construction, which pairs a shared selector handle
//! with the [`Token`] the selector assigned to it.
//!
//! On Linux, [`EpollSelector`] provides a concrete implementation.

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(target_os = "linux")]
pub use epoll::EpollSelector;

use crate::interest::Interest;

use std::fmt;
use std::sync::Arc;

/// Slot identifier assigned by a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub usize);

/// Fired events for one registered token, as reported by a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub token: Token,
    pub events: Interest,
}

/// Registration table driving sessions.
///
/// Implementations must deliver at most one
/// [`dispatch`](crate::Session::dispatch) per session at a time. Sessions
/// call into the selector from any thread.
pub trait Selector: Send + Sync {
    /// Replaces the interest set of `token`.
    ///
    /// `events` only ever contains bits within [`Interest::EVENT_MASK`].
    fn listen(&self, token: Token, events: Interest);

    /// Drops the registration of `token`.
    fn unregister(&self, token: Token);
}

/// A session's handle on its selector slot.
#[derive(Clone)]
pub struct Registration {
    selector: Arc<dyn Selector>,
    token: Token,
}

impl Registration {
    /// Pairs a selector with the token it assigned.
    pub fn new(selector: Arc<dyn Selector>, token: Token) -> Self {
        Self { selector, token }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub(crate) fn listen(&self, events: Interest) {
        self.selector.listen(self.token, events);
    }

    pub(crate) fn unregister(&self) {
        self.selector.unregister(self.token);
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
