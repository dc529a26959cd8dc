//! Idle and stale session eviction.
//!
//! The [`Reaper`] applies [`Session::check_status`] to a set of sessions and
//! force-closes the ones that are no longer worth keeping. Walking the
//! session table and scheduling sweeps is left to the caller.

use crate::interest::Status;
use crate::session::{ReadHandler, Session};
use crate::transport::Transport;

use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Keep-alive used when none is configured.
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Outcome of one [`Reaper::sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Sessions left untouched.
    pub active: usize,

    /// Sessions closed for inactivity.
    pub idle: usize,

    /// Sessions closed because their queued data stopped moving.
    pub stale: usize,
}

/// Builder for configuring and creating a [`Reaper`].
///
/// # Examples
///
/// ```rust,ignore
/// let reaper = ReaperBuilder::new()
///     .keep_alive(Duration::from_secs(30))
///     .build();
/// ```
pub struct ReaperBuilder {
    keep_alive: Duration,
}

impl ReaperBuilder {
    /// Creates a new `ReaperBuilder` with a 60 second keep-alive.
    pub fn new() -> Self {
        Self {
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Sets how long a session may stay quiet before it counts as idle.
    ///
    /// Sessions with queued data are only evicted after eight times this
    /// duration.
    ///
    /// # Panics
    ///
    /// Panics if `keep_alive` is zero.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        assert!(!keep_alive.is_zero(), "keep_alive must be > 0");

        self.keep_alive = keep_alive;
        self
    }

    /// Builds the configured [`Reaper`].
    pub fn build(self) -> Reaper {
        Reaper {
            keep_alive_ms: self.keep_alive.as_millis().min(u64::MAX as u128) as u64,
        }
    }
}

impl Default for ReaperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes idle and stale sessions.
#[derive(Debug, Clone, Copy)]
pub struct Reaper {
    keep_alive_ms: u64,
}

impl Reaper {
    /// Keep-alive window in milliseconds.
    pub fn keep_alive_ms(&self) -> u64 {
        self.keep_alive_ms
    }

    /// Classifies every session at time `now` (milliseconds since the
    /// epoch) and force-closes the idle and stale ones.
    ///
    /// Sessions whose transport is already closed are skipped.
    #[instrument(skip_all, fields(keep_alive_ms = self.keep_alive_ms))]
    pub fn sweep<'a, T, H, I>(&self, sessions: I, now: u64) -> SweepReport
    where
        T: Transport + 'a,
        H: ReadHandler<T> + 'a,
        I: IntoIterator<Item = &'a Session<T, H>>,
    {
        let mut report = SweepReport::default();

        for session in sessions {
            if !session.transport().is_open() {
                continue;
            }

            match session.check_status(now, self.keep_alive_ms) {
                Status::Active => {
                    report.active += 1;
                    continue;
                }
                Status::Idle => {
                    debug!(
                        token = session.token().0,
                        remote = ?session.remote_host(),
                        "closing idle session"
                    );
                    report.idle += 1;
                }
                Status::Stale => {
                    warn!(
                        token = session.token().0,
                        remote = ?session.remote_host(),
                        pending = session.queue_stats().bytes,
                        "closing stale session"
                    );
                    report.stale += 1;
                }
            }

            session.close();
        }

        report
    }
}
