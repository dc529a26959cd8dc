//! Per-connection session state machine.
//!
//! A [`Session`] sits between a selector and a transport. It is driven from
//! two sides:
//! - the selector thread calls [`Session::dispatch`] with the fired events,
//! - application threads call [`Session::write`], [`Session::close`] and
//!   [`Session::schedule_close`] whenever they need to.
//!
//! Data the transport does not accept right away is copied into an ordered
//! write queue and flushed on later writable events. The interest registered
//! with the selector always reflects what the session needs next, including
//! the inverted case where the transport asked for readiness in the opposite
//! direction.

mod handler;
mod queue;

pub use handler::{ReadHandler, ReadOnce};
pub use queue::QueueStats;

use crate::clock::{IN_DISPATCH, now_millis};
use crate::error::{Error, Result};
use crate::interest::{Interest, Status};
use crate::selector::{Registration, Token};
use crate::transport::{Transfer, Transport};
use queue::{Segment, WriteQueue};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// How many keep-alive periods queued data may sit still before the
/// session is considered stale.
const STALE_FACTOR: u64 = 8;

/// State shared between the dispatch thread and application threads.
struct State {
    /// Interest currently registered with the selector, flags included.
    interest: Interest,

    /// Set once a close was requested; no further writes are accepted.
    closing: bool,

    /// Unsent outbound data, in submission order.
    queue: WriteQueue,
}

/// One connection driven by a selector.
///
/// `T` is the transport, `H` the strategy invoked when the session should
/// consume incoming data.
pub struct Session<T, H = ReadOnce> {
    transport: T,
    registration: Registration,
    handler: H,
    state: Mutex<State>,
    /// Milliseconds since the epoch, or [`IN_DISPATCH`].
    last_access: AtomicU64,
}

impl<T: Transport> Session<T> {
    /// Creates a session with the default [`ReadOnce`] handler.
    pub fn new(transport: T, registration: Registration) -> Self {
        Self::with_handler(transport, registration, ReadOnce)
    }
}

impl<T: Transport, H: ReadHandler<T>> Session<T, H> {
    /// Creates a session around an already registered transport.
    ///
    /// The session starts interested in reads only.
    pub fn with_handler(transport: T, registration: Registration, handler: H) -> Self {
        Self {
            transport,
            registration,
            handler,
            state: Mutex::new(State {
                interest: Interest::READABLE,
                closing: false,
                queue: WriteQueue::default(),
            }),
            last_access: AtomicU64::new(now_millis()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The transport this session drives.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The read strategy invoked by [`dispatch`](Self::dispatch).
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Token of this session's selector slot.
    pub fn token(&self) -> Token {
        self.registration.token()
    }

    /// IP address of the peer in textual form, if known.
    pub fn remote_host(&self) -> Option<String> {
        self.transport
            .remote_addr()
            .map(|address| address.ip().to_string())
    }

    /// Time of the last completed dispatch, in milliseconds since the epoch.
    ///
    /// Reads `u64::MAX` while a dispatch is in progress.
    pub fn last_access_time(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    /// Interest currently registered, including the inversion flag.
    pub fn interest(&self) -> Interest {
        self.state().interest
    }

    /// Whether a forced or graceful close has been requested.
    pub fn is_closing(&self) -> bool {
        self.state().closing
    }

    /// Classifies the session for an idle-connection reaper.
    ///
    /// With `age = now - last_access`:
    /// - `age < keep_alive` is [`Status::Active`],
    /// - otherwise an empty queue is [`Status::Idle`],
    /// - otherwise `age >= 8 * keep_alive` is [`Status::Stale`],
    /// - otherwise the session is still [`Status::Active`]: it has queued
    ///   data and gets a grace window to finish flushing it.
    pub fn check_status(&self, now: u64, keep_alive: u64) -> Status {
        let age = now.saturating_sub(self.last_access_time());

        if age < keep_alive {
            return Status::Active;
        }

        if self.state().queue.is_empty() {
            Status::Idle
        } else if age >= keep_alive.saturating_mul(STALE_FACTOR) {
            Status::Stale
        } else {
            Status::Active
        }
    }

    /// Number of queued segments and unsent bytes.
    pub fn queue_stats(&self) -> QueueStats {
        let state = self.state();

        QueueStats {
            segments: state.queue.len(),
            bytes: state.queue.bytes(),
        }
    }

    /// Changes the registered interest.
    ///
    /// Does nothing when `interest` equals the current one. Only the event
    /// bits are forwarded to the selector.
    pub fn listen(&self, interest: Interest) {
        let mut state = self.state();
        self.listen_locked(&mut state, interest);
    }

    fn listen_locked(&self, state: &mut State, interest: Interest) {
        if state.interest == interest {
            return;
        }

        state.interest = interest;

        // The token may already belong to another session once we are closed.
        if self.transport.is_open() {
            self.registration.listen(interest.events());
        }
    }

    /// Reads once from the transport.
    ///
    /// Returns the number of bytes read. When the transport reports
    /// [`Transfer::Inverted`], nothing is read, `0` is returned and the
    /// session waits for write readiness to retry the read.
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize> {
        let transfer = self.transport.read(buffer)?;

        let mut state = self.state();

        match transfer {
            Transfer::Bytes(n) => {
                let next = read_done_interest(&state);
                self.listen_locked(&mut state, next);
                Ok(n)
            }
            Transfer::Inverted => {
                debug!(token = self.token().0, "read needs write readiness");
                self.listen_locked(&mut state, Interest::INVERTED | Interest::WRITEABLE);
                Ok(0)
            }
        }
    }

    /// Writes `data`, queueing whatever the transport does not take now.
    ///
    /// If older data is still queued, `data` goes straight to the tail of
    /// the queue and nothing is written: bytes always leave in the order
    /// they were submitted. Queued bytes are copied, so `data` may be reused
    /// as soon as this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] once a close has been requested, and
    /// [`Error::Io`] if the transport fails.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state();

        if state.closing {
            return Err(Error::Closed);
        }

        if !state.queue.is_empty() {
            state.queue.push(Segment::new(data));
            trace!(
                token = self.token().0,
                bytes = data.len(),
                "appended to write queue"
            );
            return Ok(());
        }

        match self.transport.write(data)? {
            Transfer::Bytes(n) if n >= data.len() => {}
            Transfer::Bytes(n) => {
                state.queue.push(Segment::new(&data[n..]));
                self.listen_locked(&mut state, Interest::WRITEABLE);
                trace!(
                    token = self.token().0,
                    written = n,
                    queued = data.len() - n,
                    "partial write"
                );
            }
            Transfer::Inverted => {
                state.queue.push(Segment::new(data));
                self.listen_locked(&mut state, Interest::INVERTED | Interest::READABLE);
                debug!(token = self.token().0, "write needs read readiness");
            }
        }

        Ok(())
    }

    /// Flushes as much of the write queue as the transport accepts.
    ///
    /// Stops at the first segment that is not fully written and leaves it
    /// at the head with its cursor advanced. If a close was scheduled, the
    /// session closes as soon as one segment has been fully written, and
    /// whatever is still queued behind it is discarded. Once the queue is
    /// empty the session goes back to read interest.
    pub fn process_write(&self) -> Result<()> {
        let mut state = self.state();

        while let Some(head) = state.queue.front_mut() {
            let requested = head.remaining();

            match self.transport.write(head.pending())? {
                Transfer::Bytes(n) if n >= requested => {}
                Transfer::Bytes(n) => {
                    head.advance(n);
                    self.listen_locked(&mut state, Interest::WRITEABLE);
                    return Ok(());
                }
                Transfer::Inverted => {
                    self.listen_locked(&mut state, Interest::INVERTED | Interest::READABLE);
                    return Ok(());
                }
            }

            state.queue.pop_front();

            if state.closing {
                self.close_locked(&mut state);
                return Ok(());
            }
        }

        self.listen_locked(&mut state, Interest::READABLE);

        Ok(())
    }

    /// Handles one poll cycle.
    ///
    /// `fired` holds the events reported by the selector and `buffer` is
    /// scratch space for the read handler. While inverted, a readable event
    /// resumes the stalled write and a writable event resumes the stalled
    /// read; otherwise the directions map straight through. A close request
    /// in `fired` force-closes the session after the events are handled.
    ///
    /// The last access time reads as "now" for the whole call, so a reaper
    /// never evicts a session mid-dispatch.
    ///
    /// # Errors
    ///
    /// Transport failures are returned unchanged; deciding whether to close
    /// the session is up to the caller.
    pub fn dispatch(&self, fired: Interest, buffer: &mut [u8]) -> Result<()> {
        self.last_access.store(IN_DISPATCH, Ordering::Relaxed);

        let result = self.handle_events(fired, buffer);

        if fired.is_closing() {
            self.close();
        }

        self.last_access.store(now_millis(), Ordering::Relaxed);

        result
    }

    fn handle_events(&self, fired: Interest, buffer: &mut [u8]) -> Result<()> {
        let (resume_write, resume_read) = if self.interest().is_inverted() {
            (fired.is_readable(), fired.is_writable())
        } else {
            (fired.is_writable(), fired.is_readable())
        };

        if resume_write {
            self.process_write()?;
        }

        // A drain may have completed a scheduled close.
        if resume_read && self.transport.is_open() {
            self.handler.handle_read(self, buffer)?;
        }

        Ok(())
    }

    /// Closes the session right away.
    ///
    /// Queued data is discarded, the registration is dropped and the
    /// transport is closed. Calling it again does nothing.
    pub fn close(&self) {
        let mut state = self.state();
        self.close_locked(&mut state);
    }

    fn close_locked(&self, state: &mut State) {
        if !self.transport.is_open() {
            return;
        }

        state.closing = true;
        let discarded = state.queue.clear();

        self.registration.unregister();
        self.transport.close();

        debug!(token = self.token().0, discarded, "session closed");
    }

    /// Closes the session once everything queued has been written.
    ///
    /// With an empty queue this is the same as [`close`](Self::close).
    /// Otherwise further writes are refused and the next drain that
    /// completes a segment performs the close.
    pub fn schedule_close(&self) {
        let mut state = self.state();

        if state.queue.is_empty() {
            self.close_locked(&mut state);
        } else {
            state.closing = true;
            debug!(
                token = self.token().0,
                pending = state.queue.bytes(),
                "close scheduled after drain"
            );
        }
    }
}

/// Interest to register after a read that moved bytes.
///
/// A writer may have queued data while the read ran outside the lock; the
/// write side keeps its interest until the queue drains.
fn read_done_interest(state: &State) -> Interest {
    if state.queue.is_empty() {
        Interest::READABLE
    } else if state.interest == Interest::INVERTED | Interest::READABLE {
        state.interest
    } else {
        Interest::WRITEABLE
    }
}
