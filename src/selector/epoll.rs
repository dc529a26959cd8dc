//! Linux `epoll`-based selector.
//!
//! Responsibilities:
//! - Hand out tokens for registered descriptors
//! - Translate session interest into `EPOLLIN`/`EPOLLOUT`
//! - Block waiting for readiness and report fired events per token
//!
//! Dispatching the reported events to sessions is left to the caller,
//! which keeps its own token-to-session table.

use super::{Readiness, Selector, Token};
use crate::interest::Interest;
use crate::utils::Slab;

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLERR, EPOLLHUP, EPOLLIN,
    EPOLLOUT, epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::RawFd;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{trace, warn};

/// Maximum number of events collected by one [`select`](EpollSelector::select).
const EVENTS_CAPACITY: usize = 64;

/// Linux `epoll` selector.
///
/// This selector owns:
/// - an `epoll` instance,
/// - a slab mapping tokens to the registered descriptors.
///
/// It does not own the descriptors themselves; sessions close their
/// transports after unregistering.
pub struct EpollSelector {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Registered descriptors indexed by token.
    slots: Mutex<Slab<RawFd>>,
}

impl EpollSelector {
    /// Creates a new `EpollSelector`.
    pub fn new() -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            epoll,
            slots: Mutex::new(Slab::new(64)),
        })
    }

    fn slots(&self) -> MutexGuard<'_, Slab<RawFd>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a descriptor with read interest and returns its token.
    pub fn register(&self, fd: RawFd) -> io::Result<Token> {
        let mut slots = self.slots();
        let token = Token(slots.insert(fd));

        let mut event = epoll_event {
            events: epoll_flags(Interest::READABLE),
            u64: token.0 as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_ADD, fd, &mut event) };
        if rc < 0 {
            slots.remove(token.0);
            return Err(io::Error::last_os_error());
        }

        trace!(fd, token = token.0, "registered descriptor");

        Ok(token)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Polls for readiness.
    ///
    /// Blocks until at least one descriptor becomes ready or the optional
    /// timeout expires. An interrupted wait returns no events.
    pub fn select(&self, timeout: Option<Duration>) -> io::Result<Vec<Readiness>> {
        let timeout_ms = timeout
            .map(|t| t.as_millis().min(i32::MAX as u128) as i32)
            .unwrap_or(-1);

        let mut events: Vec<epoll_event> = Vec::with_capacity(EVENTS_CAPACITY);

        let n = unsafe {
            epoll_wait(
                self.epoll,
                events.as_mut_ptr(),
                EVENTS_CAPACITY as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(err);
        }

        unsafe {
            events.set_len(n as usize);
        }

        let fired = events
            .iter()
            .map(|ev| {
                let mut fired = Interest::NONE;

                if ev.events & ((EPOLLIN | EPOLLERR | EPOLLHUP) as u32) != 0 {
                    fired |= Interest::READABLE;
                }
                if ev.events & (EPOLLOUT as u32) != 0 {
                    fired |= Interest::WRITEABLE;
                }

                Readiness {
                    token: Token(ev.u64 as usize),
                    events: fired,
                }
            })
            .collect();

        Ok(fired)
    }
}

impl Selector for EpollSelector {
    fn listen(&self, token: Token, events: Interest) {
        let Some(&fd) = self.slots().get(token.0) else {
            return;
        };

        let mut event = epoll_event {
            events: epoll_flags(events),
            u64: token.0 as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_MOD, fd, &mut event) };
        if rc < 0 {
            warn!(
                fd,
                token = token.0,
                error = %io::Error::last_os_error(),
                "failed to update interest"
            );
        }
    }

    fn unregister(&self, token: Token) {
        let Some(fd) = self.slots().remove(token.0) else {
            return;
        };

        unsafe {
            epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut());
        }

        trace!(fd, token = token.0, "unregistered descriptor");
    }
}

impl Drop for EpollSelector {
    fn drop(&mut self) {
        unsafe { libc::close(self.epoll) };
    }
}

fn epoll_flags(interest: Interest) -> u32 {
    let mut flags = 0;

    if interest.is_readable() {
        flags |= EPOLLIN;
    }
    if interest.is_writable() {
        flags |= EPOLLOUT;
    }

    flags as u32
}
