//! # Duplex
//!
//! **Duplex** is the per-connection engine of a readiness-driven,
//! non-blocking network server. A selector (such as `epoll`) drives each
//! [`Session`] whenever its descriptor fires, and application threads drive
//! the same session whenever they have data to send.
//!
//! A session takes care of:
//!
//! - turning readable/writable readiness into read and write attempts,
//!   including transports that need readiness in the *opposite* direction
//!   to make progress (see [`Transfer::Inverted`]),
//! - queueing data the transport did not accept and flushing it in order,
//!   safely from any thread,
//! - classifying its own liveness so a [`Reaper`] can evict idle or stuck
//!   connections.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use duplex::{EpollSelector, Registration, Session, SocketTransport};
//! use std::sync::Arc;
//!
//! let selector = Arc::new(EpollSelector::new()?);
//! let transport = SocketTransport::from_std(stream)?;
//! let token = selector.register(transport.as_raw_fd())?;
//! let session = Session::new(transport, Registration::new(selector.clone(), token));
//!
//! session.write(b"hello")?;
//!
//! let mut scratch = [0u8; 4096];
//! for ready in selector.select(None)? {
//!     // look up the session for `ready.token`, then:
//!     session.dispatch(ready.events, &mut scratch)?;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`session`] — The session state machine and its write queue
//! - [`selector`] — The multiplexer contract and the `epoll` selector
//! - [`transport`] — The transport contract and the socket transport
//! - [`reaper`] — Idle and stale session eviction

mod clock;
mod error;
mod interest;

#[cfg(target_os = "linux")]
mod utils;

pub mod reaper;
pub mod selector;
pub mod session;
pub mod transport;

pub use clock::now_millis;
pub use error::{Error, Result};
pub use interest::{Interest, Status};
pub use reaper::{Reaper, ReaperBuilder, SweepReport};
pub use selector::{Readiness, Registration, Selector, Token};
pub use session::{QueueStats, ReadHandler, ReadOnce, Session};
pub use transport::{SocketTransport, Transfer, Transport};

#[cfg(target_os = "linux")]
pub use selector::EpollSelector;
