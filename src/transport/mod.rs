//! Byte-level transports driven by a session.
//!
//! A [`Transport`] is a non-blocking duplex channel. Every read or write
//! attempt returns immediately with either a byte count or
//! [`Transfer::Inverted`], meaning the operation needs readiness in the
//! *opposite* direction before it can make progress (for instance a layered
//! transport in the middle of a handshake).
//!
//! This module provides:
//! - [`Transport`]: the contract consumed by [`Session`](crate::Session),
//! - [`SocketTransport`]: a plain non-blocking socket over a raw descriptor.

mod socket;
pub(crate) mod sys;

pub use socket::SocketTransport;

use std::io;
use std::net::SocketAddr;

/// Outcome of a single non-blocking transport attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// This many bytes were moved. Zero means nothing could be moved now
    /// (or an orderly EOF on reads, depending on the transport).
    Bytes(usize),

    /// The attempt did not complete; retry once the transport is ready in
    /// the opposite direction.
    Inverted,
}

/// Non-blocking duplex channel owned by a session.
///
/// Methods take `&self` so the dispatch thread can read while application
/// threads write. Implementations synchronize internally when they need to.
pub trait Transport: Send + Sync {
    /// Attempts to read into `buffer`.
    fn read(&self, buffer: &mut [u8]) -> io::Result<Transfer>;

    /// Attempts to write `buffer`. May write fewer bytes than requested.
    fn write(&self, buffer: &[u8]) -> io::Result<Transfer>;

    /// Closes the channel. Calling it on a closed transport does nothing.
    fn close(&self);

    /// Returns `true` until [`close`](Self::close) has been called.
    fn is_open(&self) -> bool;

    /// Address of the peer, if known.
    fn remote_addr(&self) -> Option<SocketAddr>;
}
