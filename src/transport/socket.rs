use super::sys::{sys_close, sys_peername, sys_read, sys_set_nonblocking, sys_write};
use super::{Transfer, Transport};

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};
use std::sync::atomic::{AtomicI32, Ordering};

/// Closed descriptor marker.
const CLOSED: RawFd = -1;

/// A plain non-blocking socket transport.
///
/// Reads and writes go straight to `read(2)`/`write(2)`. A socket never
/// needs opposite-direction readiness, so this transport never reports
/// [`Transfer::Inverted`]; `EAGAIN` is reported as zero bytes moved.
///
/// The descriptor is owned: it is closed by [`close`](Transport::close) or
/// when the transport is dropped, whichever comes first.
pub struct SocketTransport {
    fd: AtomicI32,
    remote: Option<SocketAddr>,
}

impl SocketTransport {
    /// Takes ownership of a connected socket descriptor and switches it to
    /// non-blocking mode.
    pub fn from_raw_fd(fd: RawFd) -> io::Result<Self> {
        sys_set_nonblocking(fd)?;

        Ok(Self {
            fd: AtomicI32::new(fd),
            remote: sys_peername(fd).ok(),
        })
    }

    /// Wraps a connected `std` TCP stream.
    pub fn from_std(stream: TcpStream) -> io::Result<Self> {
        Self::from_raw_fd(stream.into_raw_fd())
    }

    fn fd(&self) -> io::Result<RawFd> {
        match self.fd.load(Ordering::Acquire) {
            CLOSED => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "socket transport is closed",
            )),
            fd => Ok(fd),
        }
    }
}

/// Maps a raw syscall result onto a [`Transfer`].
///
/// `Ok(None)` means the call was interrupted and should be retried.
fn transfer(n: isize) -> io::Result<Option<Transfer>> {
    if n >= 0 {
        return Ok(Some(Transfer::Bytes(n as usize)));
    }

    let err = io::Error::last_os_error();

    match err.kind() {
        io::ErrorKind::WouldBlock => Ok(Some(Transfer::Bytes(0))),
        io::ErrorKind::Interrupted => Ok(None),
        _ => Err(err),
    }
}

impl Transport for SocketTransport {
    fn read(&self, buffer: &mut [u8]) -> io::Result<Transfer> {
        let fd = self.fd()?;

        loop {
            if let Some(result) = transfer(sys_read(fd, buffer))? {
                return Ok(result);
            }
        }
    }

    fn write(&self, buffer: &[u8]) -> io::Result<Transfer> {
        let fd = self.fd()?;

        loop {
            if let Some(result) = transfer(sys_write(fd, buffer))? {
                return Ok(result);
            }
        }
    }

    fn close(&self) {
        let fd = self.fd.swap(CLOSED, Ordering::AcqRel);
        if fd != CLOSED {
            sys_close(fd);
        }
    }

    fn is_open(&self) -> bool {
        self.fd.load(Ordering::Acquire) != CLOSED
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }
}

impl AsRawFd for SocketTransport {
    /// Returns the descriptor, or `-1` once closed.
    fn as_raw_fd(&self) -> RawFd {
        self.fd.load(Ordering::Acquire)
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}
