use super::Session;
use crate::error::Result;
use crate::transport::Transport;

/// Consumes incoming data when a dispatch decides the session should read.
///
/// The default implementation performs exactly one
/// [`Session::read`] into the scratch buffer and drops the bytes.
/// Protocol layers override it to parse what they read and answer through
/// [`Session::write`].
pub trait ReadHandler<T: Transport>: Send + Sync + Sized {
    fn handle_read(&self, session: &Session<T, Self>, buffer: &mut [u8]) -> Result<()> {
        session.read(buffer)?;
        Ok(())
    }
}

/// Handler that reads once per readable event and discards the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnce;

impl<T: Transport> ReadHandler<T> for ReadOnce {}
