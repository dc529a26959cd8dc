#![allow(dead_code)]

use duplex::{Interest, Registration, Selector, Session, Token, Transfer, Transport};

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Routes session logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scripted outcome of one transport write.
#[derive(Debug, Clone, Copy)]
pub enum WriteStep {
    /// Accept at most this many bytes.
    Accept(usize),
    Invert,
    Fail,
}

/// Scripted outcome of one transport read.
#[derive(Debug, Clone)]
pub enum ReadStep {
    Data(Vec<u8>),
    Invert,
    Fail,
}

#[derive(Default)]
struct Inner {
    writes: VecDeque<WriteStep>,
    reads: VecDeque<ReadStep>,
    delivered: Vec<u8>,
    write_calls: usize,
    read_calls: usize,
}

/// In-memory transport replaying scripted outcomes.
///
/// Once a script runs out, writes accept everything and reads return zero
/// bytes.
pub struct ScriptedTransport {
    inner: Mutex<Inner>,
    read_gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    open: AtomicBool,
    remote: Option<SocketAddr>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            read_gate: Mutex::new(None),
            open: AtomicBool::new(true),
            remote: Some("10.1.2.3:4567".parse().unwrap()),
        }
    }

    pub fn script_writes(&self, steps: impl IntoIterator<Item = WriteStep>) {
        self.inner.lock().unwrap().writes.extend(steps);
    }

    pub fn script_reads(&self, steps: impl IntoIterator<Item = ReadStep>) {
        self.inner.lock().unwrap().reads.extend(steps);
    }

    /// Makes the next read pause before touching the script.
    ///
    /// The returned receiver fires once the read has started; the read
    /// resumes when the returned sender is signalled.
    pub fn gate_next_read(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        *self.read_gate.lock().unwrap() = Some((entered_tx, release_rx));

        (entered_rx, release_tx)
    }

    /// Bytes the transport accepted so far, in order.
    pub fn delivered(&self) -> Vec<u8> {
        self.inner.lock().unwrap().delivered.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.inner.lock().unwrap().write_calls
    }

    pub fn read_calls(&self) -> usize {
        self.inner.lock().unwrap().read_calls
    }
}

impl Transport for ScriptedTransport {
    fn read(&self, buffer: &mut [u8]) -> io::Result<Transfer> {
        if !self.is_open() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }

        let gate = self.read_gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }

        let mut inner = self.inner.lock().unwrap();
        inner.read_calls += 1;

        match inner.reads.pop_front() {
            Some(ReadStep::Data(data)) => {
                let n = data.len().min(buffer.len());
                buffer[..n].copy_from_slice(&data[..n]);
                Ok(Transfer::Bytes(n))
            }
            Some(ReadStep::Invert) => Ok(Transfer::Inverted),
            Some(ReadStep::Fail) => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "scripted read failure",
            )),
            None => Ok(Transfer::Bytes(0)),
        }
    }

    fn write(&self, buffer: &[u8]) -> io::Result<Transfer> {
        if !self.is_open() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }

        let mut inner = self.inner.lock().unwrap();
        inner.write_calls += 1;

        let accepted = match inner.writes.pop_front() {
            Some(WriteStep::Accept(limit)) => limit.min(buffer.len()),
            Some(WriteStep::Invert) => return Ok(Transfer::Inverted),
            Some(WriteStep::Fail) => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                ));
            }
            None => buffer.len(),
        };

        inner.delivered.extend_from_slice(&buffer[..accepted]);
        Ok(Transfer::Bytes(accepted))
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }
}

/// Selector that records every call it receives.
#[derive(Default)]
pub struct RecordingSelector {
    listens: Mutex<Vec<(Token, Interest)>>,
    unregisters: Mutex<Vec<Token>>,
}

impl RecordingSelector {
    pub fn listens(&self) -> Vec<(Token, Interest)> {
        self.listens.lock().unwrap().clone()
    }

    pub fn unregisters(&self) -> Vec<Token> {
        self.unregisters.lock().unwrap().clone()
    }
}

impl Selector for RecordingSelector {
    fn listen(&self, token: Token, events: Interest) {
        self.listens.lock().unwrap().push((token, events));
    }

    fn unregister(&self, token: Token) {
        self.unregisters.lock().unwrap().push(token);
    }
}

pub const TOKEN: Token = Token(7);

/// Builds a session over a fresh scripted transport.
pub fn session() -> (Arc<RecordingSelector>, Session<ScriptedTransport>) {
    init_tracing();

    let selector = Arc::new(RecordingSelector::default());
    let registration = Registration::new(selector.clone(), TOKEN);
    let session = Session::new(ScriptedTransport::new(), registration);

    (selector, session)
}

/// Dispatches writable events until the queue is empty.
///
/// Panics if the queue does not drain within `limit` dispatches.
pub fn drain(session: &Session<ScriptedTransport>, limit: usize) {
    let mut scratch = [0u8; 64];

    for _ in 0..limit {
        if session.queue_stats().segments == 0 {
            return;
        }
        session
            .dispatch(Interest::WRITEABLE, &mut scratch)
            .expect("drain dispatch failed");
    }

    assert_eq!(session.queue_stats().segments, 0, "queue did not drain");
}
