use std::collections::VecDeque;

/// A pending chunk of outbound data.
///
/// The segment owns a copy of the bytes handed to
/// [`Session::write`](crate::Session::write), so the caller may reuse its
/// buffer as soon as the call returns.
pub(crate) struct Segment {
    data: Box<[u8]>,
    /// Index of the first unsent byte.
    offset: usize,
}

impl Segment {
    pub(crate) fn new(data: &[u8]) -> Self {
        Self {
            data: data.into(),
            offset: 0,
        }
    }

    /// Bytes still to be sent.
    pub(crate) fn pending(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Records that `n` more bytes went out.
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.offset += n;
    }
}

/// FIFO of outbound segments.
///
/// Appends happen at the tail, drains at the head. A partially sent head
/// keeps its cursor in place until the next drain picks it up again.
#[derive(Default)]
pub(crate) struct WriteQueue {
    segments: VecDeque<Segment>,
}

impl WriteQueue {
    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push_back(segment);
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut Segment> {
        self.segments.front_mut()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Segment> {
        self.segments.pop_front()
    }

    /// Drops every segment and returns how many bytes were discarded.
    pub(crate) fn clear(&mut self) -> usize {
        let discarded = self.bytes();
        self.segments.clear();
        discarded
    }

    pub(crate) fn len(&self) -> usize {
        self.segments.len()
    }

    /// Total unsent bytes across all segments.
    pub(crate) fn bytes(&self) -> usize {
        self.segments.iter().map(Segment::remaining).sum()
    }
}

/// Snapshot of a session's write queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Number of queued segments.
    pub segments: usize,

    /// Unsent bytes across all segments.
    pub bytes: usize,
}
