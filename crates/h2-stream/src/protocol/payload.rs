use std::collections::VecDeque;
use std::io::IoSlice;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// An owned payload assembled from one or more [`Bytes`] segments.
///
/// Appending a segment moves the reference-counted handle in, so coalescing
/// several DATA frames never copies payload bytes. Each segment is released
/// exactly once, when it is fully advanced over or when the payload is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    segments: VecDeque<Bytes>,
    remaining: usize,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment to the end of the payload, empty segments are dropped.
    pub fn push(&mut self, segment: Bytes) {
        if segment.is_empty() {
            return;
        }
        self.remaining += segment.len();
        self.segments.push_back(segment);
    }

    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Bytes> {
        self.segments.iter()
    }

    /// Collapses the payload into contiguous bytes.
    ///
    /// A single segment is returned as is; several segments are copied into a
    /// fresh buffer.
    pub fn into_bytes(mut self) -> Bytes {
        match self.segments.len() {
            0 => Bytes::new(),
            1 => self.segments.pop_front().unwrap_or_default(),
            _ => {
                let mut bytes = BytesMut::with_capacity(self.remaining);
                for segment in &self.segments {
                    bytes.extend_from_slice(segment);
                }
                bytes.freeze()
            }
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        let mut payload = Payload::new();
        payload.push(bytes);
        payload
    }
}

impl FromIterator<Bytes> for Payload {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for segment in iter {
            payload.push(segment);
        }
        payload
    }
}

impl Buf for Payload {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        match self.segments.front() {
            Some(segment) => &segment[..],
            None => &[],
        }
    }

    fn chunks_vectored<'a>(&'a self, dst: &mut [IoSlice<'a>]) -> usize {
        let mut filled = 0;
        for (slot, segment) in dst.iter_mut().zip(self.segments.iter()) {
            *slot = IoSlice::new(segment);
            filled += 1;
        }
        filled
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(cnt <= self.remaining, "cannot advance past remaining: {cnt} > {}", self.remaining);

        while cnt > 0 {
            let Some(front) = self.segments.front_mut() else {
                break;
            };

            if cnt < front.len() {
                front.advance(cnt);
                self.remaining -= cnt;
                return;
            }

            cnt -= front.len();
            self.remaining -= front.len();
            self.segments.pop_front();
        }
    }

    fn copy_to_bytes(&mut self, len: usize) -> Bytes {
        // fast path: the requested range lives entirely in the front segment
        if let Some(front) = self.segments.front_mut()
            && len <= front.len()
        {
            let bytes = front.split_to(len);
            self.remaining -= len;
            if front.is_empty() {
                self.segments.pop_front();
            }
            return bytes;
        }

        assert!(len <= self.remaining, "`len` greater than remaining");
        let mut bytes = BytesMut::with_capacity(len);
        bytes.put((&mut *self).take(len));
        bytes.freeze()
    }
}
