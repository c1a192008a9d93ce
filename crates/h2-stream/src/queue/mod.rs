//! The frame queue between the transport and the read path.
//!
//! [`FrameSource`] is the seam [`DataStream`](crate::stream::DataStream) reads
//! through; [`FrameQueue`] is the in-memory implementation the transport
//! feeds.
//!
//! A source is multi-producer and single-consumer:
//!
//! - `poll` suspends the reader until a frame is available or the source is terminated
//! - `drain` never suspends and hands back everything buffered, in order
//! - `fail` terminates the source, optionally discarding buffered frames

mod frame_queue;

pub use frame_queue::FrameQueue;

use async_trait::async_trait;

use crate::protocol::{Frame, QueueError};

#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Waits for the next frame.
    ///
    /// Returns the termination error once the source is terminated and nothing
    /// buffered is left.
    async fn poll(&self) -> Result<Frame, QueueError>;

    /// Takes every buffered frame without waiting, possibly none.
    ///
    /// Fails only when the source is terminated and empty.
    fn drain(&self) -> Result<Vec<Frame>, QueueError>;

    /// Terminates the source. Only the first termination is kept.
    fn fail(&self, error: QueueError, discard: bool);

    /// Number of frames currently buffered.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
