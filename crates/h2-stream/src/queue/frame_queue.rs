use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::protocol::{Frame, QueueError};
use crate::queue::FrameSource;

/// An unbounded, in-memory frame queue for one stream.
///
/// The handle is cheap to clone: the transport keeps one clone to [`push`](FrameQueue::push)
/// frames, the stream reads through another. A reader suspended in `poll` is
/// woken by the next push or by termination.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    notify: Notify,
}

#[derive(Debug, Default)]
struct QueueState {
    frames: VecDeque<Frame>,
    terminated: Option<QueueError>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // the state stays consistent across a panic, every mutation is a single call
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame, rejecting it with the termination error once the queue
    /// is terminated.
    pub fn push(&self, frame: impl Into<Frame>) -> Result<(), QueueError> {
        {
            let mut state = self.shared.lock();
            if let Some(error) = &state.terminated {
                return Err(error.clone());
            }
            state.frames.push_back(frame.into());
        }

        self.shared.notify.notify_waiters();
        Ok(())
    }

    /// Terminates the queue gracefully: buffered frames stay readable, after
    /// them `poll` reports [`QueueError::Closed`].
    pub fn close(&self) {
        self.terminate(QueueError::Closed, false);
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.lock().terminated.is_some()
    }

    fn terminate(&self, error: QueueError, discard: bool) {
        {
            let mut state = self.shared.lock();
            if discard && !state.frames.is_empty() {
                debug!(discarded = state.frames.len(), "discard buffered frames");
                state.frames.clear();
            }
            if state.terminated.is_none() {
                trace!(cause = %error, "terminate frame queue");
                state.terminated = Some(error);
            }
        }

        self.shared.notify.notify_waiters();
    }
}

#[async_trait]
impl FrameSource for FrameQueue {
    async fn poll(&self) -> Result<Frame, QueueError> {
        loop {
            // register interest before checking, so a push racing with the check is not missed
            let notified = self.shared.notify.notified();
            {
                let mut state = self.shared.lock();
                if let Some(frame) = state.frames.pop_front() {
                    return Ok(frame);
                }
                if let Some(error) = &state.terminated {
                    return Err(error.clone());
                }
            }
            notified.await;
        }
    }

    fn drain(&self) -> Result<Vec<Frame>, QueueError> {
        let mut state = self.shared.lock();
        match &state.terminated {
            Some(error) if state.frames.is_empty() => Err(error.clone()),
            _ => Ok(state.frames.drain(..).collect()),
        }
    }

    fn fail(&self, error: QueueError, discard: bool) {
        self.terminate(error, discard);
    }

    fn len(&self) -> usize {
        self.shared.lock().frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::FutureExt;
    use std::time::Duration;

    fn payload_of(frame: Frame) -> Bytes {
        match frame {
            Frame::Data(data) => data.into_payload(),
            Frame::Headers(_) => panic!("expected data frame"),
        }
    }

    #[tokio::test]
    async fn poll_returns_frames_in_push_order() {
        let queue = FrameQueue::new();
        queue.push(Frame::data("a", false)).unwrap();
        queue.push(Frame::data("b", true)).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(payload_of(queue.poll().await.unwrap()), "a");
        assert_eq!(payload_of(queue.poll().await.unwrap()), "b");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn poll_waits_for_push() {
        let queue = FrameQueue::new();
        let producer = queue.clone();

        assert!(queue.poll().now_or_never().is_none());

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.push(Frame::data("late", false)).unwrap();
        });

        let frame = queue.poll().await.unwrap();
        assert_eq!(payload_of(frame), "late");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn drain_takes_everything_buffered() {
        let queue = FrameQueue::new();
        assert!(queue.drain().unwrap().is_empty());

        for part in ["x", "y", "z"] {
            queue.push(Frame::data(part, false)).unwrap();
        }

        let frames = queue.drain().unwrap();
        let payloads: Vec<Bytes> = frames.into_iter().map(payload_of).collect();
        assert_eq!(payloads, vec!["x", "y", "z"]);
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn fail_with_discard_drops_buffered_frames() {
        let queue = FrameQueue::new();
        queue.push(Frame::data("lost", false)).unwrap();

        queue.fail(QueueError::failed("connection reset"), true);

        assert!(queue.is_terminated());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.poll().await.unwrap_err(), QueueError::failed("connection reset"));
        assert_eq!(queue.drain().unwrap_err(), QueueError::failed("connection reset"));
        assert_eq!(queue.push(Frame::data("late", false)).unwrap_err(), QueueError::failed("connection reset"));
    }

    #[tokio::test]
    async fn close_keeps_buffered_frames_readable() {
        let queue = FrameQueue::new();
        queue.push(Frame::data("kept", false)).unwrap();
        queue.close();

        assert_eq!(queue.drain().unwrap().len(), 1);
        assert_eq!(queue.drain().unwrap_err(), QueueError::Closed);
        assert_eq!(queue.poll().await.unwrap_err(), QueueError::Closed);
    }

    #[tokio::test]
    async fn first_termination_wins() {
        let queue = FrameQueue::new();
        queue.close();
        queue.fail(QueueError::failed("too late"), true);

        assert_eq!(queue.poll().await.unwrap_err(), QueueError::Closed);
    }

    #[tokio::test]
    async fn termination_wakes_suspended_reader() {
        let queue = FrameQueue::new();
        let terminator = queue.clone();

        let reader = tokio::spawn(async move { queue.poll().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        terminator.fail(QueueError::failed("boom"), true);

        assert_eq!(reader.await.unwrap().unwrap_err(), QueueError::failed("boom"));
    }
}
