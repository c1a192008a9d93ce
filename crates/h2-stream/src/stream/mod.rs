//! The read side of a single HTTP/2 stream.
//!
//! [`DataStream`] turns the frames a transport queued for one stream into
//! [`StreamFrame`]s for the application.
//!
//! # State machine
//!
//! ```text
//!           data / trailers (eos)
//!   Open ───────────────────────────────▶ Closed
//!    │  \                                   ▲
//!    │   \ data + trailers in one drain     │ next read: trailers
//!    │    └──────────────▶ Closing ─────────┘
//!    │
//!    └── fail(cause) / protocol error ──▶ Failed
//! ```
//!
//! Every transition is a compare-and-swap from the observed state, so a
//! `fail` issued from the connection task races safely with an in-flight
//! `read`. Only one reader is expected per stream.
//!
//! # Accumulation
//!
//! With [`StreamConfig::with_min_accum_frames`] set, a read which finds at
//! least that many frames buffered drains the queue and hands the run out as a
//! single [`DataChunk`](crate::protocol::DataChunk) whose payload is the
//! ordered concatenation of the frames' payloads. The chunk's flow-control
//! weight is the sum of their payload and padding lengths.

mod accumulate;
mod body;
mod config;
mod end_signal;
mod state;

pub use body::StreamBody;
pub use config::{ACCUMULATION_DISABLED, StreamConfig};
pub use state::StreamStateKind;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::flow_control::{Credit, Releaser};
use crate::metrics::{NoopMetrics, StreamMetrics};
use crate::protocol::{BoxError, DataChunk, Frame, QueueError, StreamError, StreamFrame};
use crate::queue::{FrameQueue, FrameSource};
use accumulate::{Decision, Emit, Popped, Transition};
use end_signal::EndSignal;
use state::{StateCell, StreamState};

/// The read side of one HTTP/2 stream, fed by a [`FrameSource`].
///
/// Credit for every emitted data chunk goes back through the [`Releaser`]
/// once the chunk is released.
pub struct DataStream<Q = FrameQueue> {
    queue: Q,
    state: StateCell,
    end: EndSignal,
    releaser: Arc<dyn Releaser>,
    metrics: Arc<dyn StreamMetrics>,
    config: StreamConfig,
}

impl<Q: FrameSource> DataStream<Q> {
    /// Creates a stream reading from `queue` with accumulation disabled.
    pub fn new(queue: Q, releaser: Arc<dyn Releaser>) -> Self {
        Self::with_config(queue, releaser, StreamConfig::default())
    }

    pub fn with_config(queue: Q, releaser: Arc<dyn Releaser>, config: StreamConfig) -> Self {
        Self { queue, state: StateCell::new(), end: EndSignal::new(), releaser, metrics: Arc::new(NoopMetrics), config }
    }

    /// Replaces the default no-op metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn StreamMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn state(&self) -> StreamStateKind {
        self.state.kind()
    }

    /// Always false: only a read can tell whether anything is left, so the
    /// stream is never known to be empty up front.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Resolves once the stream is closed, or with the failure that ended it.
    pub fn on_end(&self) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        self.end.wait()
    }

    /// Reads the next frame of the stream.
    ///
    /// Suspends only while waiting for the queue to produce a frame. Must not
    /// be called concurrently with another `read` on the same stream.
    pub async fn read(&self) -> Result<StreamFrame, StreamError> {
        let started = Instant::now();
        let result = self.do_read().await;
        self.metrics.record_read_latency(started.elapsed());
        result
    }

    /// Fails the stream with `cause`.
    ///
    /// Only an `Open` stream can fail: the queue is terminated discarding
    /// buffered frames, every later read fails with [`StreamError::Failed`] and
    /// `on_end` resolves with the same error. Returns false, changing nothing,
    /// when the stream is already closing, closed or failed.
    pub fn fail<E: Into<BoxError>>(&self, cause: E) -> bool {
        self.terminate(StreamError::failed(cause))
    }

    async fn do_read(&self) -> Result<StreamFrame, StreamError> {
        let observed = self.state.load();
        match &*observed {
            StreamState::Open => self.read_open().await,
            StreamState::Closing { trailers } => {
                let trailers = trailers.clone();
                self.deliver_trailers(&observed, trailers)
            }
            StreamState::Closed => Err(StreamError::Closed),
            StreamState::Failed { cause } => Err(cause.clone()),
        }
    }

    async fn read_open(&self) -> Result<StreamFrame, StreamError> {
        let queued = self.queue.len();
        self.metrics.record_queue_length(queued);

        if self.config.should_drain(queued) {
            let started = Instant::now();
            match self.queue.drain() {
                Ok(frames) if !frames.is_empty() => return self.accumulate(frames, started),
                // terminated or emptied concurrently, poll reports what happened
                Ok(_) | Err(_) => {}
            }
        }

        let frame = match self.queue.poll().await {
            Ok(frame) => frame,
            Err(error) => return Err(self.queue_terminated(error)),
        };

        let backlog = self.queue.len();
        match accumulate::decide_popped(frame, backlog, self.config.min_accum_frames()) {
            Ok(Popped::Emit(decision)) => self.apply(decision),
            Ok(Popped::Extend(first)) => {
                let started = Instant::now();
                match self.queue.drain() {
                    Ok(rest) => {
                        let mut frames = Vec::with_capacity(rest.len() + 1);
                        frames.push(Frame::Data(first));
                        frames.extend(rest);
                        self.accumulate(frames, started)
                    }
                    Err(error) => {
                        debug!(cause = %error, "drain failed, emit the popped frame alone");
                        self.apply(Decision::single(first))
                    }
                }
            }
            Err(error) => Err(self.fail_with(error)),
        }
    }

    fn accumulate(&self, frames: Vec<Frame>, started: Instant) -> Result<StreamFrame, StreamError> {
        let count = frames.len();
        let decision = match accumulate::merge(frames) {
            Ok(decision) => decision,
            Err(error) => return Err(self.fail_with(error)),
        };

        if let Emit::Data { payload, weight, folded, .. } = &decision.emit {
            trace!(frames = count, folded, bytes = payload.len(), weight, "accumulated data frames");
            self.metrics.record_accumulated_bytes(payload.len());
        }
        self.metrics.record_accumulation_latency(started.elapsed());

        self.apply(decision)
    }

    fn apply(&self, decision: Decision) -> Result<StreamFrame, StreamError> {
        match decision.transition {
            Transition::Stay => {}
            Transition::Close => {
                self.state.transition_from_open(StreamState::Closed)?;
                self.end.resolve(Ok(()));
                debug!("stream closed");
            }
            Transition::Closing(trailers) => {
                self.state.transition_from_open(StreamState::Closing { trailers })?;
                debug!("stream closing, trailers pending");
            }
        }

        let frame = match decision.emit {
            Emit::Data { payload, weight, end_of_stream, .. } => {
                let credit = Credit::new(weight, Arc::clone(&self.releaser));
                StreamFrame::Data(DataChunk::new(payload, end_of_stream, credit))
            }
            Emit::Trailers(trailers) => StreamFrame::Trailers(trailers),
        };
        Ok(frame)
    }

    fn deliver_trailers(&self, observed: &Arc<StreamState>, trailers: http::HeaderMap) -> Result<StreamFrame, StreamError> {
        self.state
            .transition(observed, StreamState::Closed)
            .map_err(|found| StreamError::invalid_state(StreamStateKind::Closing, found.kind()))?;

        self.queue.fail(QueueError::Closed, true);
        self.end.resolve(Ok(()));
        debug!("stream closed, pending trailers delivered");
        Ok(StreamFrame::Trailers(trailers))
    }

    fn queue_terminated(&self, error: QueueError) -> StreamError {
        match &*self.state.load() {
            StreamState::Failed { cause } => cause.clone(),
            StreamState::Closed => StreamError::Closed,
            _ => self.fail_with(StreamError::from(error)),
        }
    }

    /// Fails the stream with a protocol error and hands the error back.
    fn fail_with(&self, error: StreamError) -> StreamError {
        self.terminate(error.clone());
        error
    }

    fn terminate(&self, error: StreamError) -> bool {
        let observed = self.state.load();
        if !matches!(*observed, StreamState::Open) {
            debug!(state = %observed.kind(), cause = %error, "ignore failure, stream already ended");
            return false;
        }

        if let Err(found) = self.state.transition(&observed, StreamState::Failed { cause: error.clone() }) {
            debug!(state = %found.kind(), cause = %error, "ignore failure, stream ended concurrently");
            return false;
        }

        self.queue.fail(QueueError::failed(&error), true);
        self.end.resolve(Err(error.clone()));
        warn!(cause = %error, "stream failed");
        true
    }
}

impl<Q: FrameSource + 'static> DataStream<Q> {
    /// Adapts the stream into an [`http_body::Body`].
    pub fn into_body(self) -> StreamBody<Q> {
        StreamBody::new(Arc::new(self))
    }
}

impl<Q> fmt::Debug for DataStream<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStream").field("state", &self.state).field("config", &self.config).finish_non_exhaustive()
    }
}
