use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures::FutureExt;
use futures::future::BoxFuture;
use http_body::{Body, Frame};

use crate::protocol::{Payload, StreamError, StreamFrame};
use crate::queue::{FrameQueue, FrameSource};
use crate::stream::DataStream;

type NextFrame = Option<Result<Frame<Payload>, StreamError>>;

/// A [`DataStream`] seen as an [`http_body::Body`].
///
/// Each data chunk's flow-control credit is released before the chunk is
/// handed out, so the peer's window reopens as fast as the body is polled.
/// Trailers come out as a trailers frame and end the body.
pub struct StreamBody<Q = FrameQueue> {
    stream: Arc<DataStream<Q>>,
    next: Option<BoxFuture<'static, (NextFrame, bool)>>,
    finished: bool,
}

impl<Q: FrameSource + 'static> StreamBody<Q> {
    pub(crate) fn new(stream: Arc<DataStream<Q>>) -> Self {
        Self { stream, next: None, finished: false }
    }

    /// The underlying stream, e.g. to `fail` it or wait for its end.
    pub fn stream(&self) -> &Arc<DataStream<Q>> {
        &self.stream
    }
}

/// Reads one frame and settles its credit. The flag tells whether the body is finished.
async fn next_frame<Q: FrameSource>(stream: Arc<DataStream<Q>>) -> (NextFrame, bool) {
    match stream.read().await {
        Ok(StreamFrame::Data(chunk)) => {
            let end_of_stream = chunk.is_end_of_stream();
            let (payload, credit) = chunk.into_parts();
            if let Err(e) = credit.release().await {
                return (Some(Err(StreamError::release_failed(e))), true);
            }
            (Some(Ok(Frame::data(payload))), end_of_stream)
        }
        Ok(StreamFrame::Trailers(trailers)) => (Some(Ok(Frame::trailers(trailers))), true),
        Err(StreamError::Closed) => (None, true),
        Err(e) => (Some(Err(e)), true),
    }
}

impl<Q: FrameSource + 'static> Body for StreamBody<Q> {
    type Data = Payload;
    type Error = StreamError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        let next = this.next.get_or_insert_with(|| next_frame(Arc::clone(&this.stream)).boxed());
        let (frame, finished) = ready!(next.poll_unpin(cx));
        this.next = None;
        this.finished = finished;
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.stream.is_empty()
    }
}

impl<Q> fmt::Debug for StreamBody<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBody").field("stream", &self.stream).field("finished", &self.finished).finish_non_exhaustive()
    }
}
