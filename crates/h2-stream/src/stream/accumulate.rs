//! Pure decisions of the read algorithm.
//!
//! Nothing here touches the stream state, the queue or the releaser. The
//! functions map frames observed while the stream is `Open` to a [`Decision`]:
//! the state transition to attempt and the frame to emit. The caller applies
//! the transition with a compare-and-swap and wraps the emitted payload with
//! its flow-control credit.

use http::HeaderMap;

use crate::protocol::{DataFrame, Frame, FrameKind, Payload, StreamError};

/// State change requested by a decision, always starting from `Open`.
#[derive(Debug)]
pub(crate) enum Transition {
    Stay,
    Close,
    /// Trailers were read along with data; they are delivered by the next read.
    Closing(HeaderMap),
}

#[derive(Debug)]
pub(crate) enum Emit {
    Data { payload: Payload, weight: usize, end_of_stream: bool, folded: usize },
    Trailers(HeaderMap),
}

#[derive(Debug)]
pub(crate) struct Decision {
    pub(crate) transition: Transition,
    pub(crate) emit: Emit,
}

/// What to do with a frame returned by a single `poll`.
#[derive(Debug)]
pub(crate) enum Popped {
    Emit(Decision),
    /// The backlog reached the threshold: drain and merge, starting with this frame.
    Extend(DataFrame),
}

impl Decision {
    /// Emits one DATA frame as is.
    pub(crate) fn single(data: DataFrame) -> Self {
        let transition = if data.is_end_of_stream() { Transition::Close } else { Transition::Stay };
        let end_of_stream = data.is_end_of_stream();
        let weight = data.flow_controlled_len();
        let payload = Payload::from(data.into_payload());
        Self { transition, emit: Emit::Data { payload, weight, end_of_stream, folded: 1 } }
    }

    fn trailers(trailers: HeaderMap) -> Self {
        Self { transition: Transition::Close, emit: Emit::Trailers(trailers) }
    }
}

/// Decides on a frame popped from the queue.
///
/// `backlog` is the queue length observed right after the pop and `threshold`
/// the configured minimum number of frames to accumulate.
pub(crate) fn decide_popped(frame: Frame, backlog: usize, threshold: usize) -> Result<Popped, StreamError> {
    match frame {
        Frame::Data(data) if data.is_end_of_stream() => Ok(Popped::Emit(Decision::single(data))),
        Frame::Data(data) if backlog.saturating_add(1) < threshold => Ok(Popped::Emit(Decision::single(data))),
        Frame::Data(data) => Ok(Popped::Extend(data)),
        Frame::Headers(headers) if headers.is_trailers() => Ok(Popped::Emit(Decision::trailers(headers.into_headers()))),
        Frame::Headers(_) => Err(StreamError::unexpected_frame(FrameKind::Headers, "headers without end of stream after the header block")),
    }
}

/// Folds an ordered run of frames into one decision.
///
/// DATA payloads are appended to a single [`Payload`] until a DATA frame with
/// end-of-stream or a trailers frame ends the run. End-of-stream DATA may be
/// directly followed by the trailers; anything after the end of the stream is
/// rejected.
pub(crate) fn merge(frames: Vec<Frame>) -> Result<Decision, StreamError> {
    let mut payload = Payload::new();
    let mut weight = 0;
    let mut folded = 0;
    let mut end_of_stream = false;
    let mut trailers = None;

    let mut frames = frames.into_iter();
    for frame in frames.by_ref() {
        match frame {
            Frame::Data(data) => {
                weight += data.flow_controlled_len();
                folded += 1;
                end_of_stream = data.is_end_of_stream();
                payload.push(data.into_payload());
                if end_of_stream {
                    break;
                }
            }
            Frame::Headers(headers) if headers.is_trailers() => {
                trailers = Some(headers.into_headers());
                break;
            }
            Frame::Headers(_) => {
                return Err(StreamError::unexpected_frame(FrameKind::Headers, "headers without end of stream inside accumulated data"));
            }
        }
    }

    if end_of_stream {
        match frames.next() {
            Some(Frame::Headers(headers)) if headers.is_trailers() => trailers = Some(headers.into_headers()),
            Some(frame) => return Err(StreamError::unexpected_frame(frame.kind(), "frame after end of stream")),
            None => {}
        }
    }

    if let Some(frame) = frames.next() {
        return Err(StreamError::unexpected_frame(frame.kind(), "frame after end of stream"));
    }

    match (folded, trailers) {
        (0, None) => Err(StreamError::EmptyAccumulation),
        (0, Some(trailers)) => Ok(Decision::trailers(trailers)),
        (_, None) => {
            let transition = if end_of_stream { Transition::Close } else { Transition::Stay };
            Ok(Decision { transition, emit: Emit::Data { payload, weight, end_of_stream, folded } })
        }
        // one read carries one frame: data now, the trailers on the next read
        (_, Some(trailers)) => {
            Ok(Decision { transition: Transition::Closing(trailers), emit: Emit::Data { payload, weight, end_of_stream: false, folded } })
        }
    }
}
