use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::FrameKind;
use crate::stream::StreamStateKind;

/// Boxed error returned by collaborators such as a [`Releaser`](crate::flow_control::Releaser).
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Shared failure cause, cloned into every read issued after the stream failed.
pub type FailureCause = Arc<dyn Error + Send + Sync>;

#[derive(Error, Debug, Clone)]
pub enum StreamError {
    #[error("stream closed")]
    Closed,

    #[error("stream failed: {cause}")]
    Failed { cause: FailureCause },

    #[error("invalid stream state, expected {expected} but found {found}")]
    InvalidState { expected: StreamStateKind, found: StreamStateKind },

    #[error("unexpected {kind} frame: {reason}")]
    UnexpectedFrame { kind: FrameKind, reason: &'static str },

    #[error("accumulated frames yield neither data nor trailers")]
    EmptyAccumulation,

    #[error("frame queue terminated before end of stream: {source}")]
    QueueTerminated {
        #[from]
        source: QueueError,
    },

    #[error("release flow-control credit error: {cause}")]
    ReleaseFailed { cause: FailureCause },

    #[error("stream dropped before reaching a terminal state")]
    Dropped,
}

impl StreamError {
    pub fn failed<E: Into<BoxError>>(cause: E) -> Self {
        Self::Failed { cause: Arc::from(cause.into()) }
    }

    pub fn invalid_state(expected: StreamStateKind, found: StreamStateKind) -> Self {
        Self::InvalidState { expected, found }
    }

    pub fn unexpected_frame(kind: FrameKind, reason: &'static str) -> Self {
        Self::UnexpectedFrame { kind, reason }
    }

    pub fn release_failed<E: Into<BoxError>>(cause: E) -> Self {
        Self::ReleaseFailed { cause: Arc::from(cause.into()) }
    }

    /// Returns true for the expected terminal conditions, `Closed` and `Failed`.
    ///
    /// Every other kind signals a contract violation or a broken collaborator.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("frame queue closed")]
    Closed,

    #[error("frame queue failed: {reason}")]
    Failed { reason: String },
}

impl QueueError {
    pub fn failed<S: ToString>(str: S) -> Self {
        Self::Failed { reason: str.to_string() }
    }
}
