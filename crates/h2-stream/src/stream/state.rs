use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use http::HeaderMap;
use tracing::error;

use crate::ensure;
use crate::protocol::StreamError;

/// Lifecycle state of the read side of a stream.
#[derive(Debug, Clone)]
pub(crate) enum StreamState {
    Open,
    /// All data is delivered, the trailers wait for the next read.
    Closing { trailers: HeaderMap },
    Closed,
    /// Carries the error every later read fails with.
    Failed { cause: StreamError },
}

/// The tag of a [`StreamState`], without its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamStateKind {
    Open,
    Closing,
    Closed,
    Failed,
}

impl StreamState {
    pub(crate) fn kind(&self) -> StreamStateKind {
        match self {
            StreamState::Open => StreamStateKind::Open,
            StreamState::Closing { .. } => StreamStateKind::Closing,
            StreamState::Closed => StreamStateKind::Closed,
            StreamState::Failed { .. } => StreamStateKind::Failed,
        }
    }
}

impl StreamStateKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStateKind::Closed | StreamStateKind::Failed)
    }
}

impl fmt::Display for StreamStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamStateKind::Open => "open",
            StreamStateKind::Closing => "closing",
            StreamStateKind::Closed => "closed",
            StreamStateKind::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Holds the current [`StreamState`] and moves it with a single pointer
/// compare-and-swap, so the first of two racing transitions wins and the other
/// observes the state it lost to.
#[derive(Debug)]
pub(crate) struct StateCell {
    current: ArcSwap<StreamState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self { current: ArcSwap::from_pointee(StreamState::Open) }
    }

    pub(crate) fn load(&self) -> Arc<StreamState> {
        self.current.load_full()
    }

    pub(crate) fn kind(&self) -> StreamStateKind {
        self.current.load().kind()
    }

    /// Replaces `observed` with `next`, handing back the actual state when
    /// another transition got there first.
    pub(crate) fn transition(&self, observed: &Arc<StreamState>, next: StreamState) -> Result<(), Arc<StreamState>> {
        let previous = self.current.compare_and_swap(observed, Arc::new(next));
        if Arc::ptr_eq(&*previous, observed) { Ok(()) } else { Err(Guard::into_inner(previous)) }
    }

    /// Moves the stream out of `Open`.
    ///
    /// Only one reader is expected, so losing this race is a contract violation
    /// reported as [`StreamError::InvalidState`].
    pub(crate) fn transition_from_open(&self, next: StreamState) -> Result<(), StreamError> {
        let observed = self.load();
        let target = next.kind();
        ensure!(matches!(*observed, StreamState::Open), invalid_transition(observed.kind(), target));

        self.transition(&observed, next).map_err(|found| invalid_transition(found.kind(), target))
    }
}

fn invalid_transition(found: StreamStateKind, target: StreamStateKind) -> StreamError {
    error!(%found, %target, "stream state changed under the reader, overlapping reads?");
    StreamError::invalid_state(StreamStateKind::Open, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_open() {
        let cell = StateCell::new();
        assert_eq!(cell.kind(), StreamStateKind::Open);
        assert!(!cell.kind().is_terminal());
    }

    #[test]
    fn first_transition_wins() {
        let cell = StateCell::new();
        let observed = cell.load();

        assert!(cell.transition(&observed, StreamState::Closed).is_ok());

        let lost = cell.transition(&observed, StreamState::Failed { cause: StreamError::failed("late") });
        assert_eq!(lost.unwrap_err().kind(), StreamStateKind::Closed);
        assert_eq!(cell.kind(), StreamStateKind::Closed);
    }

    #[test]
    fn transition_from_open_rejects_other_states() {
        let cell = StateCell::new();
        cell.transition_from_open(StreamState::Closing { trailers: HeaderMap::new() }).unwrap();
        assert_eq!(cell.kind(), StreamStateKind::Closing);

        let error = cell.transition_from_open(StreamState::Closed).unwrap_err();
        assert!(matches!(
            error,
            StreamError::InvalidState { expected: StreamStateKind::Open, found: StreamStateKind::Closing }
        ));
        assert_eq!(cell.kind(), StreamStateKind::Closing);
    }

    #[test]
    fn kind_display() {
        assert_eq!(StreamStateKind::Closing.to_string(), "closing");
        assert!(StreamStateKind::Failed.is_terminal());
    }
}
