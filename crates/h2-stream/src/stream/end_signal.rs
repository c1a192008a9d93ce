use tokio::sync::watch;

use crate::protocol::StreamError;

/// Single-assignment completion signal with any number of listeners.
///
/// The first `resolve` wins; listeners subscribing afterwards still observe
/// the stored outcome.
#[derive(Debug)]
pub(crate) struct EndSignal {
    outcome: watch::Sender<Option<Result<(), StreamError>>>,
}

impl EndSignal {
    pub(crate) fn new() -> Self {
        let (outcome, _) = watch::channel(None);
        Self { outcome }
    }

    /// Stores `result` unless an outcome is already set. Returns whether it was stored.
    pub(crate) fn resolve(&self, result: Result<(), StreamError>) -> bool {
        self.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(result);
            true
        })
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Waits for the outcome; [`StreamError::Dropped`] if the signal goes away unresolved.
    pub(crate) fn wait(&self) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        let mut receiver = self.outcome.subscribe();
        async move {
            match receiver.wait_for(Option::is_some).await {
                Ok(outcome) => outcome.clone().unwrap_or(Err(StreamError::Dropped)),
                Err(_) => Err(StreamError::Dropped),
            }
        }
    }
}
