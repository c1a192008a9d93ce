//! Flow-control credit returned to the upstream sender.
//!
//! The read path never talks to the peer itself. Every emitted data chunk
//! carries a [`Credit`] for the flow-controlled bytes it represents, and the
//! consumer hands that credit back through the [`Releaser`] supplied when the
//! stream was built, typically a hook which schedules a WINDOW_UPDATE.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{trace, warn};

use crate::protocol::BoxError;

/// Returns consumed flow-control credit to the upstream sender.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Releaser: Send + Sync {
    async fn release(&self, weight: usize) -> Result<(), BoxError>;
}

#[derive(Debug)]
pub struct FnReleaser<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Releaser for FnReleaser<F>
where
    F: Fn(usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    async fn release(&self, weight: usize) -> Result<(), BoxError> {
        (self.f)(weight).await
    }
}

pub fn make_releaser<F, Fut>(f: F) -> FnReleaser<F>
where
    F: Fn(usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    FnReleaser { f }
}

/// The credit owed for one emitted data chunk.
///
/// `release` consumes the credit, so the releaser is invoked at most once per
/// chunk. A credit dropped without being released is lost for the stream's
/// window and is logged.
pub struct Credit {
    weight: usize,
    releaser: Option<Arc<dyn Releaser>>,
}

impl Credit {
    pub(crate) fn new(weight: usize, releaser: Arc<dyn Releaser>) -> Self {
        Self { weight, releaser: Some(releaser) }
    }

    /// Sum of payload and padding bytes this credit stands for.
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Hands the credit back upstream.
    ///
    /// A zero weight completes immediately without calling the releaser; a
    /// failure of the releaser is returned unchanged and never retried.
    pub async fn release(mut self) -> Result<(), BoxError> {
        let Some(releaser) = self.releaser.take() else {
            return Ok(());
        };

        if self.weight == 0 {
            trace!("skip releasing empty flow-control credit");
            return Ok(());
        }

        trace!(weight = self.weight, "release flow-control credit");
        releaser.release(self.weight).await
    }
}

impl Drop for Credit {
    fn drop(&mut self) {
        if self.releaser.is_some() && self.weight > 0 {
            warn!(weight = self.weight, "flow-control credit dropped without release");
        }
    }
}

impl fmt::Debug for Credit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credit").field("weight", &self.weight).field("released", &self.releaser.is_none()).finish()
    }
}

#[cfg(test)]
pub(crate) fn recording_releaser() -> (Arc<dyn Releaser>, Arc<std::sync::Mutex<Vec<usize>>>) {
    let weights = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorded = Arc::clone(&weights);
    let releaser = make_releaser(move |weight| {
        let recorded = Arc::clone(&recorded);
        async move {
            recorded.lock().unwrap().push(weight);
            Ok::<(), BoxError>(())
        }
    });
    (Arc::new(releaser), weights)
}
