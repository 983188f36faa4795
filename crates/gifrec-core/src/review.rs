//! Save/discard decision for a finished recording.
//!
//! A preview layer gets the [`ReviewResolver`] and the caller waits on the
//! [`ReviewPending`]. The resolver is consumed by its first use, and a
//! resolver dropped without a decision (preview closed) counts as
//! [`ReviewDecision::Discard`].

use tokio::sync::oneshot;
use tracing::debug;

/// What the user chose to do with a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Save,
    Discard,
}

/// Create a linked resolver and pending decision
pub fn review_channel() -> (ReviewResolver, ReviewPending) {
    let (tx, rx) = oneshot::channel();
    (ReviewResolver { tx }, ReviewPending { rx })
}

/// Sending half, owned by the preview
#[derive(Debug)]
pub struct ReviewResolver {
    tx: oneshot::Sender<ReviewDecision>,
}

impl ReviewResolver {
    pub fn save(self) {
        self.resolve(ReviewDecision::Save);
    }

    pub fn discard(self) {
        self.resolve(ReviewDecision::Discard);
    }

    fn resolve(self, decision: ReviewDecision) {
        debug!(?decision, "Review resolved");
        // The caller may have stopped waiting
        let _ = self.tx.send(decision);
    }
}

/// Receiving half, awaited by the caller
#[derive(Debug)]
pub struct ReviewPending {
    rx: oneshot::Receiver<ReviewDecision>,
}

impl ReviewPending {
    /// Wait for the decision
    pub async fn wait(self) -> ReviewDecision {
        self.rx.await.unwrap_or(ReviewDecision::Discard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save() {
        let (resolver, pending) = review_channel();
        resolver.save();
        assert_eq!(pending.wait().await, ReviewDecision::Save);
    }

    #[tokio::test]
    async fn test_discard() {
        let (resolver, pending) = review_channel();
        resolver.discard();
        assert_eq!(pending.wait().await, ReviewDecision::Discard);
    }

    #[tokio::test]
    async fn test_dropped_resolver_discards() {
        let (resolver, pending) = review_channel();
        drop(resolver);
        assert_eq!(pending.wait().await, ReviewDecision::Discard);
    }

    #[tokio::test]
    async fn test_resolve_from_another_task() {
        let (resolver, pending) = review_channel();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            resolver.save();
        });
        assert_eq!(pending.wait().await, ReviewDecision::Save);
    }

    #[test]
    fn test_resolve_after_caller_gave_up() {
        let (resolver, pending) = review_channel();
        drop(pending);
        resolver.save();
    }
}
