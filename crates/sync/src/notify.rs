//! Subscriber notification seam.

use crate::error::SyncResult;
use async_trait::async_trait;
use canopy_core::{Cid, Did};

/// Delivers "repository changed" events to subscribers.
///
/// Called only after a diff has been fully projected, so a subscriber never
/// sees a root the index has not caught up to.
#[async_trait]
pub trait SubscriberNotifier: Send + Sync {
    async fn notify(&self, did: &Did, root: &Cid) -> SyncResult<()>;
}

/// Notifier with no subscribers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl SubscriberNotifier for NoopNotifier {
    async fn notify(&self, _did: &Did, _root: &Cid) -> SyncResult<()> {
        Ok(())
    }
}

/// Notifier that only records the event in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl SubscriberNotifier for LogNotifier {
    async fn notify(&self, did: &Did, root: &Cid) -> SyncResult<()> {
        tracing::info!(did = %did, root = %root, "Repository updated");
        Ok(())
    }
}
