//! One synchronization unit: project a diff, notify, commit the new root.

use crate::blockstore::BlockStore;
use crate::diff::DataDiff;
use crate::error::SyncResult;
use crate::notify::SubscriberNotifier;
use crate::projector::{DiffProjector, ProjectionSummary};
use canopy_core::{Cid, Did};
use canopy_index::{IndexStore, RepoRootRepo};
use std::fmt;
use std::sync::Arc;

/// Stage of a synchronization unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Resolving,
    Projecting,
    Notifying,
    Committing,
    Done,
    Failed,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Projecting => "projecting",
            Self::Notifying => "notifying",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a completed synchronization unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub did: Did,
    pub root: Cid,
    /// Root recorded before this unit, `None` for a first sync.
    pub previous_root: Option<Cid>,
    pub summary: ProjectionSummary,
}

impl SyncOutcome {
    pub fn is_new_repo(&self) -> bool {
        self.previous_root.is_none()
    }
}

/// Orchestrates synchronization units against an index store.
///
/// The coordinator does not serialize units for the same identity; callers
/// must keep at most one unit in flight per DID. Nothing is rolled back on
/// failure, but the root is only committed once projection and notification
/// succeeded, so the stored root never names a state the index missed.
pub struct SyncCoordinator {
    store: Arc<dyn IndexStore>,
    projector: DiffProjector,
    notifier: Arc<dyn SubscriberNotifier>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn IndexStore>, notifier: Arc<dyn SubscriberNotifier>) -> Self {
        Self {
            projector: DiffProjector::new(store.clone()),
            store,
            notifier,
        }
    }

    /// Apply a verified `diff` that moves `did` to `new_root`.
    pub async fn sync(
        &self,
        did: &Did,
        new_root: Cid,
        diff: &DataDiff,
        blocks: &dyn BlockStore,
    ) -> SyncResult<SyncOutcome> {
        let mut state = SyncState::Resolving;
        match self.run(&mut state, did, new_root, diff, blocks).await {
            Ok(outcome) => {
                advance(&mut state, SyncState::Done, did);
                tracing::info!(
                    did = %did,
                    root = %new_root,
                    new_repo = outcome.is_new_repo(),
                    indexed = outcome.summary.indexed,
                    deleted = outcome.summary.deleted,
                    "Synchronized repository"
                );
                Ok(outcome)
            }
            Err(e) => {
                let failed_in = state;
                advance(&mut state, SyncState::Failed, did);
                tracing::warn!(
                    did = %did,
                    root = %new_root,
                    failed_in = %failed_in,
                    error = %e,
                    "Synchronization failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        state: &mut SyncState,
        did: &Did,
        new_root: Cid,
        diff: &DataDiff,
        blocks: &dyn BlockStore,
    ) -> SyncResult<SyncOutcome> {
        let previous_root = self.store.get_repo_root(did).await?;

        advance(state, SyncState::Projecting, did);
        let summary = self.projector.project(did, diff, blocks).await?;

        advance(state, SyncState::Notifying, did);
        self.notifier.notify(did, &new_root).await?;

        advance(state, SyncState::Committing, did);
        self.store.set_repo_root(did, &new_root).await?;

        Ok(SyncOutcome {
            did: did.clone(),
            root: new_root,
            previous_root,
            summary,
        })
    }
}

fn advance(state: &mut SyncState, next: SyncState, did: &Did) {
    tracing::debug!(did = %did, from = %state, to = %next, "Sync state transition");
    *state = next;
}
