//! Synchronization engine for the Canopy index.
//!
//! Takes verified repository diffs, projects them into the record index and
//! advances each identity's root pointer:
//! - [`DataDiff`]: added, updated and deleted entries between two roots
//! - [`BlockStore`]: read access to verified record blocks
//! - [`DiffProjector`]: concurrent per-entry projection into the index
//! - [`SyncCoordinator`]: project, notify subscribers, then commit the root

pub mod blockstore;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod notify;
pub mod projector;

pub use blockstore::{BlockStore, MemoryBlockStore};
pub use coordinator::{SyncCoordinator, SyncOutcome, SyncState};
pub use diff::{DataDiff, DiffEntry};
pub use error::{SyncError, SyncResult};
pub use notify::{LogNotifier, NoopNotifier, SubscriberNotifier};
pub use projector::{DiffProjector, ProjectionSummary};
