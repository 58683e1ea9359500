//! The `SnapshotRepository` trait.
//!
//! Implemented by whatever persists snapshots. The engine only reads through
//! it; activation decisions are written back by the caller.

use std::future::Future;

use uuid::Uuid;

use crate::{record::Category, snapshot::Snapshot};

/// Read access to the snapshots of a case.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait SnapshotRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The snapshot currently in force for `category`, if any.
  fn active_snapshot(
    &self,
    case_id: Uuid,
    category: Category,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  /// The most recently ingested snapshot that has not been activated.
  fn latest_inactive_snapshot(
    &self,
    case_id: Uuid,
    category: Category,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;
}
