//! Snapshots: timestamped batches of records for one case and category.
//!
//! A case has at most one active snapshot per category. Older snapshots are
//! kept for audit but are only ever consulted as "the active one" or "the
//! most recent non-active one".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Category, FactRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  pub snapshot_id: Uuid,
  pub case_id:     Uuid,
  pub category:    Category,
  /// When the records were fetched from the registries.
  pub ingested_at: DateTime<Utc>,
  pub active:      bool,
  pub records:     Vec<FactRecord>,
}

impl Snapshot {
  /// A freshly ingested, not yet activated snapshot.
  pub fn ingested(
    case_id: Uuid,
    category: Category,
    ingested_at: DateTime<Utc>,
    records: Vec<FactRecord>,
  ) -> Self {
    Self {
      snapshot_id: Uuid::new_v4(),
      case_id,
      category,
      ingested_at,
      active: false,
      records,
    }
  }

  /// The caseworker's activation: the same records, now in force.
  pub fn activate(self) -> Self {
    Self {
      active: true,
      ..self
    }
  }
}
