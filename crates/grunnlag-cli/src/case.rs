//! The case document the binary reads, and an in-memory snapshot store over
//! it.

use std::{collections::BTreeSet, convert::Infallible, path::Path};

use anyhow::Context as _;
use chrono::NaiveDate;
use grunnlag_core::{
  Category, FactRecord, PersonIdent, Role,
  registry::{CasePersons, PersonEntry},
  snapshot::Snapshot,
  store::SnapshotRepository,
};
use serde::Deserialize;
use uuid::Uuid;

/// A case as exported for offline checking.
#[derive(Debug, Deserialize)]
pub struct CaseFile {
  #[serde(default = "Uuid::new_v4")]
  pub case_id:        Uuid,
  #[serde(default)]
  pub effective_date: Option<NaiveDate>,
  pub persons:        Vec<PersonEntry>,
  /// The children the case concerns. Defaults to every person with the
  /// child role.
  #[serde(default)]
  pub children:       Option<Vec<PersonIdent>>,
  /// Records in force, for validation.
  #[serde(default)]
  pub records:        Vec<FactRecord>,
  /// Ingested snapshots, for diffing.
  #[serde(default)]
  pub snapshots:      Vec<Snapshot>,
}

impl CaseFile {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading case file {}", path.display()))?;
    serde_json::from_str(&raw)
      .with_context(|| format!("parsing case file {}", path.display()))
  }

  pub fn children(&self, persons: &CasePersons) -> Vec<PersonIdent> {
    self
      .children
      .clone()
      .unwrap_or_else(|| persons.with_role(Role::Child))
  }

  /// Payers and receivers, plus subjects only named in records.
  pub fn subjects(&self, persons: &CasePersons) -> BTreeSet<PersonIdent> {
    use grunnlag_core::registry::PersonRegistry as _;

    self
      .persons
      .iter()
      .filter(|p| p.role != Role::Child)
      .map(|p| p.ident.clone())
      .chain(self.records.iter().map(|r| persons.current_ident(&r.subject)))
      .collect()
  }

  /// Categories with at least one snapshot.
  pub fn snapshot_categories(&self) -> BTreeSet<Category> {
    self.snapshots.iter().map(|s| s.category).collect()
  }
}

/// Serves the snapshots of a loaded case file.
pub struct FileRepository<'a> {
  snapshots: &'a [Snapshot],
}

impl<'a> FileRepository<'a> {
  pub fn new(snapshots: &'a [Snapshot]) -> Self { Self { snapshots } }

  fn latest(
    &self,
    case_id: Uuid,
    category: Category,
    active: bool,
  ) -> Option<Snapshot> {
    self
      .snapshots
      .iter()
      .filter(|s| s.case_id == case_id && s.category == category)
      .filter(|s| s.active == active)
      .max_by_key(|s| s.ingested_at)
      .cloned()
  }
}

impl SnapshotRepository for FileRepository<'_> {
  type Error = Infallible;

  async fn active_snapshot(
    &self,
    case_id: Uuid,
    category: Category,
  ) -> Result<Option<Snapshot>, Infallible> {
    Ok(self.latest(case_id, category, true))
  }

  async fn latest_inactive_snapshot(
    &self,
    case_id: Uuid,
    category: Category,
  ) -> Result<Option<Snapshot>, Infallible> {
    Ok(self.latest(case_id, category, false))
  }
}
