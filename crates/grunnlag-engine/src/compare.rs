//! Compare the newest ingested snapshot of a case against the active one.

use std::collections::BTreeSet;

use grunnlag_core::{
  Category, FactRecord, PersonIdent, snapshot::Snapshot,
  store::SnapshotRepository,
};
use uuid::Uuid;

use crate::{
  context::CaseContext,
  diff::{ChangeRecord, diff},
  error::{Error, Result},
};

/// Diff the latest non-active snapshot for `category` against the active
/// one, for every subject appearing on either side.
///
/// Returns no changes when there is nothing newer than the active snapshot.
/// With no active snapshot, every current record in the new one is new.
pub async fn compare_with_active<R: SnapshotRepository>(
  repo: &R,
  case_id: Uuid,
  category: Category,
  ctx: &CaseContext<'_>,
) -> Result<Vec<ChangeRecord>> {
  let new = repo
    .latest_inactive_snapshot(case_id, category)
    .await
    .map_err(|e| Error::Repository(Box::new(e)))?;
  let active = repo
    .active_snapshot(case_id, category)
    .await
    .map_err(|e| Error::Repository(Box::new(e)))?;

  let Some(new) = new else {
    tracing::debug!(%case_id, %category, "no ingested snapshot to compare");
    return Ok(Vec::new());
  };
  if active
    .as_ref()
    .is_some_and(|active| active.ingested_at >= new.ingested_at)
  {
    tracing::debug!(%case_id, %category, "active snapshot is up to date");
    return Ok(Vec::new());
  }

  let active_records = active.map(|s| s.records).unwrap_or_default();
  let subjects = subjects_of(&new, &active_records, ctx);

  let changes: Vec<ChangeRecord> = subjects
    .iter()
    .flat_map(|subject| {
      diff(category, subject, &new.records, &active_records, ctx)
    })
    .collect();

  tracing::info!(
    %case_id,
    %category,
    snapshot_id = %new.snapshot_id,
    subjects = subjects.len(),
    changes = changes.len(),
    "compared snapshot with active"
  );
  Ok(changes)
}

fn subjects_of(
  new: &Snapshot,
  active_records: &[FactRecord],
  ctx: &CaseContext<'_>,
) -> BTreeSet<PersonIdent> {
  new
    .records
    .iter()
    .chain(active_records)
    .filter(|record| record.category() == new.category)
    .map(|record| ctx.current_ident(&record.subject))
    .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use chrono::{NaiveDate, TimeZone, Utc};
  use grunnlag_core::{
    NewFactRecord, Period, ReportingType, Role,
    record::{FactValue, IncomeValue, Posting},
    registry::{CasePersons, PersonEntry},
  };
  use rust_decimal::Decimal;

  use super::*;
  use crate::diff::ChangeKind;

  #[derive(Debug, thiserror::Error)]
  #[error("store unavailable")]
  struct Unavailable;

  /// Snapshots kept in memory, keyed by case and category.
  #[derive(Default)]
  struct MemoryRepository {
    snapshots: Mutex<HashMap<(Uuid, Category), Vec<Snapshot>>>,
    failing:   bool,
  }

  impl MemoryRepository {
    fn insert(&self, snapshot: Snapshot) {
      self
        .snapshots
        .lock()
        .unwrap()
        .entry((snapshot.case_id, snapshot.category))
        .or_default()
        .push(snapshot);
    }

    fn find(
      &self,
      case_id: Uuid,
      category: Category,
      active: bool,
    ) -> Result<Option<Snapshot>, Unavailable> {
      if self.failing {
        return Err(Unavailable);
      }
      Ok(
        self
          .snapshots
          .lock()
          .unwrap()
          .get(&(case_id, category))
          .into_iter()
          .flatten()
          .filter(|s| s.active == active)
          .max_by_key(|s| s.ingested_at)
          .cloned(),
      )
    }
  }

  impl SnapshotRepository for MemoryRepository {
    type Error = Unavailable;

    async fn active_snapshot(
      &self,
      case_id: Uuid,
      category: Category,
    ) -> Result<Option<Snapshot>, Unavailable> {
      self.find(case_id, category, true)
    }

    async fn latest_inactive_snapshot(
      &self,
      case_id: Uuid,
      category: Category,
    ) -> Result<Option<Snapshot>, Unavailable> {
      self.find(case_id, category, false)
    }
  }

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn ident(s: &str) -> PersonIdent { PersonIdent::new(s).unwrap() }

  fn persons() -> CasePersons {
    CasePersons::new(vec![
      PersonEntry {
        ident:           ident("11111111111"),
        previous_idents: vec![],
        birth_date:      None,
        role:            Role::Payer,
      },
      PersonEntry {
        ident:           ident("22222222222"),
        previous_idents: vec![],
        birth_date:      None,
        role:            Role::Receiver,
      },
    ])
  }

  fn ctx(persons: &CasePersons) -> CaseContext<'_> {
    CaseContext {
      effective_date: d(2023, 1, 1),
      today:          d(2023, 6, 1),
      children:       &[],
      persons,
      roles:          persons,
    }
  }

  fn salary(subject: &str, amount: i64) -> FactRecord {
    NewFactRecord::new(
      ident(subject),
      ReportingType::AinntektBeregnet12Mnd,
      Period::months((2022, 2), Some((2023, 1))).unwrap(),
      FactValue::Income(IncomeValue::from_postings(vec![Posting {
        code:   "fastloenn".into(),
        kind:   None,
        amount: Decimal::from(amount),
      }])),
    )
    .into_record()
    .unwrap()
  }

  fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, day, 8, 0, 0).unwrap()
  }

  #[tokio::test]
  async fn no_inactive_snapshot_yields_no_changes() {
    let repo = MemoryRepository::default();
    let case_id = Uuid::new_v4();
    repo.insert(
      Snapshot::ingested(case_id, Category::Income, at(1), vec![salary(
        "11111111111",
        100,
      )])
      .activate(),
    );
    let persons = persons();
    let changes =
      compare_with_active(&repo, case_id, Category::Income, &ctx(&persons))
        .await
        .unwrap();
    assert!(changes.is_empty());
  }

  #[tokio::test]
  async fn changes_are_collected_for_every_subject() {
    let repo = MemoryRepository::default();
    let case_id = Uuid::new_v4();
    repo.insert(
      Snapshot::ingested(case_id, Category::Income, at(1), vec![
        salary("11111111111", 100),
        salary("22222222222", 300),
      ])
      .activate(),
    );
    repo.insert(Snapshot::ingested(
      case_id,
      Category::Income,
      at(2),
      vec![salary("11111111111", 150)],
    ));

    let persons = persons();
    let changes =
      compare_with_active(&repo, case_id, Category::Income, &ctx(&persons))
        .await
        .unwrap();

    let summary: Vec<(&str, ChangeKind, Option<Role>)> = changes
      .iter()
      .map(|c| (c.subject.as_str(), c.kind, c.role))
      .collect();
    assert_eq!(summary, vec![
      ("11111111111", ChangeKind::Modified, Some(Role::Payer)),
      ("22222222222", ChangeKind::Removed, Some(Role::Receiver)),
    ]);
  }

  #[tokio::test]
  async fn stale_inactive_snapshot_is_ignored() {
    let repo = MemoryRepository::default();
    let case_id = Uuid::new_v4();
    repo.insert(Snapshot::ingested(
      case_id,
      Category::Income,
      at(1),
      vec![salary("11111111111", 100)],
    ));
    repo.insert(
      Snapshot::ingested(case_id, Category::Income, at(2), vec![salary(
        "11111111111",
        200,
      )])
      .activate(),
    );

    let persons = persons();
    let changes =
      compare_with_active(&repo, case_id, Category::Income, &ctx(&persons))
        .await
        .unwrap();
    assert!(changes.is_empty());
  }

  #[tokio::test]
  async fn first_snapshot_is_all_new() {
    let repo = MemoryRepository::default();
    let case_id = Uuid::new_v4();
    repo.insert(Snapshot::ingested(
      case_id,
      Category::Income,
      at(1),
      vec![salary("11111111111", 100)],
    ));

    let persons = persons();
    let changes =
      compare_with_active(&repo, case_id, Category::Income, &ctx(&persons))
        .await
        .unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::New);
  }

  #[tokio::test]
  async fn repository_failure_is_propagated() {
    let repo = MemoryRepository {
      failing: true,
      ..Default::default()
    };
    let persons = persons();
    let err = compare_with_active(
      &repo,
      Uuid::new_v4(),
      Category::Income,
      &ctx(&persons),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Repository(_)));
    assert_eq!(err.to_string(), "repository error: store unavailable");
  }
}
