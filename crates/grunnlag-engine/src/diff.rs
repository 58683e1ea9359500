//! Snapshot diff: newly ingested records → classified changes.
//!
//! Computes what differs between the records of a new snapshot and the ones
//! in force, so a caseworker can review them before activation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use grunnlag_core::{
  Category, FactRecord, Period, PersonIdent, ReportingType, Role,
  record::{BenefitKind, FactValue, Posting},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{context::CaseContext, rules, supersession::SupersessionIndex};

// ─── Output types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
  #[serde(rename = "NY")]
  New,
  #[serde(rename = "ENDRING")]
  Modified,
  #[serde(rename = "SLETTET")]
  Removed,
}

/// A change to one posting of a composite record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubFieldChange {
  /// The posting code.
  pub key:   String,
  pub kind:  ChangeKind,
  /// The new amount, or the old one for removed postings.
  pub value: Decimal,
}

/// One classified difference between the new and the active records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
  pub subject:           PersonIdent,
  pub role:              Option<Role>,
  pub category:          Category,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub child:             Option<PersonIdent>,
  pub kind:              ChangeKind,
  pub reporting_type:    ReportingType,
  pub period:            Period,
  pub value:             FactValue,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub sub_field_changes: Vec<SubFieldChange>,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Which records on either side describe the same fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdentityKey {
  reporting_type: Option<ReportingType>,
  child:          Option<PersonIdent>,
  /// Benefit kinds, for sub-type aware types only.
  subtypes:       BTreeSet<BenefitKind>,
  discriminator:  Option<String>,
  start:          NaiveDate,
}

impl IdentityKey {
  pub fn of(record: &FactRecord) -> Self {
    let start = record.identity_period().from();
    match &record.value {
      // Key: (type, child, sub-types, start). Child and sub-types keep one
      // slice of a benefit from masking another.
      FactValue::Income(_) => Self {
        reporting_type: Some(record.reporting_type),
        child: record.child.clone(),
        subtypes: if rules::is_subtype_aware(record.reporting_type) {
          record.subtypes()
        } else {
          BTreeSet::new()
        },
        discriminator: None,
        start,
      },
      // Key: (child, start). A changed status code is a modification.
      FactValue::HousingStatus => Self {
        reporting_type: None,
        child: record.child.clone(),
        subtypes: BTreeSet::new(),
        discriminator: None,
        start,
      },
      // Key: start.
      FactValue::MaritalStatus | FactValue::OtherAdults => Self {
        reporting_type: None,
        child: None,
        subtypes: BTreeSet::new(),
        discriminator: None,
        start,
      },
      // Key: (employer, start).
      FactValue::Employment(employment) => Self {
        reporting_type: None,
        child: None,
        subtypes: BTreeSet::new(),
        discriminator: Some(employment.employer.to_lowercase()),
        start,
      },
    }
  }
}

// ─── Diff ────────────────────────────────────────────────────────────────────

/// Compare `new_records` against `active_records` for one subject and
/// category.
///
/// Records are matched on current identifiers and bucketed by
/// [`IdentityKey`]; when one side holds several records with the same key,
/// the last one wins. Historical annual assessments are left out on both
/// sides. Active records with no counterpart are only reported as removed
/// when they reach the effective date, since earlier ones are not part of
/// the caseworker's comparison view.
pub fn diff(
  category: Category,
  subject: &PersonIdent,
  new_records: &[FactRecord],
  active_records: &[FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ChangeRecord> {
  let subject = ctx.current_ident(subject);
  let new = select(category, &subject, new_records, ctx);
  let active = select(category, &subject, active_records, ctx);

  let index = SupersessionIndex::new(new.iter().chain(&active));
  let new_by_key = bucket(&new, &index);
  let active_by_key = bucket(&active, &index);
  let role = ctx.role_of(&subject);

  let keys: BTreeSet<&IdentityKey> =
    new_by_key.keys().chain(active_by_key.keys()).collect();

  let mut changes = Vec::new();
  for key in keys {
    match (active_by_key.get(key), new_by_key.get(key)) {
      (None, Some(current)) => {
        changes.push(change(ChangeKind::New, current, role, Vec::new()));
      }
      (Some(previous), Some(current)) => {
        if !records_identical(previous, current) {
          let sub_fields = posting_changes(
            previous.value.postings(),
            current.value.postings(),
          );
          changes.push(change(ChangeKind::Modified, current, role, sub_fields));
        }
      }
      (Some(previous), None) => {
        if previous.identity_period().reaches(ctx.effective_date) {
          changes.push(change(ChangeKind::Removed, previous, role, Vec::new()));
        }
      }
      (None, None) => {}
    }
  }

  tracing::debug!(
    %category,
    %subject,
    new = new.len(),
    active = active.len(),
    changes = changes.len(),
    "computed snapshot diff"
  );
  changes
}

fn select(
  category: Category,
  subject: &PersonIdent,
  records: &[FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<FactRecord> {
  records
    .iter()
    .filter(|record| record.category() == category)
    .map(|record| ctx.resolve(record))
    .filter(|record| &record.subject == subject)
    .collect()
}

fn bucket<'a>(
  records: &'a [FactRecord],
  index: &SupersessionIndex,
) -> BTreeMap<IdentityKey, &'a FactRecord> {
  let mut buckets = BTreeMap::new();
  for record in records {
    if index.is_historical(record) {
      continue;
    }
    // Later duplicates replace earlier ones.
    buckets.insert(IdentityKey::of(record), record);
  }
  buckets
}

fn change(
  kind: ChangeKind,
  record: &FactRecord,
  role: Option<Role>,
  sub_field_changes: Vec<SubFieldChange>,
) -> ChangeRecord {
  ChangeRecord {
    subject: record.subject.clone(),
    role,
    category: record.category(),
    child: record.child.clone(),
    kind,
    reporting_type: record.reporting_type,
    period: record.identity_period(),
    value: record.value.clone(),
    sub_field_changes,
  }
}

/// Returns true if the two records carry the same fact: same type, same
/// registry period, same value. Posting order does not matter.
fn records_identical(a: &FactRecord, b: &FactRecord) -> bool {
  a.reporting_type == b.reporting_type
    && a.identity_period() == b.identity_period()
    && values_identical(&a.value, &b.value)
}

fn values_identical(a: &FactValue, b: &FactValue) -> bool {
  match (a, b) {
    (FactValue::Income(a), FactValue::Income(b)) => {
      a.amount == b.amount
        && postings_by_code(&a.postings) == postings_by_code(&b.postings)
    }
    _ => a == b,
  }
}

fn postings_by_code(
  postings: &[Posting],
) -> BTreeMap<&str, (Decimal, Option<BenefitKind>)> {
  postings
    .iter()
    .map(|p| (p.code.as_str(), (p.amount, p.kind)))
    .collect()
}

/// Per-code changes between two posting lists.
fn posting_changes(before: &[Posting], after: &[Posting]) -> Vec<SubFieldChange> {
  let before = postings_by_code(before);
  let after = postings_by_code(after);
  let codes: BTreeSet<&str> =
    before.keys().chain(after.keys()).copied().collect();

  codes
    .into_iter()
    .filter_map(|code| {
      let (kind, value) = match (before.get(code), after.get(code)) {
        (None, Some(&(amount, _))) => (ChangeKind::New, amount),
        (Some(old), Some(new)) if old != new => (ChangeKind::Modified, new.0),
        (Some(&(amount, _)), None) => (ChangeKind::Removed, amount),
        _ => return None,
      };
      Some(SubFieldChange {
        key: code.to_string(),
        kind,
        value,
      })
    })
    .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
