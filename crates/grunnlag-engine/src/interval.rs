//! Interval algebra: merging periods, finding gaps, finding overlaps.
//!
//! Gap detection works on bare periods of one grouping key. Overlap detection
//! takes every record of a subject and buckets them itself, since which
//! records may conflict depends on their category and type.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use grunnlag_core::{
  Category, FactRecord, Period, PersonIdent, ReportingType,
  record::BenefitKind,
};
use serde::Serialize;
use uuid::Uuid;

use crate::rules;

// ─── Merging ─────────────────────────────────────────────────────────────────

/// Sort `periods` and collapse those that overlap or touch into spans. The
/// result is sorted, pairwise disjoint, and never adjacent.
pub fn merge_spans(periods: &[Period]) -> Vec<Period> {
  let mut sorted = periods.to_vec();
  sorted.sort();

  let mut spans: Vec<Period> = Vec::with_capacity(sorted.len());
  for period in sorted {
    match spans.last().and_then(|last| last.merge(&period)) {
      Some(merged) => {
        spans.pop();
        spans.push(merged);
      }
      None => spans.push(period),
    }
  }
  spans
}

// ─── Gaps ────────────────────────────────────────────────────────────────────

/// Find the stretches from `anchor` onward that no period covers.
///
/// Fewer than two periods never produce gaps: a lone record is accepted even
/// if it does not reach back to `anchor`. Otherwise the result holds a
/// leading gap when `anchor` precedes the first span, one gap per
/// discontinuity between spans, and a trailing open gap starting on the last
/// covered day when the last span ends.
pub fn find_gaps(periods: &[Period], anchor: NaiveDate) -> Vec<Period> {
  if periods.len() < 2 {
    return Vec::new();
  }

  let spans = merge_spans(periods);
  let mut gaps = Vec::new();
  // First day not yet known to be covered.
  let mut cursor = anchor;

  for span in &spans {
    if span.from() > cursor {
      gaps.extend(Period::new(cursor, span.from().pred_opt()).ok());
    }
    match span.end_exclusive() {
      Some(next) => cursor = cursor.max(next),
      None => return gaps,
    }
  }

  if let Some(last_day) = spans.last().and_then(Period::to) {
    gaps.push(Period::open(last_day.max(anchor)));
  }
  gaps
}

// ─── Overlaps ────────────────────────────────────────────────────────────────

/// A set of records whose periods conflict, merged into one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
  /// From the first to the last day on which at least two of the records
  /// coincide.
  pub period:            Period,
  pub conflicting_types: BTreeSet<ReportingType>,
  pub record_ids:        BTreeSet<Uuid>,
}

/// Records in different buckets never conflict.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
  /// All records of a category, e.g. every taxable income together.
  Category(Category, Option<PersonIdent>),
  /// One benefit type on its own.
  Benefit(ReportingType, Option<PersonIdent>),
}

fn bucket_of(record: &FactRecord) -> Option<Bucket> {
  let child = record.child.clone();
  match record.category() {
    // Concurrent employments are normal.
    Category::Employment => None,
    Category::Income if record.reporting_type.is_benefit() => {
      Some(Bucket::Benefit(record.reporting_type, child))
    }
    category => Some(Bucket::Category(category, child)),
  }
}

/// Find conflicting periods among `records` of one subject.
///
/// Within a bucket, records are swept in period order against a running
/// merged interval. Every connected run of overlapping records yields a
/// single [`Overlap`] listing all of them, so three mutually chained records
/// are one entry rather than two pairs. Mergeable types are never reported.
pub fn find_overlaps<'a>(
  records: impl IntoIterator<Item = &'a FactRecord>,
) -> Vec<Overlap> {
  let mut buckets: BTreeMap<Bucket, Vec<&FactRecord>> = BTreeMap::new();
  for record in records {
    if rules::is_mergeable(record.reporting_type) {
      continue;
    }
    if let Some(bucket) = bucket_of(record) {
      buckets.entry(bucket).or_default().push(record);
    }
  }

  let mut overlaps: Vec<Overlap> = buckets
    .values()
    .flat_map(|bucket| overlaps_in_bucket(bucket))
    .collect();
  overlaps.sort_by(|a, b| a.period.cmp(&b.period));
  overlaps
}

fn overlaps_in_bucket(records: &[&FactRecord]) -> Vec<Overlap> {
  // Sub-type aware records are swept once per benefit kind they carry.
  // Everything else, including sub-type aware records without kinds, shares
  // the `None` lane.
  let mut lanes: BTreeMap<Option<BenefitKind>, Vec<usize>> = BTreeMap::new();
  for (index, record) in records.iter().enumerate() {
    let kinds = if rules::is_subtype_aware(record.reporting_type) {
      record.subtypes()
    } else {
      BTreeSet::new()
    };
    if kinds.is_empty() {
      lanes.entry(None).or_default().push(index);
    } else {
      for kind in kinds {
        lanes.entry(Some(kind)).or_default().push(index);
      }
    }
  }

  let mut clusters = DisjointSet::new(records.len());
  let mut windows: Vec<(usize, Period)> = Vec::new();

  for lane in lanes.values_mut() {
    lane.sort_by(|&a, &b| records[a].period.cmp(&records[b].period));

    // (first record of the run, union of the run's periods)
    let mut run: Option<(usize, Period)> = None;
    for &index in lane.iter() {
      let period = records[index].period;
      run = Some(match run {
        Some((first, merged)) => match merged.intersection(&period) {
          Some(window) => {
            clusters.union(first, index);
            windows.push((index, window));
            (first, merged.hull(&period))
          }
          None => (index, period),
        },
        None => (index, period),
      });
    }
  }

  let mut spans: BTreeMap<usize, Period> = BTreeMap::new();
  for (index, window) in windows {
    let root = clusters.find(index);
    spans
      .entry(root)
      .and_modify(|span| *span = span.hull(&window))
      .or_insert(window);
  }

  let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
  for index in 0..records.len() {
    let root = clusters.find(index);
    if spans.contains_key(&root) {
      members.entry(root).or_default().push(index);
    }
  }

  members
    .into_iter()
    .filter_map(|(root, indices)| {
      let period = *spans.get(&root)?;
      Some(Overlap {
        period,
        conflicting_types: indices
          .iter()
          .map(|&i| records[i].reporting_type)
          .collect(),
        record_ids: indices.iter().map(|&i| records[i].record_id).collect(),
      })
    })
    .collect()
}

/// Union-find over record indices.
struct DisjointSet {
  parent: Vec<usize>,
}

impl DisjointSet {
  fn new(len: usize) -> Self {
    Self {
      parent: (0..len).collect(),
    }
  }

  fn find(&mut self, mut index: usize) -> usize {
    while self.parent[index] != index {
      self.parent[index] = self.parent[self.parent[index]];
      index = self.parent[index];
    }
    index
  }

  fn union(&mut self, a: usize, b: usize) {
    let (a, b) = (self.find(a), self.find(b));
    if a != b {
      self.parent[b.max(a)] = a.min(b);
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
