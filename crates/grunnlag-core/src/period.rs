//! Day-granular periods.
//!
//! A [`Period`] runs from `from` through `to` inclusive. A missing `to` means
//! the period is ongoing. Interval arithmetic works on the derived exclusive
//! boundary (`to + 1 day`) so that a period ending on the last day of a month
//! is adjacent to one starting on the first day of the next.

use std::{cmp::Ordering, fmt};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An immutable, validated date interval. `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
  from: NaiveDate,
  to:   Option<NaiveDate>,
}

/// Unchecked wire shape; [`Period`] deserialises through it so that inverted
/// periods are rejected at the boundary.
#[derive(Deserialize)]
struct RawPeriod {
  from: NaiveDate,
  #[serde(default)]
  to:   Option<NaiveDate>,
}

impl TryFrom<RawPeriod> for Period {
  type Error = Error;

  fn try_from(raw: RawPeriod) -> Result<Self> { Self::new(raw.from, raw.to) }
}

impl Period {
  /// Build a period, rejecting `from > to`.
  pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self> {
    match to {
      Some(to) if from > to => Err(Error::InvertedPeriod { from, to }),
      _ => Ok(Self { from, to }),
    }
  }

  /// An ongoing period starting on `from`.
  pub fn open(from: NaiveDate) -> Self { Self { from, to: None } }

  /// A period covering whole calendar months: from the first day of
  /// `from` through the last day of `to` (or ongoing when `to` is `None`).
  pub fn months(from: (i32, u32), to: Option<(i32, u32)>) -> Result<Self> {
    let start = first_day(from.0, from.1)?;
    let end = match to {
      Some((year, month)) => Some(last_day(year, month)?),
      None => None,
    };
    Self::new(start, end)
  }

  pub fn from(&self) -> NaiveDate { self.from }

  pub fn to(&self) -> Option<NaiveDate> { self.to }

  pub fn is_open(&self) -> bool { self.to.is_none() }

  /// The first day after the period, or `None` for an ongoing period.
  pub fn end_exclusive(&self) -> Option<NaiveDate> {
    self.to.and_then(|to| to.succ_opt())
  }

  /// Whether the period covers `date`.
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.from <= date && self.reaches(date)
  }

  /// Whether the period lasts until at least `date` (ongoing periods always
  /// do).
  pub fn reaches(&self, date: NaiveDate) -> bool {
    self.to.is_none_or(|to| to >= date)
  }

  /// True iff both periods share at least one day.
  pub fn overlaps(&self, other: &Period) -> bool {
    self.reaches(other.from) && other.reaches(self.from)
  }

  /// True iff one period ends on the day before the other starts.
  pub fn is_adjacent_to(&self, other: &Period) -> bool {
    self.end_exclusive() == Some(other.from)
      || other.end_exclusive() == Some(self.from)
  }

  /// Union of two periods that overlap or touch. Returns `None` when they
  /// are disjoint, since the union would not be a single period.
  pub fn merge(&self, other: &Period) -> Option<Period> {
    (self.overlaps(other) || self.is_adjacent_to(other))
      .then(|| self.hull(other))
  }

  /// The smallest period covering both, regardless of what lies between.
  pub fn hull(&self, other: &Period) -> Period {
    Period {
      from: self.from.min(other.from),
      to:   max_end(self.to, other.to),
    }
  }

  /// The days shared by both periods, if any.
  pub fn intersection(&self, other: &Period) -> Option<Period> {
    self.overlaps(other).then(|| Period {
      from: self.from.max(other.from),
      to:   min_end(self.to, other.to),
    })
  }
}

impl Ord for Period {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .from
      .cmp(&other.from)
      .then_with(|| cmp_end(self.to, other.to))
  }
}

impl PartialOrd for Period {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.to {
      Some(to) => write!(f, "{}..={}", self.from, to),
      None => write!(f, "{}..", self.from),
    }
  }
}

// ─── End-point helpers ───────────────────────────────────────────────────────

/// Orders end dates with `None` (ongoing) after every concrete date.
pub fn cmp_end(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
  match (a, b) {
    (None, None) => Ordering::Equal,
    (None, Some(_)) => Ordering::Greater,
    (Some(_), None) => Ordering::Less,
    (Some(a), Some(b)) => a.cmp(&b),
  }
}

/// The later of two end dates; ongoing wins.
pub fn max_end(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
  match cmp_end(a, b) {
    Ordering::Less => b,
    _ => a,
  }
}

/// The earlier of two end dates.
pub fn min_end(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
  match cmp_end(a, b) {
    Ordering::Greater => b,
    _ => a,
  }
}

fn first_day(year: i32, month: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, 1)
    .ok_or(Error::InvalidMonth { year, month })
}

fn last_day(year: i32, month: u32) -> Result<NaiveDate> {
  first_day(year, month)?
    .checked_add_months(Months::new(1))
    .and_then(|next| next.pred_opt())
    .filter(|last| last.month() == month)
    .ok_or(Error::InvalidMonth { year, month })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn inverted_period_is_rejected() {
    let err = Period::new(d(2022, 3, 1), Some(d(2022, 2, 1))).unwrap_err();
    assert_eq!(err, Error::InvertedPeriod {
      from: d(2022, 3, 1),
      to:   d(2022, 2, 1),
    });
  }

  #[test]
  fn single_day_period_is_allowed() {
    let p = Period::new(d(2022, 3, 1), Some(d(2022, 3, 1))).unwrap();
    assert!(p.contains(d(2022, 3, 1)));
    assert!(!p.contains(d(2022, 3, 2)));
  }

  #[test]
  fn months_cover_whole_calendar_months() {
    let p = Period::months((2024, 1), Some((2024, 2))).unwrap();
    assert_eq!(p.from(), d(2024, 1, 1));
    assert_eq!(p.to(), Some(d(2024, 2, 29)));

    let dec = Period::months((2023, 12), Some((2023, 12))).unwrap();
    assert_eq!(dec.to(), Some(d(2023, 12, 31)));
  }

  #[test]
  fn invalid_month_is_rejected() {
    assert_eq!(
      Period::months((2024, 13), None).unwrap_err(),
      Error::InvalidMonth { year: 2024, month: 13 }
    );
  }

  #[test]
  fn overlap_is_inclusive_at_boundaries() {
    let a = Period::months((2022, 1), Some((2022, 2))).unwrap();
    let b = Period::new(d(2022, 2, 28), None).unwrap();
    let c = Period::months((2022, 3), Some((2022, 4))).unwrap();
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(!a.overlaps(&c));
    assert!(a.is_adjacent_to(&c));
    assert!(c.is_adjacent_to(&a));
  }

  #[test]
  fn open_periods_overlap_everything_after_their_start() {
    let open = Period::open(d(2020, 1, 1));
    let later = Period::months((2030, 5), Some((2030, 5))).unwrap();
    let earlier = Period::months((2019, 5), Some((2019, 12))).unwrap();
    assert!(open.overlaps(&later));
    assert!(!open.overlaps(&earlier));
  }

  #[test]
  fn merge_requires_contact() {
    let a = Period::months((2022, 1), Some((2022, 2))).unwrap();
    let b = Period::months((2022, 3), None).unwrap();
    let c = Period::months((2022, 5), Some((2022, 6))).unwrap();

    assert_eq!(a.merge(&b), Some(Period::open(d(2022, 1, 1))));
    assert_eq!(a.merge(&c), None);
  }

  #[test]
  fn intersection_of_open_and_closed() {
    let open = Period::open(d(2022, 1, 1));
    let closed = Period::months((2023, 3), Some((2024, 2))).unwrap();
    assert_eq!(open.intersection(&closed), Some(closed));
    assert_eq!(
      closed.intersection(&Period::months((2025, 1), None).unwrap()),
      None
    );
  }

  #[test]
  fn ordering_puts_open_end_last() {
    let open = Period::open(d(2022, 1, 1));
    let closed = Period::months((2022, 1), Some((2022, 12))).unwrap();
    let later = Period::months((2022, 2), Some((2022, 2))).unwrap();
    let mut periods = vec![later, open, closed];
    periods.sort();
    assert_eq!(periods, vec![closed, open, later]);
  }

  #[test]
  fn deserialising_inverted_period_fails() {
    let json = r#"{"from":"2022-05-01","to":"2022-04-30"}"#;
    assert!(serde_json::from_str::<Period>(json).is_err());

    let open: Period =
      serde_json::from_str(r#"{"from":"2022-05-01"}"#).unwrap();
    assert!(open.is_open());
  }
}
