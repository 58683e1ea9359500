//! Error types for `grunnlag-core`.
//!
//! Every variant is a precondition violation raised where a period or fact
//! record is constructed. Validation findings (gaps, overlaps, missing data)
//! are never errors.

use chrono::NaiveDate;
use thiserror::Error;

use crate::record::{Category, ReportingType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("period starts on {from} but ends on {to}")]
  InvertedPeriod { from: NaiveDate, to: NaiveDate },

  #[error("invalid calendar month {year}-{month:02}")]
  InvalidMonth { year: i32, month: u32 },

  #[error("missing mandatory {0} identifier")]
  MissingIdentifier(&'static str),

  #[error("reporting type {reporting_type} belongs to {expected}, not {found}")]
  CategoryMismatch {
    reporting_type: ReportingType,
    expected:       Category,
    found:          Category,
  },

  #[error("reporting type {0} is not a status")]
  NotAStatus(ReportingType),

  #[error("reporting type {0} requires a benefiting child")]
  ChildRequired(ReportingType),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
