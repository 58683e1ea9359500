//! Historical-supersession filter for annual assessments.
//!
//! A record is historical when its type is an annual assessment, it came
//! from a registry, it has a start date, and the same subject has a record
//! of the same type starting in a later year. Historical records stay in
//! storage but are left out of comparison views.

use std::collections::HashMap;

use chrono::Datelike;
use grunnlag_core::{FactRecord, PersonIdent, ReportingType};

use crate::rules;

/// The latest start year per subject and annual-assessment type.
#[derive(Debug, Clone, Default)]
pub struct SupersessionIndex {
  latest: HashMap<(PersonIdent, ReportingType), i32>,
}

impl SupersessionIndex {
  pub fn new<'a>(records: impl IntoIterator<Item = &'a FactRecord>) -> Self {
    let mut latest: HashMap<(PersonIdent, ReportingType), i32> =
      HashMap::new();
    for record in records {
      if !rules::is_annual_assessment(record.reporting_type) {
        continue;
      }
      let Some(start) = record.start_date() else {
        continue;
      };
      latest
        .entry((record.subject.clone(), record.reporting_type))
        .and_modify(|year| *year = (*year).max(start.year()))
        .or_insert(start.year());
    }
    Self { latest }
  }

  pub fn is_historical(&self, record: &FactRecord) -> bool {
    if !rules::is_annual_assessment(record.reporting_type)
      || record.is_manual()
    {
      return false;
    }
    let Some(start) = record.start_date() else {
      return false;
    };
    self
      .latest
      .get(&(record.subject.clone(), record.reporting_type))
      .is_some_and(|&latest| latest > start.year())
  }

  /// Drop historical records, keeping the input order.
  pub fn retain_current<'a>(
    &self,
    records: impl IntoIterator<Item = &'a FactRecord>,
  ) -> Vec<&'a FactRecord> {
    records
      .into_iter()
      .filter(|record| !self.is_historical(record))
      .collect()
  }
}
