//! Per-case inputs shared by the validators and the diff engine.

use chrono::NaiveDate;
use grunnlag_core::{
  FactRecord, PersonIdent, Role,
  registry::{PersonRegistry, RoleResolver},
};

/// Everything a validation or diff needs besides the records themselves.
///
/// `today` is injected rather than read from a clock so that results are
/// reproducible.
#[derive(Clone, Copy)]
pub struct CaseContext<'a> {
  pub effective_date: NaiveDate,
  pub today:          NaiveDate,
  /// The children the case concerns; each must have housing status data.
  pub children:       &'a [PersonIdent],
  pub persons:        &'a dyn PersonRegistry,
  pub roles:          &'a dyn RoleResolver,
}

impl CaseContext<'_> {
  /// Periods starting after this date are future-dated.
  pub fn future_threshold(&self) -> NaiveDate {
    self.today.max(self.effective_date)
  }

  /// Where gap detection starts for a child: the effective date, or the
  /// child's birth date when that is later.
  pub fn child_anchor(&self, child: &PersonIdent) -> NaiveDate {
    self
      .persons
      .birth_date(child)
      .map_or(self.effective_date, |born| born.max(self.effective_date))
  }

  pub fn current_ident(&self, ident: &PersonIdent) -> PersonIdent {
    self.persons.current_ident(ident)
  }

  pub fn role_of(&self, ident: &PersonIdent) -> Option<Role> {
    self.roles.role_of(ident)
  }

  /// A copy of `record` with subject and child replaced by their current
  /// identifiers.
  pub fn resolve(&self, record: &FactRecord) -> FactRecord {
    FactRecord {
      subject: self.current_ident(&record.subject),
      child: record.child.as_ref().map(|c| self.current_ident(c)),
      ..record.clone()
    }
  }
}
