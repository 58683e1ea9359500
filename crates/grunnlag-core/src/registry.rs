//! Person and role lookups the engine consumes.
//!
//! Both traits are injected by the caller. The engine never looks persons up
//! through global state.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::subject::{PersonIdent, Role};

/// Identity continuity and birth dates.
pub trait PersonRegistry: Send + Sync {
  /// The identifier currently in use for `ident`. Persons whose identifier
  /// never changed map to themselves.
  fn current_ident(&self, ident: &PersonIdent) -> PersonIdent;

  fn birth_date(&self, ident: &PersonIdent) -> Option<NaiveDate>;
}

/// Maps a person to their role in the case, for labelling results.
pub trait RoleResolver: Send + Sync {
  fn role_of(&self, ident: &PersonIdent) -> Option<Role>;
}

// ─── In-memory implementation ────────────────────────────────────────────────

/// One person as known to the case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonEntry {
  pub ident:           PersonIdent,
  /// Identifiers the person has had before `ident`.
  #[serde(default)]
  pub previous_idents: Vec<PersonIdent>,
  #[serde(default)]
  pub birth_date:      Option<NaiveDate>,
  pub role:            Role,
}

/// A fixed set of persons implementing both lookups.
#[derive(Debug, Clone, Default)]
pub struct CasePersons {
  entries:  Vec<PersonEntry>,
  by_ident: HashMap<PersonIdent, usize>,
}

impl CasePersons {
  pub fn new(entries: Vec<PersonEntry>) -> Self {
    let mut by_ident = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
      by_ident.insert(entry.ident.clone(), index);
      for previous in &entry.previous_idents {
        by_ident.insert(previous.clone(), index);
      }
    }
    Self { entries, by_ident }
  }

  /// Current identifiers of every person with `role`.
  pub fn with_role(&self, role: Role) -> Vec<PersonIdent> {
    self
      .entries
      .iter()
      .filter(|e| e.role == role)
      .map(|e| e.ident.clone())
      .collect()
  }

  fn entry(&self, ident: &PersonIdent) -> Option<&PersonEntry> {
    self.by_ident.get(ident).map(|&i| &self.entries[i])
  }
}

impl PersonRegistry for CasePersons {
  fn current_ident(&self, ident: &PersonIdent) -> PersonIdent {
    self
      .entry(ident)
      .map_or_else(|| ident.clone(), |e| e.ident.clone())
  }

  fn birth_date(&self, ident: &PersonIdent) -> Option<NaiveDate> {
    self.entry(ident).and_then(|e| e.birth_date)
  }
}

impl RoleResolver for CasePersons {
  fn role_of(&self, ident: &PersonIdent) -> Option<Role> {
    self.entry(ident).map(|e| e.role)
  }
}
