//! Period consistency checks and snapshot diffs for case facts.
//!
//! Validators report gaps, overlaps, missing coverage and future-dated
//! periods per subject and category. The diff engine classifies what a newly
//! ingested snapshot changes relative to the one in force. Everything here
//! is synchronous and pure except [`compare_with_active`], which reads
//! snapshots through a [`SnapshotRepository`](grunnlag_core::store::SnapshotRepository).

pub mod compare;
pub mod context;
pub mod diff;
pub mod error;
pub mod interval;
pub mod rules;
pub mod supersession;
pub mod validate;

pub use compare::compare_with_active;
pub use context::CaseContext;
pub use diff::{ChangeKind, ChangeRecord, IdentityKey, SubFieldChange, diff};
pub use error::{Error, Result};
pub use interval::{Overlap, find_gaps, find_overlaps, merge_spans};
pub use supersession::SupersessionIndex;
pub use validate::{
  ValidationCategory, ValidationReport, ValidationResult, validate,
  validate_all,
};
