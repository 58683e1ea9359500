//! Core types and trait definitions for case facts.
//!
//! This crate holds the period model, typed fact records, snapshots, and the
//! collaborator traits the engine consumes. It has no algorithms beyond
//! period primitives and no I/O.

pub mod error;
pub mod period;
pub mod record;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
pub use period::Period;
pub use record::{Category, FactRecord, NewFactRecord, ReportingType};
pub use subject::{PersonIdent, Role};
