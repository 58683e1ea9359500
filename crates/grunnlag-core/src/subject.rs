//! Persons and their roles in a case.
//!
//! A person is referred to by a registry identifier. Identifiers can change
//! over time; resolving the current one is the job of a
//! [`PersonRegistry`](crate::registry::PersonRegistry).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A registry identifier for a person. Never empty.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PersonIdent(String);

impl PersonIdent {
  pub fn new(ident: impl Into<String>) -> Result<Self> {
    let ident = ident.into();
    if ident.trim().is_empty() {
      return Err(Error::MissingIdentifier("person"));
    }
    Ok(Self(ident))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for PersonIdent {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl FromStr for PersonIdent {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::new(s) }
}

impl From<PersonIdent> for String {
  fn from(value: PersonIdent) -> Self { value.0 }
}

impl fmt::Display for PersonIdent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// The part a person plays in a child-support case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  /// The parent obliged to pay.
  Payer,
  /// The parent receiving support on behalf of the child.
  Receiver,
  /// A child the support is calculated for.
  Child,
  /// Anyone else whose facts are relevant, e.g. an adult in a household.
  Other,
}
