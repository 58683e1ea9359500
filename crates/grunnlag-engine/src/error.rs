//! Error types for `grunnlag-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("repository error: {0}")]
  Repository(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
