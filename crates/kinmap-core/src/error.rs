//! Error types for `kinmap-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The underlying store failed (I/O, quota, corruption). Cascades abort at
  /// the first such failure and may leave earlier writes applied.
  #[error("storage fault: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// An imported document lacks the required top-level arrays or holds
  /// records that do not decode. Raised before the store is touched.
  #[error("import format fault: {0}")]
  ImportFormat(String),

  #[error("validation fault: {0}")]
  Validation(#[from] ValidationError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error into [`Error::Storage`].
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

/// Rejections raised at the presentation boundary, before the engine runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("person name cannot be empty")]
  EmptyName,

  #[error("type name cannot be empty")]
  EmptyTypeName,

  #[error("a relationship type named {0:?} already exists")]
  DuplicateTypeName(String),

  #[error("the store already has people; onboarding runs only once")]
  AlreadyOnboarded,

  #[error("relationship type {name:?} is in use by {uses} reference(s)")]
  TypeInUse { name: String, uses: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
