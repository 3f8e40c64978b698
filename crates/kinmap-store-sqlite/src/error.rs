//! Error type for `kinmap-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The file was written by a newer release with a schema this build does
  /// not know.
  #[error("unsupported schema version {found} (expected at most {supported})")]
  UnsupportedVersion { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
