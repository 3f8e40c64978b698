//! Error types for `kinmap-layout`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("invalid color {0:?}: expected #rgb or #rrggbb")]
  InvalidColor(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
