//! Error types for `inventory-core`.
//!
//! Backend failures are carried as the backend's own error type `E`; this
//! layer only adds the retry outcome.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error<E> {
  /// A permanent write failure or any read failure, surfaced unchanged.
  #[error("storage error: {0}")]
  Storage(#[source] E),

  /// Every attempt failed transiently; `source` is the last cause seen.
  #[error("storage write failed after {attempts} attempts: {source}")]
  RetriesExhausted {
    attempts: u32,
    #[source]
    source:   E,
  },
}

pub type Result<T, E> = std::result::Result<T, Error<E>>;
