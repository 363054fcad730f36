//! Error type for `inventory-store-sqlite`.

use inventory_core::store::StorageError;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Self::Database(e.into()) }
}

impl StorageError for Error {
  fn is_transient(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => is_transient_sqlite(e),
      _ => false,
    }
  }
}

/// Lock contention and duplicate-key races are worth retrying; other
/// constraint failures and everything else are not.
pub(crate) fn is_transient_sqlite(e: &rusqlite::Error) -> bool {
  let rusqlite::Error::SqliteFailure(failure, _) = e else {
    return false;
  };
  match failure.code {
    ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked => true,
    ffi::ErrorCode::ConstraintViolation => matches!(
      failure.extended_code,
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    ),
    _ => false,
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
