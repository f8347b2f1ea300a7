use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error)]
pub enum Error {
  /// An error caused by an invalid Postgres connection
  /// url for either the primary or the replica pool.
  #[error("invalid connection url")]
  InvalidUrl,
  /// An error caused by an [`sqlx`] error.
  #[error("received a pool error: {0}")]
  Internal(sqlx::Error),
  /// The primary database pool is currently in read mode
  /// (most likely due to maintenance) and should not perform
  /// any writes.
  #[error("database is currently in read mode")]
  Readonly,
  /// Either the primary or replica database pools do not
  /// have a reliable connection to the database.
  #[error("unhealthy database pool")]
  UnhealthyPool,
  /// Failed to apply pending SQL migrations.
  #[error("failed to run migrations")]
  Migrate,
}

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
  fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
  fn into_db_error(self) -> Result<T> {
    self.map_err(|e| match &e {
      sqlx::Error::Database(err) if err.message().ends_with("read-only transaction") => {
        Report::new(e).change_context(Error::Readonly)
      }
      _ => Report::new(Error::Internal(e)),
    })
  }
}

/// Lazily typed [`std::result::Result`] but the error generic
/// is filled up with [a database error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Inspection helpers over `Report<Error>` so call sites do not
/// have to downcast by hand.
pub trait ErrorExt2 {
  fn is_unhealthy(&self) -> bool;
  fn is_readonly(&self) -> bool;
  /// Whether the underlying failure is a violated unique constraint.
  ///
  /// Both the duplicate-email and the duplicate-submission guards rely
  /// on this instead of a read-then-write existence check.
  fn is_unique_violation(&self) -> bool;
}

impl ErrorExt2 for Report<Error> {
  fn is_unhealthy(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| matches!(v, Error::UnhealthyPool))
      .unwrap_or_default()
  }

  fn is_readonly(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| matches!(v, Error::Readonly))
      .unwrap_or_default()
  }

  fn is_unique_violation(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| match v {
        Error::Internal(sqlx::Error::Database(e)) => {
          e.code().map(|c| c == UNIQUE_VIOLATION).unwrap_or_default()
        }
        _ => false,
      })
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug)]
  struct StubDbError {
    code: &'static str,
    message: &'static str,
  }

  impl std::fmt::Display for StubDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.write_str(self.message)
    }
  }

  impl std::error::Error for StubDbError {}

  impl sqlx::error::DatabaseError for StubDbError {
    fn message(&self) -> &str {
      self.message
    }

    fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
      Some(self.code.into())
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
      self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
      self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
      self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
      match self.code {
        UNIQUE_VIOLATION => sqlx::error::ErrorKind::UniqueViolation,
        "23503" => sqlx::error::ErrorKind::ForeignKeyViolation,
        _ => sqlx::error::ErrorKind::Other,
      }
    }
  }

  fn db_error(code: &'static str, message: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(StubDbError { code, message }))
  }

  #[test]
  fn unique_violations_are_detectable() {
    let report = Err::<(), _>(db_error(
      "23505",
      "duplicate key value violates unique constraint",
    ))
    .into_db_error()
    .unwrap_err();

    assert!(report.is_unique_violation());
    assert!(!report.is_readonly());
    assert!(!report.is_unhealthy());
  }

  #[test]
  fn other_constraint_codes_are_not_unique_violations() {
    let report = Err::<(), _>(db_error("23503", "violates foreign key constraint"))
      .into_db_error()
      .unwrap_err();

    assert!(!report.is_unique_violation());
  }

  #[test]
  fn read_only_transactions_surface_as_readonly() {
    let report = Err::<(), _>(db_error(
      "25006",
      "cannot execute INSERT in a read-only transaction",
    ))
    .into_db_error()
    .unwrap_err();

    assert!(report.is_readonly());
    assert!(!report.is_unique_violation());
  }
}
