use chrono::{Duration, NaiveDateTime};
use sqlx::FromRow;

use crate::database::{Connection, ErrorExt, Result};
use crate::util::validation;

/// Validity window for a reset request, measured from `created_at`.
pub const RESET_WINDOW_MINS: i64 = 60;

/// A pending password reset, at most one per email. Stores only the
/// digest of the raw token that was generated for the user.
///
/// Rows are keyed by the lowercased email, so a request and its later
/// verification agree no matter how the address was typed.
#[derive(Debug, FromRow, PartialEq, Eq)]
pub struct PasswordReset {
  pub email: String,
  pub token_hash: String,
  pub created_at: NaiveDateTime,
}

/// A pending request together with the database clock at fetch time.
/// Expiry is judged against `fetched_at` rather than the app server's
/// clock; `created_at` was written by the same Postgres instance, so
/// its timezone setting cancels out.
#[derive(Debug, FromRow)]
pub struct PendingReset {
  #[sqlx(flatten)]
  pub request: PasswordReset,
  pub fetched_at: NaiveDateTime,
}

impl PasswordReset {
  /// Records a reset request, replacing any prior request for the
  /// same email. The primary key on `email` makes the overwrite a
  /// storage-level guarantee rather than a read-then-write.
  #[tracing::instrument(skip_all)]
  pub async fn upsert(conn: &mut Connection, email: &str, token_hash: &str) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "password_resets" (email, token_hash, created_at)
         VALUES ($1, $2, NOW())
         ON CONFLICT (email)
         DO UPDATE SET token_hash = EXCLUDED.token_hash, created_at = NOW()
         RETURNING *"#,
    )
    .bind(validation::normalize_email(email))
    .bind(token_hash)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip_all)]
  pub async fn by_email(conn: &mut Connection, email: &str) -> Result<Option<PendingReset>> {
    sqlx::query_as::<_, PendingReset>(
      r#"SELECT email, token_hash, created_at, NOW()::timestamp AS fetched_at
         FROM "password_resets" WHERE email = $1"#,
    )
    .bind(validation::normalize_email(email))
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Consumes the request. Called both on successful verification
  /// (single-use) and on expiry detection.
  #[tracing::instrument(skip_all)]
  pub async fn delete(conn: &mut Connection, email: &str) -> Result<()> {
    sqlx::query(r#"DELETE FROM "password_resets" WHERE email = $1"#)
      .bind(validation::normalize_email(email))
      .execute(conn)
      .await
      .into_db_error()?;

    Ok(())
  }

  /// Whether the request fell out of its 60 minute window at `now`.
  #[must_use]
  pub fn is_expired(&self, now: NaiveDateTime) -> bool {
    now - self.created_at > Duration::minutes(RESET_WINDOW_MINS)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn request_at(created_at: NaiveDateTime) -> PasswordReset {
    PasswordReset {
      email: "someone@example.com".into(),
      token_hash: "digest".into(),
      created_at,
    }
  }

  fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 4)
      .unwrap()
      .and_hms_opt(12, 0, 0)
      .unwrap()
  }

  #[test]
  fn fresh_request_is_not_expired() {
    let created = noon();
    let request = request_at(created);

    assert!(!request.is_expired(created + Duration::minutes(59)));
    assert!(!request.is_expired(created + Duration::minutes(60)));
  }

  #[test]
  fn request_expires_after_the_window() {
    let created = noon();
    let request = request_at(created);

    assert!(request.is_expired(created + Duration::minutes(61)));
    assert!(request.is_expired(created + Duration::days(2)));
  }

  #[test]
  fn expiry_is_judged_by_the_fetch_clock() {
    let created = noon();
    let pending = PendingReset {
      request: request_at(created),
      fetched_at: created + Duration::minutes(61),
    };

    assert!(pending.request.is_expired(pending.fetched_at));
  }
}
