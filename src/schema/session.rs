use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{SessionId, UserId},
};

use super::User;

/// One opaque bearer session. A user may hold any number of
/// concurrent sessions (multi-device); each row stores only the
/// digest of the token that was handed out.
#[derive(Debug, FromRow, PartialEq, Eq)]
pub struct Session {
  pub id: SessionId,
  pub user_id: UserId,
  pub token_hash: String,
  pub created_at: NaiveDateTime,
}

impl Session {
  #[tracing::instrument(skip_all)]
  pub async fn insert(conn: &mut Connection, user_id: UserId, token_hash: &str) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "sessions" (user_id, token_hash)
         VALUES ($1, $2)
         RETURNING *"#,
    )
    .bind(user_id)
    .bind(token_hash)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  /// Resolves a token digest to its (live) owner.
  ///
  /// `ttl_secs` is the optional session lifetime from configuration;
  /// sessions are valid until revoked when it is `None`. Tombstoned
  /// users never resolve.
  #[tracing::instrument(skip_all)]
  pub async fn resolve_user(
    conn: &mut Connection,
    token_hash: &str,
    ttl_secs: Option<i64>,
  ) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
      r#"SELECT u.* FROM "users" u
         INNER JOIN "sessions" s ON s.user_id = u.id
         WHERE s.token_hash = $1
           AND u.deleted_at IS NULL
           AND ($2::bigint IS NULL OR s.created_at > NOW() - $2::bigint * INTERVAL '1 second')"#,
    )
    .bind(token_hash)
    .bind(ttl_secs)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Deletes the session behind a token digest. Revoking an unknown
  /// or already-revoked token is a no-op.
  #[tracing::instrument(skip_all)]
  pub async fn revoke(conn: &mut Connection, token_hash: &str) -> Result<()> {
    sqlx::query(r#"DELETE FROM "sessions" WHERE token_hash = $1"#)
      .bind(token_hash)
      .execute(conn)
      .await
      .into_db_error()?;

    Ok(())
  }
}
