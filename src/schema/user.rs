use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
  Admin,
  Candidate,
  Reviewer,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
  pub id: UserId,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role: Role,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  // Tombstone; rows are never physically deleted while submissions
  // or answers still reference them.
  #[serde(skip_serializing)]
  pub deleted_at: Option<NaiveDateTime>,
}

/// Identity projection used in listings and nested views.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserBrief {
  pub id: UserId,
  pub name: String,
  pub email: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UpdateUser {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password_hash: Option<String>,
  pub role: Option<Role>,
}

impl User {
  #[tracing::instrument(skip(conn))]
  pub async fn by_id(conn: &mut Connection, id: UserId) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE id = $1 AND deleted_at IS NULL"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn, email), fields(email = "<hidden>"))]
  pub async fn by_email(conn: &mut Connection, email: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "users" WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"#,
    )
    .bind(email)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Inserts a new user. Email uniqueness is enforced by the
  /// case-insensitive unique index; a duplicate surfaces as a
  /// unique violation, not as a prior existence check.
  #[tracing::instrument(skip_all)]
  pub async fn insert(
    conn: &mut Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "users" (name, email, password_hash, role)
         VALUES ($1, $2, $3, $4)
         RETURNING *"#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip_all)]
  pub async fn update(conn: &mut Connection, id: UserId, fields: UpdateUser) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"UPDATE "users"
         SET name = COALESCE($2, name),
             email = COALESCE($3, email),
             password_hash = COALESCE($4, password_hash),
             role = COALESCE($5, role),
             updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *"#,
    )
    .bind(id)
    .bind(fields.name)
    .bind(fields.email)
    .bind(fields.password_hash)
    .bind(fields.role)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip_all)]
  pub async fn update_password(
    conn: &mut Connection,
    id: UserId,
    password_hash: &str,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"UPDATE "users" SET password_hash = $2, updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *"#,
    )
    .bind(id)
    .bind(password_hash)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Tombstones the user. Sessions are revoked alongside so a
  /// deleted account cannot keep acting through an old token;
  /// submissions and answers keep their references.
  #[tracing::instrument(skip(conn))]
  pub async fn soft_delete(conn: &mut Connection, id: UserId) -> Result<bool> {
    sqlx::query(r#"DELETE FROM "sessions" WHERE user_id = $1"#)
      .bind(id)
      .execute(&mut *conn)
      .await
      .into_db_error()?;

    let result = sqlx::query(
      r#"UPDATE "users" SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL"#,
    )
    .bind(id)
    .execute(conn)
    .await
    .into_db_error()?;

    Ok(result.rows_affected() > 0)
  }

  /// Candidates and reviewers, the populations an admin manages.
  #[tracing::instrument(skip(conn))]
  pub async fn list_managed(conn: &mut Connection) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "users"
         WHERE role IN ('candidate', 'reviewer') AND deleted_at IS NULL
         ORDER BY id"#,
    )
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn list_candidates(conn: &mut Connection) -> Result<Vec<UserBrief>> {
    sqlx::query_as::<_, UserBrief>(
      r#"SELECT id, name, email FROM "users"
         WHERE role = 'candidate' AND deleted_at IS NULL
         ORDER BY id"#,
    )
    .fetch_all(conn)
    .await
    .into_db_error()
  }
}
