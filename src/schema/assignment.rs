use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{InterviewId, UserId},
};

use super::interview::{attach_questions, Interview, InterviewView};
use super::UserBrief;

/// One interview with everyone assigned to it, for the admin
/// assignments overview.
#[derive(Debug, Serialize)]
pub struct AssignmentOverview {
  #[serde(flatten)]
  pub interview: Interview,
  pub candidates: Vec<UserBrief>,
}

/// Membership pairs between interviews and candidates. Pure
/// union semantics: assigning never removes existing pairs and
/// re-assigning the same pair is idempotent.
pub struct Assignment;

impl Assignment {
  #[tracing::instrument(skip(conn, candidate_ids))]
  pub async fn assign(
    conn: &mut Connection,
    interview_id: InterviewId,
    candidate_ids: &[UserId],
  ) -> Result<()> {
    let ids: Vec<i64> = candidate_ids.iter().map(|id| id.0).collect();
    sqlx::query(
      r#"INSERT INTO "interview_candidates" (interview_id, candidate_id)
         SELECT $1, id FROM "users" WHERE id = ANY($2) AND deleted_at IS NULL
         ON CONFLICT DO NOTHING"#,
    )
    .bind(interview_id)
    .bind(&ids)
    .execute(conn)
    .await
    .into_db_error()?;

    Ok(())
  }

  /// How many of the given users exist and are assignable. Used to
  /// reject an assignment naming unknown users before any insert.
  #[tracing::instrument(skip(conn, candidate_ids))]
  pub async fn count_known_users(conn: &mut Connection, candidate_ids: &[UserId]) -> Result<i64> {
    let ids: Vec<i64> = candidate_ids.iter().map(|id| id.0).collect();
    let (count,): (i64,) = sqlx::query_as(
      r#"SELECT COUNT(*) FROM "users" WHERE id = ANY($1) AND deleted_at IS NULL"#,
    )
    .bind(&ids)
    .fetch_one(conn)
    .await
    .into_db_error()?;

    Ok(count)
  }

  #[tracing::instrument(skip(conn))]
  pub async fn candidates_for(
    conn: &mut Connection,
    interview_id: InterviewId,
  ) -> Result<Vec<UserBrief>> {
    sqlx::query_as::<_, UserBrief>(
      r#"SELECT u.id, u.name, u.email FROM "users" u
         INNER JOIN "interview_candidates" ic ON ic.candidate_id = u.id
         WHERE ic.interview_id = $1 AND u.deleted_at IS NULL
         ORDER BY u.id"#,
    )
    .bind(interview_id)
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  /// Interviews assigned to a candidate, with their questions, for
  /// the candidate dashboard.
  #[tracing::instrument(skip(conn))]
  pub async fn interviews_for(
    conn: &mut Connection,
    candidate_id: UserId,
  ) -> Result<Vec<InterviewView>> {
    let interviews = sqlx::query_as::<_, Interview>(
      r#"SELECT i.* FROM "interviews" i
         INNER JOIN "interview_candidates" ic ON ic.interview_id = i.id
         WHERE ic.candidate_id = $1 AND i.deleted_at IS NULL
         ORDER BY i.created_at DESC"#,
    )
    .bind(candidate_id)
    .fetch_all(&mut *conn)
    .await
    .into_db_error()?;

    attach_questions(conn, interviews).await
  }

  /// Every live interview with its assigned candidates. Two queries
  /// regardless of how many interviews there are.
  #[tracing::instrument(skip(conn))]
  pub async fn overview(conn: &mut Connection) -> Result<Vec<AssignmentOverview>> {
    #[derive(FromRow)]
    struct PairRow {
      interview_id: InterviewId,
      id: UserId,
      name: String,
      email: String,
    }

    let interviews = sqlx::query_as::<_, Interview>(
      r#"SELECT * FROM "interviews" WHERE deleted_at IS NULL ORDER BY created_at DESC"#,
    )
    .fetch_all(&mut *conn)
    .await
    .into_db_error()?;

    let ids: Vec<i64> = interviews.iter().map(|i| i.id.0).collect();
    let pairs = sqlx::query_as::<_, PairRow>(
      r#"SELECT ic.interview_id, u.id, u.name, u.email FROM "users" u
         INNER JOIN "interview_candidates" ic ON ic.candidate_id = u.id
         WHERE ic.interview_id = ANY($1) AND u.deleted_at IS NULL
         ORDER BY ic.interview_id, u.id"#,
    )
    .bind(&ids)
    .fetch_all(conn)
    .await
    .into_db_error()?;

    let mut by_interview: HashMap<InterviewId, Vec<UserBrief>> = HashMap::new();
    for pair in pairs {
      by_interview.entry(pair.interview_id).or_default().push(UserBrief {
        id: pair.id,
        name: pair.name,
        email: pair.email,
      });
    }

    Ok(
      interviews
        .into_iter()
        .map(|interview| {
          let candidates = by_interview.remove(&interview.id).unwrap_or_default();
          AssignmentOverview {
            interview,
            candidates,
          }
        })
        .collect(),
    )
  }
}
