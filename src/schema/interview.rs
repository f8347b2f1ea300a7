use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{InterviewId, QuestionId, UserId},
};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Interview {
  pub id: InterviewId,
  pub title: String,
  pub description: String,
  pub created_by: UserId,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  #[serde(skip_serializing)]
  pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
  pub id: QuestionId,
  pub interview_id: InterviewId,
  pub text: String,
  pub position: i32,
  /// Optional cap on how long a recorded answer may run.
  pub max_seconds: Option<i32>,
}

/// Question payload at interview creation, before ids exist.
#[derive(Debug)]
pub struct NewQuestion {
  pub text: String,
  pub position: i32,
  pub max_seconds: Option<i32>,
}

/// An interview with its ordered questions, the aggregate most
/// endpoints respond with.
#[derive(Debug, Serialize)]
pub struct InterviewView {
  #[serde(flatten)]
  pub interview: Interview,
  pub questions: Vec<Question>,
}

impl Interview {
  /// Inserts an interview and its questions. Run inside a transaction
  /// so a failed question insert never leaves a questionless interview.
  #[tracing::instrument(skip_all)]
  pub async fn create(
    conn: &mut Connection,
    title: &str,
    description: &str,
    created_by: UserId,
    questions: &[NewQuestion],
  ) -> Result<InterviewView> {
    let interview = sqlx::query_as::<_, Self>(
      r#"INSERT INTO "interviews" (title, description, created_by)
         VALUES ($1, $2, $3)
         RETURNING *"#,
    )
    .bind(title)
    .bind(description)
    .bind(created_by)
    .fetch_one(&mut *conn)
    .await
    .into_db_error()?;

    let mut created = Vec::with_capacity(questions.len());
    for question in questions {
      let row = sqlx::query_as::<_, Question>(
        r#"INSERT INTO "questions" (interview_id, text, position, max_seconds)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
      )
      .bind(interview.id)
      .bind(&question.text)
      .bind(question.position)
      .bind(question.max_seconds)
      .fetch_one(&mut *conn)
      .await
      .into_db_error()?;
      created.push(row);
    }

    Ok(InterviewView {
      interview,
      questions: created,
    })
  }

  #[tracing::instrument(skip(conn))]
  pub async fn by_id(conn: &mut Connection, id: InterviewId) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "interviews" WHERE id = $1 AND deleted_at IS NULL"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn with_questions(conn: &mut Connection, id: InterviewId) -> Result<Option<InterviewView>> {
    let Some(interview) = Self::by_id(&mut *conn, id).await? else {
      return Ok(None);
    };
    let questions = Question::for_interview(conn, id).await?;

    Ok(Some(InterviewView {
      interview,
      questions,
    }))
  }

  #[tracing::instrument(skip_all)]
  pub async fn update(
    conn: &mut Connection,
    id: InterviewId,
    title: &str,
    description: Option<&str>,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"UPDATE "interviews"
         SET title = $2, description = COALESCE($3, description), updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *"#,
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Tombstones the interview; submissions referencing it survive.
  #[tracing::instrument(skip(conn))]
  pub async fn soft_delete(conn: &mut Connection, id: InterviewId) -> Result<bool> {
    let result = sqlx::query(
      r#"UPDATE "interviews" SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL"#,
    )
    .bind(id)
    .execute(conn)
    .await
    .into_db_error()?;

    Ok(result.rows_affected() > 0)
  }

  /// All live interviews, newest first, questions attached.
  #[tracing::instrument(skip(conn))]
  pub async fn list_with_questions(conn: &mut Connection) -> Result<Vec<InterviewView>> {
    let interviews = sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "interviews" WHERE deleted_at IS NULL ORDER BY created_at DESC"#,
    )
    .fetch_all(&mut *conn)
    .await
    .into_db_error()?;

    attach_questions(conn, interviews).await
  }
}

impl Question {
  #[tracing::instrument(skip(conn))]
  pub async fn for_interview(conn: &mut Connection, interview_id: InterviewId) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "questions" WHERE interview_id = $1 ORDER BY position, id"#,
    )
    .bind(interview_id)
    .fetch_all(conn)
    .await
    .into_db_error()
  }
}

/// Bulk-loads questions for a page of interviews and zips them
/// together, instead of a query per row.
pub(crate) async fn attach_questions(
  conn: &mut Connection,
  interviews: Vec<Interview>,
) -> Result<Vec<InterviewView>> {
  let ids: Vec<i64> = interviews.iter().map(|i| i.id.0).collect();
  let questions = sqlx::query_as::<_, Question>(
    r#"SELECT * FROM "questions" WHERE interview_id = ANY($1) ORDER BY position, id"#,
  )
  .bind(&ids)
  .fetch_all(conn)
  .await
  .into_db_error()?;

  let mut by_interview: HashMap<InterviewId, Vec<Question>> = HashMap::new();
  for question in questions {
    by_interview
      .entry(question.interview_id)
      .or_default()
      .push(question);
  }

  Ok(
    interviews
      .into_iter()
      .map(|interview| {
        let questions = by_interview.remove(&interview.id).unwrap_or_default();
        InterviewView {
          interview,
          questions,
        }
      })
      .collect(),
  )
}
