use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{AnswerId, InterviewId, QuestionId, SubmissionId, UserId},
};

use super::interview::Question;
use super::UserBrief;

/// Canonical score bound. The backend has always accepted 0-100;
/// clients restricting input further are on their own.
pub const MAX_SCORE: i16 = 100;

#[must_use]
pub fn score_in_bounds(score: i16) -> bool {
  (0..=MAX_SCORE).contains(&score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
pub enum SubmissionStatus {
  Submitted,
}

/// A candidate's single submission for an interview. The unique
/// index on (interview_id, candidate_id) is what actually enforces
/// "at most one"; a second insert fails instead of overwriting.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
  pub id: SubmissionId,
  pub interview_id: InterviewId,
  pub candidate_id: UserId,
  pub status: SubmissionStatus,
  pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Answer {
  pub id: AnswerId,
  pub submission_id: SubmissionId,
  pub question_id: QuestionId,
  /// Opaque reference into the artifact store; never interpreted here.
  pub artifact_uri: String,
  pub duration_seconds: Option<i32>,
  pub score: Option<i16>,
  pub review_comment: Option<String>,
  pub reviewed_by: Option<UserId>,
}

/// Answer payload collected at submission time, before review.
#[derive(Debug)]
pub struct NewAnswer {
  pub question_id: QuestionId,
  pub artifact_uri: String,
  pub duration_seconds: Option<i32>,
}

/// One answer with its question and reviewer attached, nested
/// under [`SubmissionView`].
#[derive(Debug, Serialize)]
pub struct AnswerView {
  #[serde(flatten)]
  pub answer: Answer,
  pub question: Option<Question>,
  pub reviewer: Option<UserBrief>,
}

/// Reviewer-facing aggregate for one submission.
#[derive(Debug, Serialize)]
pub struct SubmissionView {
  #[serde(flatten)]
  pub submission: Submission,
  pub candidate: Option<UserBrief>,
  pub answers: Vec<AnswerView>,
}

impl Submission {
  /// Inserts the submission row. A duplicate (interview, candidate)
  /// pair comes back as a unique violation; callers map it to a
  /// conflict instead of pre-checking.
  #[tracing::instrument(skip(conn))]
  pub async fn insert(
    conn: &mut Connection,
    interview_id: InterviewId,
    candidate_id: UserId,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "submissions" (interview_id, candidate_id)
         VALUES ($1, $2)
         RETURNING *"#,
    )
    .bind(interview_id)
    .bind(candidate_id)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn exists(
    conn: &mut Connection,
    interview_id: InterviewId,
    candidate_id: UserId,
  ) -> Result<bool> {
    let (found,): (bool,) = sqlx::query_as(
      r#"SELECT EXISTS(
           SELECT 1 FROM "submissions" WHERE interview_id = $1 AND candidate_id = $2
         )"#,
    )
    .bind(interview_id)
    .bind(candidate_id)
    .fetch_one(conn)
    .await
    .into_db_error()?;

    Ok(found)
  }

  #[tracing::instrument(skip(conn))]
  pub async fn for_candidate(
    conn: &mut Connection,
    interview_id: InterviewId,
    candidate_id: UserId,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "submissions" WHERE interview_id = $1 AND candidate_id = $2"#,
    )
    .bind(interview_id)
    .bind(candidate_id)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// All submissions for an interview with candidate, answers,
  /// questions and reviewers resolved in bulk. Tombstoned users are
  /// still shown here; a review trail outlives its accounts.
  #[tracing::instrument(skip(conn))]
  pub async fn views_for_interview(
    conn: &mut Connection,
    interview_id: InterviewId,
  ) -> Result<Vec<SubmissionView>> {
    let submissions = sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "submissions" WHERE interview_id = $1 ORDER BY created_at"#,
    )
    .bind(interview_id)
    .fetch_all(&mut *conn)
    .await
    .into_db_error()?;

    let submission_ids: Vec<i64> = submissions.iter().map(|s| s.id.0).collect();
    let answers = sqlx::query_as::<_, Answer>(
      r#"SELECT * FROM "answers" WHERE submission_id = ANY($1) ORDER BY id"#,
    )
    .bind(&submission_ids)
    .fetch_all(&mut *conn)
    .await
    .into_db_error()?;

    let question_ids: Vec<i64> = answers.iter().map(|a| a.question_id.0).collect();
    let questions = sqlx::query_as::<_, Question>(r#"SELECT * FROM "questions" WHERE id = ANY($1)"#)
      .bind(&question_ids)
      .fetch_all(&mut *conn)
      .await
      .into_db_error()?;

    let mut user_ids: Vec<i64> = submissions.iter().map(|s| s.candidate_id.0).collect();
    user_ids.extend(answers.iter().filter_map(|a| a.reviewed_by.map(|id| id.0)));
    let users =
      sqlx::query_as::<_, UserBrief>(r#"SELECT id, name, email FROM "users" WHERE id = ANY($1)"#)
        .bind(&user_ids)
        .fetch_all(&mut *conn)
        .await
        .into_db_error()?;

    let questions: HashMap<QuestionId, Question> =
      questions.into_iter().map(|q| (q.id, q)).collect();
    let users: HashMap<UserId, UserBrief> = users.into_iter().map(|u| (u.id, u)).collect();

    let mut answers_by_submission: HashMap<SubmissionId, Vec<AnswerView>> = HashMap::new();
    for answer in answers {
      let view = AnswerView {
        question: questions.get(&answer.question_id).cloned(),
        reviewer: answer.reviewed_by.and_then(|id| users.get(&id).cloned()),
        answer,
      };
      answers_by_submission
        .entry(view.answer.submission_id)
        .or_default()
        .push(view);
    }

    Ok(
      submissions
        .into_iter()
        .map(|submission| SubmissionView {
          candidate: users.get(&submission.candidate_id).cloned(),
          answers: answers_by_submission
            .remove(&submission.id)
            .unwrap_or_default(),
          submission,
        })
        .collect(),
    )
  }
}

impl Answer {
  #[tracing::instrument(skip_all)]
  pub async fn insert(
    conn: &mut Connection,
    submission_id: SubmissionId,
    new: &NewAnswer,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "answers" (submission_id, question_id, artifact_uri, duration_seconds)
         VALUES ($1, $2, $3, $4)
         RETURNING *"#,
    )
    .bind(submission_id)
    .bind(new.question_id)
    .bind(&new.artifact_uri)
    .bind(new.duration_seconds)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn for_submission(conn: &mut Connection, submission_id: SubmissionId) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "answers" WHERE submission_id = $1 ORDER BY id"#)
      .bind(submission_id)
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  /// Attaches a review to an answer. A later review overwrites the
  /// score, comment and reviewer of an earlier one; role checks stay
  /// at the HTTP boundary.
  #[tracing::instrument(skip(conn, comment))]
  pub async fn set_review(
    conn: &mut Connection,
    id: AnswerId,
    score: i16,
    comment: Option<&str>,
    reviewed_by: UserId,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"UPDATE "answers"
         SET score = $2, review_comment = $3, reviewed_by = $4
         WHERE id = $1
         RETURNING *"#,
    )
    .bind(id)
    .bind(score)
    .bind(comment)
    .bind(reviewed_by)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_bound_edges() {
    assert!(score_in_bounds(0));
    assert!(score_in_bounds(50));
    assert!(score_in_bounds(100));
    assert!(!score_in_bounds(101));
    assert!(!score_in_bounds(150));
    assert!(!score_in_bounds(-1));
  }
}
