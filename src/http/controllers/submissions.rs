use actix_web::{web, HttpResponse};
use base64::Engine;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::{
  database::{self, ErrorExt2},
  http::{Actor, Error},
  schema::{
    assignment::Assignment,
    submission::{NewAnswer, Submission},
    Answer, Interview, Question, Role, User,
  },
  storage::ArtifactStore,
  types::{
    self,
    form::submissions::{AnswerUpload, CandidateSubmitRequest, SubmitRequest},
    id::{InterviewId, QuestionId, UserId},
    ValidateError,
  },
  App,
};

#[derive(Debug, ThisError)]
#[error("No live interview with the requested id")]
struct NoSuchInterview;

#[derive(Debug, ThisError)]
#[error("Candidate already submitted for this interview")]
struct AlreadySubmitted;

/// Generic submit: the interview id travels in the body.
#[tracing::instrument(skip_all, name = "v1.submissions.store")]
pub async fn store(
  app: web::Data<App>,
  actor: Actor,
  form: web::Json<SubmitRequest>,
) -> Result<HttpResponse, Error> {
  let user = actor.require_user()?;
  let form = form.into_inner();
  form.validate()?;

  perform_submit(&app, user, form.interview_id, form.answers).await
}

/// Candidate-scoped submit with the interview id in the path.
#[tracing::instrument(skip_all, name = "v1.submissions.candidate_store")]
pub async fn candidate_submit(
  app: web::Data<App>,
  actor: Actor,
  interview_id: web::Path<InterviewId>,
  form: web::Json<CandidateSubmitRequest>,
) -> Result<HttpResponse, Error> {
  let user = actor.require_role(&[Role::Candidate])?;
  let form = form.into_inner();
  form.validate()?;

  perform_submit(&app, user, *interview_id, form.answers).await
}

/// A submission is all-or-nothing: every question must be answered,
/// the row pair must be new, and a failure at any point rolls the
/// database back and discards whatever artifacts already landed.
async fn perform_submit(
  app: &App,
  user: User,
  interview_id: InterviewId,
  uploads: Vec<AnswerUpload>,
) -> Result<HttpResponse, Error> {
  let mut conn = app.db_read_prefer_primary().await?;
  let view = Interview::with_questions(&mut conn, interview_id)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchInterview))?;

  // Cheap pre-check for a friendlier error; the unique index is what
  // actually guards against the race.
  if Submission::exists(&mut conn, interview_id, user.id).await? {
    return Err(Error::from_context(types::Error::Conflict, AlreadySubmitted));
  }
  drop(conn);

  let inputs = decode_uploads(&view.questions, uploads)?;

  // Artifacts land on disk first; database rows only ever point at
  // bytes that exist.
  let store = app.artifacts.clone();
  let owner = user.id;
  let answers = tokio::task::spawn_blocking(move || store_artifacts(&store, owner, interview_id, inputs))
    .await??;

  let mut tx = match app.primary_db.begin().await {
    Ok(tx) => tx,
    Err(e) => {
      discard_artifacts(app, &answers).await;
      return Err(e.into());
    }
  };

  let submission = match Submission::insert(&mut *tx, interview_id, user.id).await {
    Ok(submission) => submission,
    Err(e) => {
      discard_artifacts(app, &answers).await;
      return Err(if e.is_unique_violation() {
        Error::from_report(types::Error::Conflict, e)
      } else {
        e.into()
      });
    }
  };

  let mut rows = Vec::with_capacity(answers.len());
  for answer in &answers {
    match Answer::insert(&mut *tx, submission.id, answer).await {
      Ok(row) => rows.push(row),
      Err(e) => {
        discard_artifacts(app, &answers).await;
        return Err(e.into());
      }
    }
  }

  if let Err(e) = tx.commit().await {
    discard_artifacts(app, &answers).await;
    return Err(error_stack::Report::new(database::Error::Internal(e)).into());
  }

  Ok(HttpResponse::Created().json(json!({
    "message": "Answers submitted successfully.",
    "submission": submission,
    "answers": rows,
  })))
}

/// Decodes the uploads and pairs them with the interview's questions.
/// Every question needs exactly one answer and every answer must name
/// a question of this interview.
fn decode_uploads(
  questions: &[Question],
  uploads: Vec<AnswerUpload>,
) -> Result<Vec<DecodedAnswer>, Error> {
  let question_ids: HashSet<_> = questions.iter().map(|q| q.id).collect();
  let mut errors = ValidateError::builder();
  let mut seen = HashSet::new();
  let mut decoded = Vec::with_capacity(uploads.len());

  for (index, upload) in uploads.into_iter().enumerate() {
    if !question_ids.contains(&upload.question_id) {
      errors.push(
        format!("answers.{index}.question_id"),
        "does not belong to this interview",
      );
      continue;
    }
    if !seen.insert(upload.question_id) {
      errors.push(
        format!("answers.{index}.question_id"),
        "answered more than once",
      );
      continue;
    }
    match base64::engine::general_purpose::STANDARD.decode(&upload.data) {
      Ok(bytes) => decoded.push(DecodedAnswer {
        question_id: upload.question_id,
        bytes,
        duration_seconds: upload.duration_seconds,
      }),
      Err(..) => errors.push(format!("answers.{index}.data"), "must be valid base64"),
    }
  }

  for question in questions {
    if !seen.contains(&question.id) {
      errors.push(
        format!("answers.{}", question.id),
        "missing artifact for this question",
      );
    }
  }

  errors.finish()?;
  Ok(decoded)
}

#[derive(Debug)]
struct DecodedAnswer {
  question_id: QuestionId,
  bytes: Vec<u8>,
  duration_seconds: Option<i32>,
}

/// Stores every artifact, undoing the ones already written if a later
/// one fails.
fn store_artifacts(
  store: &Arc<dyn ArtifactStore>,
  owner: UserId,
  interview_id: InterviewId,
  inputs: Vec<DecodedAnswer>,
) -> Result<Vec<NewAnswer>, Error> {
  let mut stored = Vec::with_capacity(inputs.len());
  for input in inputs {
    match store.store(owner, interview_id, input.question_id, &input.bytes) {
      Ok(artifact_uri) => stored.push(NewAnswer {
        question_id: input.question_id,
        artifact_uri,
        duration_seconds: input.duration_seconds,
      }),
      Err(e) => {
        for answer in &stored {
          if let Err(e) = store.remove(&answer.artifact_uri) {
            tracing::warn!(error = ?e, "failed to discard a partially stored artifact");
          }
        }
        return Err(e.into());
      }
    }
  }
  Ok(stored)
}

/// Best-effort cleanup after the database half of a submission failed.
async fn discard_artifacts(app: &App, answers: &[NewAnswer]) {
  let store = app.artifacts.clone();
  let uris: Vec<String> = answers.iter().map(|a| a.artifact_uri.clone()).collect();
  let outcome = tokio::task::spawn_blocking(move || {
    for uri in &uris {
      if let Err(e) = store.remove(uri) {
        tracing::warn!(error = ?e, uri = %uri, "failed to discard an orphaned artifact");
      }
    }
  })
  .await;

  if let Err(e) = outcome {
    tracing::warn!(error = ?e, "artifact cleanup task failed");
  }
}

/// Reviewer/admin listing of everything submitted for an interview.
#[tracing::instrument(skip_all, name = "v1.submissions.index")]
pub async fn index(
  app: web::Data<App>,
  actor: Actor,
  interview_id: web::Path<InterviewId>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Reviewer, Role::Admin])?;

  let mut conn = app.db_read().await?;
  Interview::by_id(&mut conn, *interview_id)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchInterview))?;

  let views = Submission::views_for_interview(&mut conn, *interview_id).await?;
  Ok(HttpResponse::Ok().json(views))
}

/// The candidate's own submission for one interview, reviews included.
#[tracing::instrument(skip_all, name = "v1.submissions.mine")]
pub async fn my_submission(
  app: web::Data<App>,
  actor: Actor,
  interview_id: web::Path<InterviewId>,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, ThisError)]
  #[error("Candidate has not submitted for this interview")]
  struct NotSubmitted;

  let user = actor.require_role(&[Role::Candidate])?;

  let mut conn = app.db_read().await?;
  let submission = Submission::for_candidate(&mut conn, *interview_id, user.id)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NotSubmitted))?;

  let answers = Answer::for_submission(&mut conn, submission.id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "submission": submission,
    "answers": answers,
  })))
}

/// Interviews assigned to the calling candidate.
#[tracing::instrument(skip_all, name = "v1.submissions.assigned")]
pub async fn candidate_interviews(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.require_role(&[Role::Candidate])?;

  let mut conn = app.db_read().await?;
  let interviews = Assignment::interviews_for(&mut conn, user.id).await?;
  Ok(HttpResponse::Ok().json(interviews))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn question(id: i64) -> Question {
    Question {
      id: QuestionId(id),
      interview_id: InterviewId(1),
      text: format!("Question {id}"),
      position: id as i32,
      max_seconds: None,
    }
  }

  fn upload(question_id: i64, data: &str) -> AnswerUpload {
    AnswerUpload {
      question_id: QuestionId(question_id),
      data: data.into(),
      duration_seconds: Some(30),
    }
  }

  #[test]
  fn decodes_a_complete_set_of_answers() {
    let questions = [question(1), question(2)];
    let decoded = decode_uploads(
      &questions,
      vec![upload(1, "aGVsbG8="), upload(2, "d29ybGQ=")],
    )
    .unwrap();

    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].bytes, b"hello");
    assert_eq!(decoded[1].bytes, b"world");
  }

  #[test]
  fn every_question_must_be_answered() {
    let questions = [question(1), question(2)];
    let error = decode_uploads(&questions, vec![upload(1, "aGVsbG8=")]).unwrap_err();

    let types::Error::InvalidFormBody(fields) = error.as_type() else {
      panic!("expected a form body error, got {:?}", error.as_type());
    };
    assert_eq!(
      fields.messages("answers.2"),
      ["missing artifact for this question"]
    );
  }

  #[test]
  fn foreign_question_ids_are_rejected() {
    let questions = [question(1)];
    let error =
      decode_uploads(&questions, vec![upload(1, "aGVsbG8="), upload(9, "aGVsbG8=")]).unwrap_err();

    let types::Error::InvalidFormBody(fields) = error.as_type() else {
      panic!("expected a form body error, got {:?}", error.as_type());
    };
    assert_eq!(fields.messages("answers.1.question_id").len(), 1);
  }

  #[test]
  fn double_answers_are_rejected() {
    let questions = [question(1)];
    let error =
      decode_uploads(&questions, vec![upload(1, "aGVsbG8="), upload(1, "aGVsbG8=")]).unwrap_err();

    let types::Error::InvalidFormBody(fields) = error.as_type() else {
      panic!("expected a form body error, got {:?}", error.as_type());
    };
    assert_eq!(fields.messages("answers.1.question_id"), ["answered more than once"]);
  }

  #[test]
  fn malformed_base64_is_rejected() {
    let questions = [question(1)];
    let error = decode_uploads(&questions, vec![upload(1, "%%%")]).unwrap_err();

    let types::Error::InvalidFormBody(fields) = error.as_type() else {
      panic!("expected a form body error, got {:?}", error.as_type());
    };
    assert_eq!(fields.messages("answers.0.data"), ["must be valid base64"]);
  }
}
