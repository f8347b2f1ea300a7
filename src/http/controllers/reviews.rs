use actix_web::{web, HttpResponse};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::{
  http::{Actor, Error},
  schema::{Answer, Role},
  types::{self, form::reviews::ReviewRequest, id::AnswerId},
  App,
};

/// Scores one answer. Re-reviewing is allowed and overwrites the
/// previous score, comment and reviewer.
#[tracing::instrument(skip_all, name = "v1.reviews.store")]
pub async fn review(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<AnswerId>,
  form: web::Json<ReviewRequest>,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, ThisError)]
  #[error("No answer with the requested id")]
  struct NoSuchAnswer;

  let reviewer = actor.require_role(&[Role::Reviewer, Role::Admin])?;
  let form = form.into_inner();
  form.validate()?;

  let mut conn = app.db_write().await?;
  let answer = Answer::set_review(&mut conn, *id, form.score, form.comment.as_deref(), reviewer.id)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchAnswer))?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "Answer reviewed successfully.",
    "answer": answer,
  })))
}
