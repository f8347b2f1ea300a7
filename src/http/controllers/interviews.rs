use actix_web::{web, HttpResponse};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::{
  database::ErrorExt,
  http::{Actor, Error},
  schema::{assignment::Assignment, Interview, Role},
  types::{
    self,
    form::interviews::{AssignRequest, CreateInterviewRequest, UpdateInterviewRequest},
    id::InterviewId,
    ValidateError,
  },
  App,
};

#[derive(Debug, ThisError)]
#[error("No live interview with the requested id")]
struct NoSuchInterview;

#[tracing::instrument(skip_all, name = "v1.interviews.store")]
pub async fn store(
  app: web::Data<App>,
  actor: Actor,
  form: web::Json<CreateInterviewRequest>,
) -> Result<HttpResponse, Error> {
  let admin = actor.require_role(&[Role::Admin])?;
  let form = form.into_inner();
  form.validate()?;

  let questions = form.to_questions();
  let mut tx = app.primary_db.begin().await?;
  let view = Interview::create(
    &mut *tx,
    &form.title,
    form.description.as_deref().unwrap_or(""),
    admin.id,
    &questions,
  )
  .await?;
  tx.commit().await.into_db_error()?;

  Ok(HttpResponse::Created().json(json!({
    "message": "Interview created successfully.",
    "interview": view,
  })))
}

#[tracing::instrument(skip_all, name = "v1.interviews.index")]
pub async fn index(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_read().await?;
  let interviews = Interview::list_with_questions(&mut conn).await?;
  Ok(HttpResponse::Ok().json(interviews))
}

#[tracing::instrument(skip_all, name = "v1.interviews.show")]
pub async fn show(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<InterviewId>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_read().await?;
  let view = Interview::with_questions(&mut conn, *id)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchInterview))?;

  Ok(HttpResponse::Ok().json(view))
}

#[tracing::instrument(skip_all, name = "v1.interviews.update")]
pub async fn update(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<InterviewId>,
  form: web::Json<UpdateInterviewRequest>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;
  let form = form.into_inner();
  form.validate()?;

  let mut conn = app.db_write().await?;
  let interview = Interview::update(&mut conn, *id, &form.title, form.description.as_deref())
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchInterview))?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "Interview updated successfully.",
    "interview": interview,
  })))
}

#[tracing::instrument(skip_all, name = "v1.interviews.destroy")]
pub async fn destroy(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<InterviewId>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_write().await?;
  if !Interview::soft_delete(&mut conn, *id).await? {
    return Err(Error::from_context(types::Error::NotFound, NoSuchInterview));
  }

  Ok(HttpResponse::Ok().json(json!({ "message": "Interview deleted successfully." })))
}

#[tracing::instrument(skip_all, name = "v1.interviews.assign")]
pub async fn assign(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<InterviewId>,
  form: web::Json<AssignRequest>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;
  let form = form.into_inner();
  form.validate()?;

  let mut user_ids = form.user_ids;
  user_ids.sort_unstable();
  user_ids.dedup();

  let mut conn = app.db_write().await?;
  Interview::by_id(&mut conn, *id)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchInterview))?;

  // The whole batch is rejected if any id is unknown, so a typo never
  // silently assigns only half the list.
  let known = Assignment::count_known_users(&mut conn, &user_ids).await?;
  if known != user_ids.len() as i64 {
    return Err(ValidateError::single("user_ids", "contains unknown users").into());
  }

  Assignment::assign(&mut conn, *id, &user_ids).await?;
  let candidates = Assignment::candidates_for(&mut conn, *id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "Candidates assigned successfully.",
    "candidates": candidates,
  })))
}

#[tracing::instrument(skip_all, name = "v1.interviews.assigned")]
pub async fn assigned_admin(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_read().await?;
  let overview = Assignment::overview(&mut conn).await?;
  Ok(HttpResponse::Ok().json(overview))
}
