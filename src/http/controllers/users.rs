use actix_web::{web, HttpResponse};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::{
  database::ErrorExt2,
  http::{Actor, Error},
  schema::{Role, UpdateUser, User},
  types::{
    self,
    form::users::{CreateUserRequest, UpdateUserRequest},
    id::UserId,
  },
  App,
};

#[derive(Debug, ThisError)]
#[error("No live user with the requested id")]
struct NoSuchUser;

#[tracing::instrument(skip_all, name = "v1.users.index")]
pub async fn index(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_read().await?;
  let users = User::list_managed(&mut conn).await?;
  Ok(HttpResponse::Ok().json(users))
}

#[tracing::instrument(skip_all, name = "v1.users.candidates")]
pub async fn candidates(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_read().await?;
  let candidates = User::list_candidates(&mut conn).await?;
  Ok(HttpResponse::Ok().json(candidates))
}

#[tracing::instrument(skip_all, name = "v1.users.store")]
pub async fn store(
  app: web::Data<App>,
  actor: Actor,
  form: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;
  let form = form.into_inner();
  form.validate()?;

  let password_hash = super::hash_password(form.password).await?;

  let mut conn = app.db_write().await?;
  let user = User::insert(&mut conn, &form.name, &form.email, &password_hash, form.role)
    .await
    .map_err(|e| {
      if e.is_unique_violation() {
        Error::from_report(types::Error::Conflict, e)
      } else {
        e.into()
      }
    })?;

  Ok(HttpResponse::Created().json(json!({
    "message": "User created successfully.",
    "user": user,
  })))
}

#[tracing::instrument(skip_all, name = "v1.users.update")]
pub async fn update(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<UserId>,
  form: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;
  let form = form.into_inner();
  form.validate()?;

  let password_hash = match form.password {
    Some(password) => Some(super::hash_password(password).await?),
    None => None,
  };

  let fields = UpdateUser {
    name: form.name,
    email: form.email,
    password_hash,
    role: form.role,
  };

  let mut conn = app.db_write().await?;
  let user = User::update(&mut conn, *id, fields)
    .await
    .map_err(|e| {
      if e.is_unique_violation() {
        Error::from_report(types::Error::Conflict, e)
      } else {
        e.into()
      }
    })?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchUser))?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "User updated successfully.",
    "user": user,
  })))
}

#[tracing::instrument(skip_all, name = "v1.users.destroy")]
pub async fn destroy(
  app: web::Data<App>,
  actor: Actor,
  id: web::Path<UserId>,
) -> Result<HttpResponse, Error> {
  actor.require_role(&[Role::Admin])?;

  let mut conn = app.db_write().await?;
  if !User::soft_delete(&mut conn, *id).await? {
    return Err(Error::from_context(types::Error::NotFound, NoSuchUser));
  }

  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully." })))
}
