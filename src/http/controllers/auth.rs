use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::{
  auth::token,
  database::ErrorExt2,
  http::{Actor, Error},
  schema::{PasswordReset, Role, Session, User},
  types::{
    self,
    form::auth::{
      ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, RegisterRequest,
      ResetPasswordRequest, SessionResponse,
    },
  },
  App,
};

/// Login and any identity lookup fail the same way, whether the email
/// is unknown or the password wrong.
#[derive(Debug, ThisError)]
#[error("Invalid credentials")]
struct InvalidCredentials;

/// Opens a fresh session for `user` and hands back the raw token. The
/// database only ever sees the digest.
async fn issue_session(app: &App, user: &User) -> Result<String, Error> {
  let raw_token = token::generate();
  let mut conn = app.db_write().await?;
  Session::insert(&mut conn, user.id, &token::digest(&raw_token)).await?;
  Ok(raw_token)
}

#[tracing::instrument(skip_all, name = "v1.auth.register")]
pub async fn register(
  app: web::Data<App>,
  form: web::Json<RegisterRequest>,
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  form.validate()?;

  let password_hash = super::hash_password(form.password).await?;
  let role = form.role.unwrap_or(Role::Candidate);

  let mut conn = app.db_write().await?;
  let user = User::insert(&mut conn, &form.name, &form.email, &password_hash, role)
    .await
    .map_err(|e| {
      if e.is_unique_violation() {
        Error::from_report(types::Error::Conflict, e)
      } else {
        e.into()
      }
    })?;
  drop(conn);

  let raw_token = issue_session(&app, &user).await?;
  Ok(HttpResponse::Created().json(SessionResponse {
    message: "User registered successfully.".into(),
    user,
    token: raw_token,
  }))
}

#[tracing::instrument(skip_all, name = "v1.auth.login")]
pub async fn login(
  app: web::Data<App>,
  form: web::Json<LoginRequest>,
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  form.validate()?;

  let mut conn = app.db_read_prefer_primary().await?;
  let user = User::by_email(&mut conn, &form.email)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::Unauthorized, InvalidCredentials))?;
  drop(conn);

  let verified = super::verify_password(form.password, user.password_hash.clone()).await?;
  if !verified {
    return Err(Error::from_context(
      types::Error::Unauthorized,
      InvalidCredentials,
    ));
  }

  let raw_token = issue_session(&app, &user).await?;
  Ok(HttpResponse::Ok().json(SessionResponse {
    message: "Logged in successfully.".into(),
    user,
    token: raw_token,
  }))
}

#[tracing::instrument(skip_all, name = "v1.auth.logout")]
pub async fn logout(
  app: web::Data<App>,
  actor: Actor,
  req: HttpRequest,
) -> Result<HttpResponse, Error> {
  actor.require_user()?;

  // require_user passed, so the header is present and well-formed.
  if let Some(raw_token) = req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
  {
    let mut conn = app.db_write().await?;
    Session::revoke(&mut conn, &token::digest(raw_token)).await?;
  }

  Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully." })))
}

#[tracing::instrument(skip_all, name = "v1.auth.me")]
pub async fn me(actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.require_user()?;
  Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip_all, name = "v1.auth.forgot_password")]
pub async fn forgot_password(
  app: web::Data<App>,
  form: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, ThisError)]
  #[error("No account behind the requested email")]
  struct NoSuchAccount;

  let form = form.into_inner();
  form.validate()?;

  let mut conn = app.db_read_prefer_primary().await?;
  let user = User::by_email(&mut conn, &form.email)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::NotFound, NoSuchAccount))?;
  drop(conn);

  let raw_token = token::generate();
  let mut conn = app.db_write().await?;
  PasswordReset::upsert(&mut conn, &user.email, &token::digest(&raw_token)).await?;
  drop(conn);

  if app.config.auth.offline_password_reset {
    Ok(HttpResponse::Ok().json(ForgotPasswordResponse {
      message: "Use this token to reset your password.".into(),
      token: Some(raw_token),
    }))
  } else {
    self::deliver_reset(&app, &user.email, raw_token).await?;
    Ok(HttpResponse::Ok().json(ForgotPasswordResponse {
      message: "A password reset token has been sent to your email.".into(),
      token: None,
    }))
  }
}

/// Delivery may talk to an external mailer, so it runs off the
/// async executor.
async fn deliver_reset(app: &App, email: &str, raw_token: String) -> Result<(), Error> {
  let notifier = app.reset_notifier.clone();
  let email = email.to_string();
  tokio::task::spawn_blocking(move || notifier.deliver(&email, &raw_token)).await?;
  Ok(())
}

#[tracing::instrument(skip_all, name = "v1.auth.reset_password")]
pub async fn reset_password(
  app: web::Data<App>,
  form: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, ThisError)]
  #[error("No pending reset request for the given email")]
  struct NoResetRequest;

  #[derive(Debug, ThisError)]
  #[error("Reset token does not match the pending request")]
  struct TokenMismatch;

  #[derive(Debug, ThisError)]
  #[error("Reset request fell outside its validity window")]
  struct WindowElapsed;

  let form = form.into_inner();
  form.validate()?;

  let mut conn = app.db_write().await?;
  let pending = PasswordReset::by_email(&mut conn, &form.email)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::TokenMismatch, NoResetRequest))?;

  // Expiry is decided before the token is even compared, so an
  // attacker holding a stale token learns nothing from the response.
  // Both timestamps come from the database clock.
  if pending.request.is_expired(pending.fetched_at) {
    PasswordReset::delete(&mut conn, &form.email).await?;
    return Err(Error::from_context(types::Error::ExpiredToken, WindowElapsed));
  }

  if !token::matches(&form.token, &pending.request.token_hash) {
    return Err(Error::from_context(types::Error::TokenMismatch, TokenMismatch));
  }

  let user = User::by_email(&mut conn, &form.email)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::Unauthorized, InvalidCredentials))?;
  drop(conn);

  let password_hash = super::hash_password(form.password).await?;

  let mut conn = app.db_write().await?;
  let user = User::update_password(&mut conn, user.id, &password_hash)
    .await?
    .ok_or_else(|| Error::from_context(types::Error::Unauthorized, InvalidCredentials))?;

  PasswordReset::delete(&mut conn, &form.email).await?;
  drop(conn);

  let raw_token = issue_session(&app, &user).await?;
  Ok(HttpResponse::Ok().json(SessionResponse {
    message: "Password has been reset.".into(),
    user,
    token: raw_token,
  }))
}
