use actix_web::web;

use crate::{auth::password, types};

use super::Error;

pub mod auth;
pub mod interviews;
pub mod reviews;
pub mod submissions;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      // public
      .route("/register", web::post().to(auth::register))
      .route("/login", web::post().to(auth::login))
      .route("/forgot-password", web::post().to(auth::forgot_password))
      .route("/reset-password", web::post().to(auth::reset_password))
      // any authenticated identity
      .route("/logout", web::post().to(auth::logout))
      .route("/me", web::get().to(auth::me))
      // admin
      .route("/interviews", web::post().to(interviews::store))
      .route("/interviews", web::get().to(interviews::index))
      .route("/interviews/{id}", web::get().to(interviews::show))
      .route("/interviews/{id}", web::put().to(interviews::update))
      .route("/interviews/{id}", web::delete().to(interviews::destroy))
      .route("/interviews/{id}/assign", web::post().to(interviews::assign))
      .route(
        "/admin/assigned-interviews",
        web::get().to(interviews::assigned_admin),
      )
      .route("/candidates", web::get().to(users::candidates))
      .route("/users", web::get().to(users::index))
      .route("/users", web::post().to(users::store))
      .route("/users/{id}", web::put().to(users::update))
      .route("/users/{id}", web::delete().to(users::destroy))
      // reviewer / admin
      .route(
        "/interviews/{id}/submissions",
        web::get().to(submissions::index),
      )
      .route("/answers/{id}/review", web::post().to(reviews::review))
      // candidate
      .route("/submissions", web::post().to(submissions::store))
      .route(
        "/candidate/interviews",
        web::get().to(submissions::candidate_interviews),
      )
      .route(
        "/candidate/submission/{interview_id}",
        web::get().to(submissions::my_submission),
      )
      .route(
        "/candidate/submit/{interview_id}",
        web::post().to(submissions::candidate_submit),
      ),
  );
}

/// Argon2 work happens off the async executor.
pub(crate) async fn hash_password(raw: String) -> Result<String, Error> {
  tokio::task::spawn_blocking(move || password::hash(raw))
    .await?
    .map_err(|r| Error::from_report(types::Error::Internal, r))
}

pub(crate) async fn verify_password(raw: String, hash: String) -> Result<bool, Error> {
  tokio::task::spawn_blocking(move || password::verify(raw.as_bytes(), &hash))
    .await?
    .map_err(|r| Error::from_report(types::Error::Internal, r))
}
