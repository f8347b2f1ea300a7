use actix_web::{web, HttpServer};
use error_stack::{Result, ResultExt};
use thiserror::Error as ThisError;
use tracing_actix_web::TracingLogger;

use crate::{config, App};

mod actor;
mod error;

pub mod controllers;

pub use actor::Actor;
pub use error::Error;

#[derive(Debug, ThisError)]
#[error("Failed to run HTTP service")]
pub struct ServeError;

/// Boots the application and serves it until the process is told to
/// stop. Pending migrations run before the first request is accepted.
pub async fn serve(cfg: config::Server) -> Result<(), ServeError> {
  let app = App::new(cfg).await.change_context(ServeError)?;
  app
    .primary_db
    .run_migrations()
    .await
    .change_context(ServeError)?;

  let config = app.config.clone();
  let data = web::Data::new(app);

  tracing::info!(ip = %config.ip, port = config.port, "serving HTTP requests");

  // Submission bodies carry base64 artifacts, so the JSON extractor
  // must be allowed more than its default couple of megabytes.
  let json_limit = config.storage.json_body_limit();

  let mut server = HttpServer::new(move || {
    actix_web::App::new()
      .wrap(TracingLogger::default())
      .app_data(web::JsonConfig::default().limit(json_limit))
      .app_data(data.clone())
      .configure(controllers::configure)
  })
  .bind((config.ip, config.port))
  .change_context(ServeError)
  .attach_printable_lazy(|| format!("could not bind to {}:{}", config.ip, config.port))?;

  if let Some(workers) = config.workers {
    server = server.workers(workers);
  }

  server.run().await.change_context(ServeError)
}
