use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::{
  auth::notifier::{LogNotifier, ResetNotifier},
  config,
  database::{self, ErrorExt2},
  storage::{ArtifactStore, FsStore},
};

#[derive(Clone)]
pub struct App {
  pub config: Arc<config::Server>,
  pub primary_db: database::Pool,
  pub replica_db: Option<database::Pool>,
  pub artifacts: Arc<dyn ArtifactStore>,
  pub reset_notifier: Arc<dyn ResetNotifier>,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
  #[tracing::instrument(skip(cfg))]
  pub async fn new(cfg: config::Server) -> Result<Self, AppError> {
    let primary_db = database::Pool::new(&cfg.db, &cfg.db.primary)
      .await
      .change_context(AppError)?;

    let replica_db = if let Some(replica) = cfg.db.replica.as_ref() {
      Some(
        database::Pool::new(&cfg.db, replica)
          .await
          .change_context(AppError)?,
      )
    } else {
      None
    };

    let artifacts = Arc::new(FsStore::new(&cfg.storage));
    let app = Self {
      config: Arc::new(cfg),
      primary_db,
      replica_db,
      artifacts,
      reset_notifier: Arc::new(LogNotifier),
    };

    Ok(app)
  }
}

impl std::fmt::Debug for App {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("App")
      .field("config", &self.config)
      .field("primary_db", &self.primary_db)
      .field("replica_db", &self.replica_db)
      .finish_non_exhaustive()
  }
}

impl App {
  #[tracing::instrument(skip_all)]
  pub async fn db_write(&self) -> Result<database::PoolConnection, database::Error> {
    Ok(self.primary_db.get().await?)
  }

  #[tracing::instrument(skip_all)]
  pub async fn db_read(&self) -> Result<database::PoolConnection, database::Error> {
    if let Some(replica) = self.replica_db.as_ref() {
      match replica.get().await {
        Ok(conn) => return Ok(conn),
        // fallback
        Err(err) if err.is_unhealthy() => {}
        Err(err) => return Err(err),
      }
    }
    self.primary_db.get().await
  }

  /// Reads that must observe the latest write (authorization, role
  /// checks, token resolution) go here instead of [`App::db_read`].
  #[tracing::instrument(skip_all)]
  pub async fn db_read_prefer_primary(&self) -> Result<database::PoolConnection, database::Error> {
    match (self.primary_db.get().await, self.replica_db.as_ref()) {
      (Ok(conn), ..) => Ok(conn),
      (Err(e), Some(readonly_replica)) if e.is_unhealthy() => Ok(readonly_replica.get().await?),
      (Err(e), ..) => Err(e),
    }
  }
}
