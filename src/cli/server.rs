use error_stack::{Result, ResultExt};
use thiserror::Error;

use screenroom::{config, http};

#[derive(Debug, Error)]
#[error("Failed to start the server")]
pub struct StartError;

pub fn run() -> Result<(), StartError> {
  init_tracing();

  let cfg = config::Server::load().change_context(StartError)?;

  tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .change_context(StartError)?
    .block_on(http::serve(cfg))
    .change_context(StartError)
}

fn init_tracing() {
  use tracing_error::ErrorLayer;
  use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(ErrorLayer::default())
    .with(tracing_subscriber::fmt::layer())
    .init();
}
