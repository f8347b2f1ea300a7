use thiserror::Error;

mod auth;
mod database;
mod server;
mod storage;

pub use auth::Auth;
pub use database::{Database, DbPoolConfig};
pub use server::Server;
pub use storage::Storage;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
