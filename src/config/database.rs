use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64};

#[derive(Debug, Deserialize)]
pub struct Database {
  /// Writable primary database.
  pub primary: DbPoolConfig,
  /// A read-only replica used for queries that tolerate going
  /// through a secondary, with fallback to the primary.
  pub replica: Option<DbPoolConfig>,
  /// Forces all database connections to be encrypted with TLS
  /// (if possible).
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_DB_ENFORCE_TLS`
  #[serde(default = "DbPoolConfig::default_enforce_tls")]
  pub enforce_tls: bool,
  /// How long the server waits for a database connection to be
  /// acknowledged or successfully established.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_DB_TIMEOUT_SECS`
  #[serde(default = "DbPoolConfig::default_pool_timeout_secs")]
  pub timeout_secs: NonZeroU64,
}

/// Configuration for connecting to any Postgres database.
#[derive(Debug, Deserialize)]
pub struct DbPoolConfig {
  /// Minimum idle database connections kept around so bursts do
  /// not pay the connection setup cost.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_DB_PRIMARY_MIN_IDLE`
  /// - `SCREENROOM_DB_REPLICA_MIN_IDLE`
  pub min_idle: Option<NonZeroU32>,
  /// Maximum amount of connections the pool may hold.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_DB_PRIMARY_POOL_SIZE`
  /// - `SCREENROOM_DB_REPLICA_POOL_SIZE`
  #[serde(default = "DbPoolConfig::default_pool_size")]
  pub pool_size: NonZeroU32,
  /// Connection URL for the Postgres database.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_DB_PRIMARY_URL` or `DATABASE_URL`
  /// - `SCREENROOM_DB_REPLICA_URL`
  pub url: String,
}

impl DbPoolConfig {
  const DEFAULT_POOL_SIZE: u32 = 5;
  const DEFAULT_POOL_TIMEOUT_SECS: u64 = 5;

  // Required by serde
  const fn default_pool_size() -> NonZeroU32 {
    match NonZeroU32::new(Self::DEFAULT_POOL_SIZE) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_SIZE is accidentally set to 0"),
    }
  }

  const fn default_pool_timeout_secs() -> NonZeroU64 {
    match NonZeroU64::new(Self::DEFAULT_POOL_TIMEOUT_SECS) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_TIMEOUT_SECS is accidentally set to 0"),
    }
  }

  const fn default_enforce_tls() -> bool {
    true
  }
}
