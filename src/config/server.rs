use error_stack::{Report, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

use super::ParseError;
use crate::util::figment::FigmentErrorAttachable;

#[derive(Debug, Deserialize)]
pub struct Server {
  pub db: super::Database,
  #[serde(default)]
  pub auth: super::Auth,
  #[serde(default)]
  pub storage: super::Storage,
  #[serde(default = "Server::default_ip")]
  pub ip: IpAddr,
  #[serde(default = "Server::default_port")]
  pub port: u16,
  /// HTTP worker threads; actix picks the CPU count when unset.
  pub workers: Option<usize>,
}

impl Server {
  pub fn load() -> Result<Self, ParseError> {
    dotenvy::dotenv().ok();

    let config = Self::figment()
      .extract::<Self>()
      .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

    Ok(config)
  }
}

impl Server {
  const DEFAULT_CONFIG_FILE: &'static str = "screenroom.yml";

  const fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
  }

  const fn default_port() -> u16 {
    3000
  }

  /// Creates the default [`figment::Figment`] used to load server
  /// configuration. Split out from [`Server::load`] for testing.
  pub(crate) fn figment() -> figment::Figment {
    use figment::{
      providers::{Env, Format, Yaml},
      Figment,
    };

    Figment::new()
      .merge(Yaml::file(Self::DEFAULT_CONFIG_FILE))
      // The env provider cannot tell a key underscore from a nesting
      // underscore, hence the explicit table.
      .merge(Env::prefixed("SCREENROOM_").map(|v| match v.as_str() {
        "DB_PRIMARY_URL" => "db.primary.url".into(),
        "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
        "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

        "DB_REPLICA_URL" => "db.replica.url".into(),
        "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
        "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

        "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
        "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

        "AUTH_SESSION_TTL_SECS" => "auth.session_ttl_secs".into(),
        "AUTH_OFFLINE_PASSWORD_RESET" => "auth.offline_password_reset".into(),

        "STORAGE_ROOT" => "storage.root".into(),
        "STORAGE_MAX_ARTIFACT_BYTES" => "storage.max_artifact_bytes".into(),

        _ => v.as_str().replace('_', ".").into(),
      }))
      // Environment variable aliases
      .merge(Env::raw().map(|v| match v.as_str() {
        "DATABASE_URL" => "db.primary.url".into(),
        _ => v.into(),
      }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use figment::Jail;
  use std::num::{NonZeroU32, NonZeroU64};

  #[test]
  fn env_aliases() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://primary");

      jail.set_env("SCREENROOM_DB_PRIMARY_MIN_IDLE", "100");
      jail.set_env("SCREENROOM_DB_PRIMARY_POOL_SIZE", "100");

      jail.set_env("SCREENROOM_DB_REPLICA_URL", "postgres://replica");
      jail.set_env("SCREENROOM_DB_REPLICA_MIN_IDLE", "589");
      jail.set_env("SCREENROOM_DB_REPLICA_POOL_SIZE", "589");

      jail.set_env("SCREENROOM_DB_ENFORCE_TLS", "false");
      jail.set_env("SCREENROOM_DB_TIMEOUT_SECS", "3030");

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.db.primary.url.as_str(), "postgres://primary");
      assert_eq!(
        config.db.primary.min_idle.unwrap(),
        NonZeroU32::new(100).unwrap()
      );
      assert_eq!(config.db.primary.pool_size, NonZeroU32::new(100).unwrap());

      let replica = config.db.replica.as_ref().unwrap();
      assert_eq!(replica.url.as_str(), "postgres://replica");
      assert_eq!(replica.min_idle.unwrap(), NonZeroU32::new(589).unwrap());
      assert_eq!(replica.pool_size, NonZeroU32::new(589).unwrap());

      assert_eq!(config.db.enforce_tls, false);
      assert_eq!(config.db.timeout_secs, NonZeroU64::new(3030).unwrap());

      Ok(())
    });
  }

  #[test]
  fn auth_and_storage_defaults() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://primary");

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.auth.session_ttl_secs, None);
      assert!(config.auth.offline_password_reset);
      assert_eq!(config.storage.root, std::path::PathBuf::from("artifacts"));
      assert_eq!(config.port, 3000);

      Ok(())
    });
  }

  #[test]
  fn auth_env_overrides() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://primary");
      jail.set_env("SCREENROOM_AUTH_SESSION_TTL_SECS", "86400");
      jail.set_env("SCREENROOM_AUTH_OFFLINE_PASSWORD_RESET", "false");

      let config: Server = Server::figment().extract()?;
      assert_eq!(
        config.auth.session_ttl_secs,
        Some(NonZeroU64::new(86400).unwrap())
      );
      assert!(!config.auth.offline_password_reset);

      Ok(())
    });
  }
}
