use serde::Deserialize;
use std::num::NonZeroU64;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Auth {
  /// Optional lifetime for issued session tokens in seconds.
  ///
  /// Sessions are valid until explicitly revoked by default; setting
  /// this makes `resolve` treat older sessions as absent.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_AUTH_SESSION_TTL_SECS`
  pub session_ttl_secs: Option<NonZeroU64>,
  /// Offline password reset mode returns the raw reset token in the
  /// response body instead of handing it to a notifier. Meant for
  /// deployments without outbound email.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_AUTH_OFFLINE_PASSWORD_RESET`
  pub offline_password_reset: bool,
}

impl Default for Auth {
  fn default() -> Self {
    Self {
      session_ttl_secs: None,
      offline_password_reset: true,
    }
  }
}
