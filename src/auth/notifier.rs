/// Delivery hook for mailed-mode password resets.
///
/// The engine hands the raw reset token here and answers the client
/// with a generic message; how the token actually reaches the user
/// (email, SMS, carrier pigeon) is up to the implementation.
pub trait ResetNotifier: Send + Sync {
  fn deliver(&self, email: &str, raw_token: &str);
}

/// Default notifier that only records that a reset was requested.
/// It deliberately never logs the token itself.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl ResetNotifier for LogNotifier {
  fn deliver(&self, email: &str, _raw_token: &str) {
    tracing::info!(email = %email, "password reset token generated, no delivery channel configured");
  }
}
