use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::ValidateError;

/// Client-visible error taxonomy.
///
/// Every variant maps to a terminal, user-visible outcome with its own
/// HTTP status (see `http::error`); none of them are fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
  Internal,
  NotFound,
  Unauthorized,
  Forbidden,
  /// Duplicate email at registration or a second submission for the
  /// same (interview, candidate) pair.
  Conflict,
  /// Password reset token past its 60 minute window.
  ExpiredToken,
  /// Password reset token does not match the stored record.
  TokenMismatch,
  InvalidFormBody(ValidateError),
  /// The artifact store failed while persisting an upload.
  Storage,
  ReadonlyMode,
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::Internal => f.write_str("Failed to perform request"),
      Error::NotFound => f.write_str("Requested resource not found"),
      Error::Unauthorized => f.write_str("Authentication required"),
      Error::Forbidden => f.write_str("Insufficient role"),
      Error::Conflict => f.write_str("Resource already exists"),
      Error::ExpiredToken => f.write_str("Token expired. Please request a new one."),
      Error::TokenMismatch => f.write_str("Invalid token"),
      Error::InvalidFormBody(..) => f.write_str("User performed request with invalid body"),
      Error::Storage => f.write_str("Failed to persist uploaded artifact"),
      Error::ReadonlyMode => f.write_str("Attempt to write read-only database"),
    }
  }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_test::Token;

  #[track_caller]
  fn assert_unit_variant(value: Error, variant: &'static str) {
    serde_test::assert_tokens(
      &value,
      &[
        Token::Struct {
          name: "Error",
          len: 1,
        },
        Token::Str("type"),
        Token::Str(variant),
        Token::StructEnd,
      ],
    );
  }

  #[test]
  fn test_serde_impl() {
    assert_unit_variant(Error::Internal, "internal");
    assert_unit_variant(Error::NotFound, "not_found");
    assert_unit_variant(Error::Unauthorized, "unauthorized");
    assert_unit_variant(Error::Forbidden, "forbidden");
    assert_unit_variant(Error::Conflict, "conflict");
    assert_unit_variant(Error::ExpiredToken, "expired_token");
    assert_unit_variant(Error::TokenMismatch, "token_mismatch");
    assert_unit_variant(Error::Storage, "storage");
    assert_unit_variant(Error::ReadonlyMode, "readonly_mode");
  }

  #[test]
  fn test_form_body_serde_impl() {
    let value = Error::InvalidFormBody(ValidateError::single("email", "is already taken"));
    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "type": "invalid_form_body",
        "email": ["is already taken"],
      })
    );
  }
}
