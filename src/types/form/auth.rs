use serde::{Deserialize, Serialize};

use crate::schema::{Role, User};
use crate::types::ValidateError;
use crate::util::validation;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
  pub name: String,
  pub email: String,
  pub password: String,
  /// Defaults to candidate when unspecified.
  pub role: Option<Role>,
}

impl RegisterRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !validation::is_valid_name(&self.name) {
      errors.push("name", "must be between 1 and 255 characters");
    }
    if !validation::is_valid_email(&self.email) {
      errors.push("email", "must be a valid email address");
    }
    if !validation::is_valid_password(&self.password) {
      errors.push("password", "must be between 6 and 128 characters");
    }
    errors.finish()
  }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

impl LoginRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !validation::is_valid_email(&self.email) {
      errors.push("email", "must be a valid email address");
    }
    if self.password.is_empty() {
      errors.push("password", "is required");
    }
    errors.finish()
  }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
  pub email: String,
}

impl ForgotPasswordRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !validation::is_valid_email(&self.email) {
      errors.push("email", "must be a valid email address");
    }
    errors.finish()
  }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
  pub email: String,
  pub token: String,
  pub password: String,
}

impl ResetPasswordRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !validation::is_valid_email(&self.email) {
      errors.push("email", "must be a valid email address");
    }
    if self.token.is_empty() {
      errors.push("token", "is required");
    }
    if !validation::is_valid_password(&self.password) {
      errors.push("password", "must be between 6 and 128 characters");
    }
    errors.finish()
  }
}

/// Login, registration and successful password recovery all answer
/// with the same shape: the user and a fresh bearer token.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
  pub message: String,
  pub user: User,
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
  pub message: String,
  /// Present only in offline reset mode.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn register_rejects_short_password() {
    let form = RegisterRequest {
      name: "Ada".into(),
      email: "ada@example.com".into(),
      password: "short".into(),
      role: None,
    };
    let error = form.validate().unwrap_err();
    assert_eq!(error.messages("password").len(), 1);
  }

  #[test]
  fn register_accepts_valid_input() {
    let form = RegisterRequest {
      name: "Ada".into(),
      email: "ada@example.com".into(),
      password: "long enough".into(),
      role: Some(Role::Reviewer),
    };
    assert!(form.validate().is_ok());
  }

  #[test]
  fn login_requires_well_formed_email() {
    let form = LoginRequest {
      email: "not-an-email".into(),
      password: "whatever".into(),
    };
    assert!(form.validate().is_err());
  }
}
