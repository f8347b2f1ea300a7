use serde::Deserialize;

use crate::schema::Role;
use crate::types::ValidateError;
use crate::util::validation;

fn is_manageable_role(role: Role) -> bool {
  // Admin provisioning only ever creates candidates and reviewers;
  // admins are not minted through this surface.
  matches!(role, Role::Candidate | Role::Reviewer)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
  pub name: String,
  pub email: String,
  pub password: String,
  pub role: Role,
}

impl CreateUserRequest {
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
    if !is_manageable_role(self.role) {
      errors.push("role", "must be candidate or reviewer");
    }
    errors.finish()
  }
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub role: Option<Role>,
}

impl UpdateUserRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if let Some(name) = self.name.as_deref() {
      if !validation::is_valid_name(name) {
        errors.push("name", "must be between 1 and 255 characters");
      }
    }
    if let Some(email) = self.email.as_deref() {
      if !validation::is_valid_email(email) {
        errors.push("email", "must be a valid email address");
      }
    }
    if let Some(password) = self.password.as_deref() {
      if !validation::is_valid_password(password) {
        errors.push("password", "must be between 6 and 128 characters");
      }
    }
    if let Some(role) = self.role {
      if !is_manageable_role(role) {
        errors.push("role", "must be candidate or reviewer");
      }
    }
    errors.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cannot_provision_admins() {
    let form = CreateUserRequest {
      name: "New Admin".into(),
      email: "admin2@example.com".into(),
      password: "long enough".into(),
      role: Role::Admin,
    };
    let error = form.validate().unwrap_err();
    assert_eq!(error.messages("role"), ["must be candidate or reviewer"]);
  }

  #[test]
  fn empty_update_is_valid() {
    let form = UpdateUserRequest {
      name: None,
      email: None,
      password: None,
      role: None,
    };
    assert!(form.validate().is_ok());
  }
}
