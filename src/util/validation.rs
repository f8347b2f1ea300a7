use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
    .expect("compile email regex")
});

const EMAIL_MAX: usize = 254;
const NAME_MAX: usize = 255;

const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 128;

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_REGEX.is_match(email) && email.len() <= EMAIL_MAX
}

/// Canonical form for email keys. Addresses compare and store
/// case-insensitively, so everything keyed by email must go through
/// this before it touches the database.
#[must_use]
pub fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

pub fn is_valid_password(pass: &str) -> bool {
  (PASSWORD_MIN..=PASSWORD_MAX).contains(&pass.len())
}

pub fn is_valid_name(name: &str) -> bool {
  let trimmed = name.trim();
  !trimmed.is_empty() && trimmed.len() <= NAME_MAX
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_valid_email() {
    assert!(is_valid_email("gush@gmail.com"));
    assert!(is_valid_email("first.last@sub.example.org"));
    assert!(!is_valid_email("nada_neutho"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("someone@"));
  }

  #[test]
  fn test_normalize_email() {
    assert_eq!(normalize_email("ADA@Example.COM"), "ada@example.com");
    assert_eq!(normalize_email("  ada@example.com "), "ada@example.com");
    assert_eq!(normalize_email("ada@example.com"), "ada@example.com");
  }

  #[test]
  fn test_is_valid_password() {
    assert!(is_valid_password("hunter2!"));
    assert!(is_valid_password("secret"));
    assert!(!is_valid_password("12345"));
    assert!(!is_valid_password(&"x".repeat(129)));
  }

  #[test]
  fn test_is_valid_name() {
    assert!(is_valid_name("Ada Lovelace"));
    assert!(!is_valid_name("   "));
    assert!(!is_valid_name(&"n".repeat(256)));
  }
}
