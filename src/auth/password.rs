use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use error_stack::{Report, Result};
use once_cell::sync::Lazy;
use thiserror::Error;

static CONTEXT: Lazy<Argon2<'static>> = Lazy::new(|| {
  Argon2::new(
    argon2::Algorithm::Argon2id,
    argon2::Version::V0x13,
    argon2::Params::DEFAULT,
  )
});

#[derive(Debug, Error)]
#[error("Failed to generate password hash")]
pub struct HashPasswordError;

/// Hashes a raw password into a salted PHC string.
///
/// This is CPU-bound work; call it through `spawn_blocking` from
/// request handlers.
pub fn hash(password: impl AsRef<[u8]>) -> Result<String, HashPasswordError> {
  let salt = SaltString::generate(&mut OsRng);
  let password_hash = CONTEXT
    .hash_password(password.as_ref(), &salt)
    .map_err(|e| Report::new(HashPasswordError).attach_printable(e.to_string()))?;

  Ok(password_hash.to_string())
}

#[derive(Debug, Error)]
#[error("Failed to verify password")]
pub struct VerifyPasswordError;

/// Verifies a raw password against a stored PHC string. The
/// comparison inside argon2 does not short-circuit on mismatching
/// prefixes.
pub fn verify(password: &[u8], hash: &str) -> Result<bool, VerifyPasswordError> {
  let hash = PasswordHash::new(hash).map_err(|e| {
    Report::new(VerifyPasswordError)
      .attach_printable("could not parse password hash")
      .attach_printable(e.to_string())
  })?;

  match CONTEXT.verify_password(password, &hash) {
    Ok(..) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(error) => Err(Report::new(VerifyPasswordError).attach_printable(error.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify_roundtrip() {
    let hash = hash("correct horse battery staple").unwrap();
    assert!(verify(b"correct horse battery staple", &hash).unwrap());
    assert!(!verify(b"correct horse battery stable", &hash).unwrap());
  }

  #[test]
  fn hashes_are_salted() {
    let first = hash("hunter2!").unwrap();
    let second = hash("hunter2!").unwrap();
    assert_ne!(first, second);
  }

  #[test]
  fn garbage_hash_is_an_error() {
    assert!(verify(b"whatever", "not-a-phc-string").is_err());
  }
}
