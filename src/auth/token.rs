use rand::RngCore;
use sha2::{Digest, Sha256};

// 32 bytes of entropy per token, hex encoded on the wire.
const TOKEN_BYTES: usize = 32;

/// Mints an opaque bearer token. The raw value is handed to the
/// client exactly once; only its digest is persisted.
#[must_use]
pub fn generate() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  rand::rngs::OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// One-way digest of a raw token as stored in `sessions.token_hash`
/// and `password_resets.token_hash`.
#[must_use]
pub fn digest(raw: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(raw.as_bytes());
  hex::encode(hasher.finalize())
}

/// Compares a supplied raw token against a stored digest without
/// short-circuiting on the first differing byte.
#[must_use]
pub fn matches(raw: &str, stored_digest: &str) -> bool {
  constant_time_eq(digest(raw).as_bytes(), stored_digest.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }

  let mut diff = 0u8;
  for (x, y) in a.iter().zip(b.iter()) {
    diff |= x ^ y;
  }
  diff == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_long_and_unique() {
    let first = generate();
    let second = generate();
    assert_eq!(first.len(), TOKEN_BYTES * 2);
    assert_ne!(first, second);
  }

  #[test]
  fn digest_is_stable_and_one_way() {
    let raw = generate();
    assert_eq!(digest(&raw), digest(&raw));
    assert_ne!(digest(&raw), raw);
  }

  #[test]
  fn matches_accepts_only_the_original() {
    let raw = generate();
    let stored = digest(&raw);
    assert!(matches(&raw, &stored));
    assert!(!matches(&generate(), &stored));
    assert!(!matches("", &stored));
  }

  #[test]
  fn constant_time_eq_checks_length_first() {
    assert!(constant_time_eq(b"abc", b"abc"));
    assert!(!constant_time_eq(b"abc", b"abd"));
    assert!(!constant_time_eq(b"abc", b"abcd"));
  }
}
