use serde::Deserialize;
use std::num::NonZeroU64;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Storage {
  /// Directory where uploaded answer artifacts are written.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_STORAGE_ROOT`
  pub root: PathBuf,
  /// Upper bound for a single uploaded artifact. Uploads above this
  /// limit are rejected before anything touches the disk.
  ///
  /// **Environment variables**:
  /// - `SCREENROOM_STORAGE_MAX_ARTIFACT_BYTES`
  pub max_artifact_bytes: NonZeroU64,
}

impl Storage {
  // 256 MiB, enough for a multi-minute recorded answer
  const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 256 * 1024 * 1024;

  // How many max-size answers one submission body is budgeted for.
  const ANSWERS_PER_BODY: usize = 4;

  /// JSON request body budget derived from the artifact cap.
  ///
  /// Artifacts travel base64-encoded inside the JSON body, which
  /// inflates them by 4/3, and a submission carries one blob per
  /// question. Without this the extractor's default limit would
  /// reject uploads long before the artifact cap is consulted.
  #[must_use]
  pub fn json_body_limit(&self) -> usize {
    let raw = usize::try_from(self.max_artifact_bytes.get()).unwrap_or(usize::MAX);
    let inflated = raw.div_ceil(3).saturating_mul(4);
    inflated.saturating_mul(Self::ANSWERS_PER_BODY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::num::NonZeroU64;

  #[test]
  fn json_body_limit_covers_base64_inflation() {
    let storage = Storage {
      root: PathBuf::from("artifacts"),
      max_artifact_bytes: NonZeroU64::new(3).unwrap(),
    };
    // 3 raw bytes encode to 4; four answers fit in 16.
    assert_eq!(storage.json_body_limit(), 16);

    let default = Storage::default();
    let cap = default.max_artifact_bytes.get();
    assert!(default.json_body_limit() as u64 >= cap / 3 * 4);
  }
}

impl Default for Storage {
  fn default() -> Self {
    Self {
      root: PathBuf::from("artifacts"),
      max_artifact_bytes: match NonZeroU64::new(Self::DEFAULT_MAX_ARTIFACT_BYTES) {
        Some(n) => n,
        None => panic!("DEFAULT_MAX_ARTIFACT_BYTES is accidentally set to 0"),
      },
    }
  }
}
