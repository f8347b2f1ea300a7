use error_stack::{Report, ResultExt};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config;
use crate::types::id::{InterviewId, QuestionId, UserId};

use super::{ArtifactStore, Error, Result};

/// Local-filesystem artifact store. URIs are paths relative to the
/// configured root, e.g. `answers/4/2/7-a1b2c3d4e5f6.bin`.
#[derive(Debug)]
pub struct FsStore {
  root: PathBuf,
  max_bytes: u64,
}

impl FsStore {
  pub fn new(config: &config::Storage) -> Self {
    Self {
      root: config.root.clone(),
      max_bytes: config.max_artifact_bytes.get(),
    }
  }

  fn resolve(&self, uri: &str) -> Option<PathBuf> {
    // A URI is only ever a relative path we minted ourselves;
    // reject anything that could escape the root.
    let path = Path::new(uri);
    let escapes = path.is_absolute()
      || path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));
    if escapes {
      return None;
    }
    Some(self.root.join(path))
  }
}

impl ArtifactStore for FsStore {
  #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
  fn store(
    &self,
    owner: UserId,
    interview: InterviewId,
    question: QuestionId,
    bytes: &[u8],
  ) -> Result<String> {
    if bytes.len() as u64 > self.max_bytes {
      return Err(Report::new(Error::TooLarge));
    }

    let mut suffix = [0u8; 6];
    rand::rngs::OsRng.fill_bytes(&mut suffix);

    let dir = format!("answers/{owner}/{interview}");
    let uri = format!("{dir}/{question}-{}.bin", hex::encode(suffix));

    fs::create_dir_all(self.root.join(&dir))
      .change_context(Error::Io)
      .attach_printable_lazy(|| format!("could not create {dir}"))?;
    fs::write(self.root.join(&uri), bytes)
      .change_context(Error::Io)
      .attach_printable_lazy(|| format!("could not write {uri}"))?;

    Ok(uri)
  }

  #[tracing::instrument(skip(self))]
  fn remove(&self, uri: &str) -> Result<()> {
    let Some(path) = self.resolve(uri) else {
      return Ok(());
    };

    match fs::remove_file(path) {
      Ok(..) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Report::new(e).change_context(Error::Io)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::num::NonZeroU64;

  fn store_in(dir: &Path, max_bytes: u64) -> FsStore {
    FsStore::new(&config::Storage {
      root: dir.to_path_buf(),
      max_artifact_bytes: NonZeroU64::new(max_bytes).unwrap(),
    })
  }

  #[test]
  fn stores_and_removes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path(), 1024);

    let uri = store
      .store(UserId(1), InterviewId(2), QuestionId(3), b"recorded answer")
      .unwrap();
    assert!(uri.starts_with("answers/1/2/3-"));
    assert_eq!(fs::read(dir.path().join(&uri)).unwrap(), b"recorded answer");

    store.remove(&uri).unwrap();
    assert!(!dir.path().join(&uri).exists());
  }

  #[test]
  fn removing_unknown_uri_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path(), 1024);

    store.remove("answers/9/9/9-deadbeef.bin").unwrap();
    store.remove("/etc/passwd").unwrap();
    store.remove("../outside.bin").unwrap();
  }

  #[test]
  fn rejects_oversized_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path(), 8);

    let error = store
      .store(UserId(1), InterviewId(1), QuestionId(1), b"way too many bytes")
      .unwrap_err();
    assert!(matches!(error.current_context(), Error::TooLarge));
  }
}
