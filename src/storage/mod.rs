use thiserror::Error;

use crate::types::id::{InterviewId, QuestionId, UserId};

mod fs;
pub use fs::FsStore;

#[derive(Debug, Error)]
pub enum Error {
  /// The upload exceeds the configured artifact size limit.
  #[error("artifact exceeds the configured size limit")]
  TooLarge,
  /// The backing store failed to persist or remove an artifact.
  #[error("artifact store I/O failure")]
  Io,
}

pub type Result<T> = error_stack::Result<T, Error>;

/// Where uploaded answer recordings live.
///
/// The core never interprets artifact bytes; it only records the URI
/// a store hands back. Methods are synchronous and called through
/// `spawn_blocking` from request handlers.
pub trait ArtifactStore: Send + Sync {
  /// Persists one artifact and returns an opaque URI for it.
  fn store(
    &self,
    owner: UserId,
    interview: InterviewId,
    question: QuestionId,
    bytes: &[u8],
  ) -> Result<String>;

  /// Discards a previously stored artifact. Used to clean up after a
  /// submission that failed partway; removing an unknown URI is a
  /// no-op.
  fn remove(&self, uri: &str) -> Result<()>;
}
