use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
      Serialize, Deserialize, sqlx::Type,
    )]
    #[serde(transparent)]
    #[sqlx(transparent)]
    pub struct $name(pub i64);

    impl From<i64> for $name {
      fn from(value: i64) -> Self {
        Self(value)
      }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
      }
    }
  };
}

id_newtype!(UserId);
id_newtype!(SessionId);
id_newtype!(InterviewId);
id_newtype!(QuestionId);
id_newtype!(SubmissionId);
id_newtype!(AnswerId);
