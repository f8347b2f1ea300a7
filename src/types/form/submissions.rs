use serde::Deserialize;

use crate::types::id::{InterviewId, QuestionId};
use crate::types::ValidateError;

/// One recorded answer, base64-encoded. The bytes are opaque to the
/// core; they go straight into the artifact store.
#[derive(Debug, Deserialize)]
pub struct AnswerUpload {
  pub question_id: QuestionId,
  pub data: String,
  pub duration_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
  pub interview_id: InterviewId,
  #[serde(default)]
  pub answers: Vec<AnswerUpload>,
}

impl SubmitRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    validate_answers(&self.answers)
  }
}

/// Body of the candidate-scoped submit route, which carries the
/// interview id in the path instead.
#[derive(Debug, Deserialize)]
pub struct CandidateSubmitRequest {
  #[serde(default)]
  pub answers: Vec<AnswerUpload>,
}

impl CandidateSubmitRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    validate_answers(&self.answers)
  }
}

fn validate_answers(answers: &[AnswerUpload]) -> Result<(), ValidateError> {
  let mut errors = ValidateError::builder();
  if answers.is_empty() {
    errors.push("answers", "at least one answer is required");
  }
  for (index, answer) in answers.iter().enumerate() {
    if answer.data.is_empty() {
      errors.push(format!("answers.{index}.data"), "is required");
    }
    if matches!(answer.duration_seconds, Some(n) if n < 0) {
      errors.push(
        format!("answers.{index}.duration_seconds"),
        "must not be negative",
      );
    }
  }
  errors.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn submit_requires_answers() {
    let form = SubmitRequest {
      interview_id: InterviewId(1),
      answers: vec![],
    };
    assert!(form.validate().is_err());
  }

  #[test]
  fn negative_durations_are_rejected() {
    let form = SubmitRequest {
      interview_id: InterviewId(1),
      answers: vec![AnswerUpload {
        question_id: QuestionId(1),
        data: "aGVsbG8=".into(),
        duration_seconds: Some(-4),
      }],
    };
    let error = form.validate().unwrap_err();
    assert_eq!(error.messages("answers.0.duration_seconds").len(), 1);
  }
}
