use serde::Deserialize;

use crate::schema::interview::NewQuestion;
use crate::types::id::UserId;
use crate::types::ValidateError;
use crate::util::validation;

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
  pub text: String,
  pub position: Option<i32>,
  pub max_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
  pub title: String,
  pub description: Option<String>,
  pub questions: Vec<QuestionInput>,
}

impl CreateInterviewRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !validation::is_valid_name(&self.title) {
      errors.push("title", "must be between 1 and 255 characters");
    }
    if self.questions.is_empty() {
      errors.push("questions", "at least one question is required");
    }
    for (index, question) in self.questions.iter().enumerate() {
      if question.text.trim().is_empty() {
        errors.push(format!("questions.{index}.text"), "is required");
      }
      if matches!(question.max_seconds, Some(n) if n <= 0) {
        errors.push(format!("questions.{index}.max_seconds"), "must be positive");
      }
    }
    errors.finish()
  }

  /// Question rows in input order; unspecified positions fall back
  /// to the input index.
  #[must_use]
  pub fn to_questions(&self) -> Vec<NewQuestion> {
    self
      .questions
      .iter()
      .enumerate()
      .map(|(index, question)| NewQuestion {
        text: question.text.clone(),
        position: question.position.unwrap_or(index as i32),
        max_seconds: question.max_seconds,
      })
      .collect()
  }
}

#[derive(Debug, Deserialize)]
pub struct UpdateInterviewRequest {
  pub title: String,
  pub description: Option<String>,
}

impl UpdateInterviewRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !validation::is_valid_name(&self.title) {
      errors.push("title", "must be between 1 and 255 characters");
    }
    errors.finish()
  }
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
  pub user_ids: Vec<UserId>,
}

impl AssignRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if self.user_ids.is_empty() {
      errors.push("user_ids", "at least one candidate is required");
    }
    errors.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn question(text: &str) -> QuestionInput {
    QuestionInput {
      text: text.into(),
      position: None,
      max_seconds: None,
    }
  }

  #[test]
  fn interview_needs_at_least_one_question() {
    let form = CreateInterviewRequest {
      title: "Backend Screen".into(),
      description: None,
      questions: vec![],
    };
    let error = form.validate().unwrap_err();
    assert_eq!(error.messages("questions").len(), 1);
  }

  #[test]
  fn positions_default_to_input_order() {
    let form = CreateInterviewRequest {
      title: "Backend Screen".into(),
      description: None,
      questions: vec![question("Tell us about yourself"), question("Why us?")],
    };
    assert!(form.validate().is_ok());

    let questions = form.to_questions();
    assert_eq!(questions[0].position, 0);
    assert_eq!(questions[1].position, 1);
  }

  #[test]
  fn explicit_positions_win() {
    let mut input = question("Closing thoughts?");
    input.position = Some(9);
    let form = CreateInterviewRequest {
      title: "Backend Screen".into(),
      description: None,
      questions: vec![input],
    };
    assert_eq!(form.to_questions()[0].position, 9);
  }
}
