use serde::Deserialize;

use crate::schema::submission::{score_in_bounds, MAX_SCORE};
use crate::types::ValidateError;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
  pub score: i16,
  pub comment: Option<String>,
}

impl ReviewRequest {
  pub fn validate(&self) -> Result<(), ValidateError> {
    let mut errors = ValidateError::builder();
    if !score_in_bounds(self.score) {
      errors.push("score", format!("must be between 0 and {MAX_SCORE}"));
    }
    errors.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_out_of_bounds_is_rejected() {
    let form = ReviewRequest {
      score: 150,
      comment: None,
    };
    let error = form.validate().unwrap_err();
    assert_eq!(error.messages("score"), ["must be between 0 and 100"]);
  }

  #[test]
  fn midrange_score_is_accepted() {
    let form = ReviewRequest {
      score: 50,
      comment: Some("solid answer".into()),
    };
    assert!(form.validate().is_ok());
  }
}
