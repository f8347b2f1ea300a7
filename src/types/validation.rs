use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Field validation failures keyed by the offending field.
///
/// Serialized as a plain JSON map so clients can render the
/// messages next to their form fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ValidateError {
  fields: BTreeMap<String, Vec<String>>,
}

impl ValidateError {
  #[must_use]
  pub fn builder() -> Builder {
    Builder {
      fields: BTreeMap::new(),
    }
  }

  /// A one-field shorthand for the common reject-with-a-single-message case.
  #[must_use]
  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    let mut builder = Self::builder();
    builder.push(field, message);
    Self {
      fields: builder.fields,
    }
  }

  pub fn messages(&self, field: &str) -> &[String] {
    self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
  }
}

impl Display for ValidateError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut first = true;
    for (field, messages) in &self.fields {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

#[derive(Debug)]
pub struct Builder {
  fields: BTreeMap<String, Vec<String>>,
}

impl Builder {
  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self
      .fields
      .entry(field.into())
      .or_default()
      .push(message.into());
  }

  /// Resolves into `Err` if any rule was violated.
  pub fn finish(self) -> Result<(), ValidateError> {
    if self.fields.is_empty() {
      Ok(())
    } else {
      Err(ValidateError {
        fields: self.fields,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_builder_resolves_ok() {
    assert!(ValidateError::builder().finish().is_ok());
  }

  #[test]
  fn collects_messages_per_field() {
    let mut builder = ValidateError::builder();
    builder.push("email", "must be a valid email address");
    builder.push("email", "is already taken");
    builder.push("password", "is too short");

    let error = builder.finish().unwrap_err();
    assert_eq!(error.messages("email").len(), 2);
    assert_eq!(error.messages("password").len(), 1);
    assert_eq!(error.messages("name").len(), 0);
  }

  #[test]
  fn serializes_as_plain_map() {
    let error = ValidateError::single("score", "must be between 0 and 100");
    let value = serde_json::to_value(&error).unwrap();
    assert_eq!(
      value,
      serde_json::json!({"score": ["must be between 0 and 100"]})
    );
  }
}
