use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;

use super::Error;
use crate::database::ErrorExt2;
use crate::{database, storage, types::Error as ErrorType, types::ValidateError};

impl actix_web::ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self.as_type() {
      ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      ErrorType::NotFound => StatusCode::NOT_FOUND,
      ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
      ErrorType::Forbidden => StatusCode::FORBIDDEN,
      ErrorType::Conflict => StatusCode::CONFLICT,
      ErrorType::ExpiredToken => StatusCode::BAD_REQUEST,
      ErrorType::TokenMismatch => StatusCode::BAD_REQUEST,
      ErrorType::InvalidFormBody(..) => StatusCode::UNPROCESSABLE_ENTITY,
      ErrorType::Storage => StatusCode::BAD_GATEWAY,
      ErrorType::ReadonlyMode => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  fn error_response(&self) -> HttpResponse<BoxBody> {
    tracing::warn!(error = ?self, "request failed");
    HttpResponse::build(self.status_code()).json(self.as_type())
  }
}

impl From<Report<database::Error>> for Error {
  fn from(value: Report<database::Error>) -> Self {
    if value.is_readonly() {
      Error::from_report(ErrorType::ReadonlyMode, value)
    } else {
      Error::from_report(ErrorType::Internal, value)
    }
  }
}

impl From<Report<storage::Error>> for Error {
  fn from(value: Report<storage::Error>) -> Self {
    match value.current_context() {
      storage::Error::TooLarge => Error::from_report(
        ErrorType::InvalidFormBody(ValidateError::single(
          "answers",
          "artifact exceeds the configured size limit",
        )),
        value,
      ),
      storage::Error::Io => Error::from_report(ErrorType::Storage, value),
    }
  }
}

impl From<ValidateError> for Error {
  fn from(value: ValidateError) -> Self {
    #[derive(Debug, thiserror::Error)]
    #[error("Validation error occurred")]
    struct FormBodyError;
    Error::from_context(ErrorType::InvalidFormBody(value), FormBodyError)
  }
}

impl From<tokio::task::JoinError> for Error {
  fn from(value: tokio::task::JoinError) -> Self {
    Error::from_context(ErrorType::Internal, value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::ResponseError;

  #[track_caller]
  fn assert_status(error_type: ErrorType, status: StatusCode) {
    assert_eq!(Error::new(error_type).status_code(), status);
  }

  #[test]
  fn status_mapping() {
    assert_status(ErrorType::Internal, StatusCode::INTERNAL_SERVER_ERROR);
    assert_status(ErrorType::NotFound, StatusCode::NOT_FOUND);
    assert_status(ErrorType::Unauthorized, StatusCode::UNAUTHORIZED);
    assert_status(ErrorType::Forbidden, StatusCode::FORBIDDEN);
    assert_status(ErrorType::Conflict, StatusCode::CONFLICT);
    assert_status(ErrorType::ExpiredToken, StatusCode::BAD_REQUEST);
    assert_status(ErrorType::TokenMismatch, StatusCode::BAD_REQUEST);
    assert_status(
      ErrorType::InvalidFormBody(ValidateError::single("email", "is required")),
      StatusCode::UNPROCESSABLE_ENTITY,
    );
    assert_status(ErrorType::Storage, StatusCode::BAD_GATEWAY);
    assert_status(ErrorType::ReadonlyMode, StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn database_reports_map_to_readonly_or_internal() {
    let readonly: Error = Report::new(database::Error::Readonly).into();
    assert_eq!(readonly.as_type(), &ErrorType::ReadonlyMode);

    let unhealthy: Error = Report::new(database::Error::UnhealthyPool).into();
    assert_eq!(unhealthy.as_type(), &ErrorType::Internal);
  }

  #[test]
  fn oversized_artifacts_map_to_a_form_error() {
    let error: Error = Report::new(storage::Error::TooLarge).into();
    assert!(matches!(error.as_type(), ErrorType::InvalidFormBody(..)));

    let io: Error = Report::new(storage::Error::Io).into();
    assert_eq!(io.as_type(), &ErrorType::Storage);
  }
}
