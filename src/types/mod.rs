pub mod error;
pub mod form;
pub mod id;
pub mod validation;

pub use error::Error;
pub use validation::ValidateError;
