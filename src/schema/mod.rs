pub mod assignment;
pub mod interview;
pub mod password_reset;
pub mod session;
pub mod submission;
pub mod user;

pub use interview::{Interview, Question};
pub use password_reset::PasswordReset;
pub use session::Session;
pub use submission::{Answer, Submission};
pub use user::{Role, UpdateUser, User, UserBrief};
