pub mod auth;
pub mod interviews;
pub mod reviews;
pub mod submissions;
pub mod users;
