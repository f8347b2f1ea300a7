pub mod notifier;
pub mod password;
pub mod token;

pub use notifier::ResetNotifier;
