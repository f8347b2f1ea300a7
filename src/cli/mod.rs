use clap::{Parser, Subcommand};
use error_stack::Result;

mod server;

pub use server::StartError;

#[derive(Debug, Parser)]
#[command(name = "screenroom", version, about)]
pub struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Runs the HTTP service.
  Server,
}

impl Cli {
  pub fn run(self) -> Result<(), StartError> {
    match self.command {
      Command::Server => server::run(),
    }
  }
}
