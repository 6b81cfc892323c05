mod error;
mod invoker;
mod runner;

pub use error::CommandError;
pub use invoker::{ensure_command_available, CommandOutput, Invoker, ProcessInvoker};
pub use runner::{backoff_delay, classify_stderr, CommandRunner, FailureKind};
