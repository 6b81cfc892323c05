use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::process::Command;

use super::CommandError;

/// Captured result of a single external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Boundary around the external data-source process.
///
/// The retry loop in [`super::CommandRunner`] only depends on this trait, so
/// tests can substitute scripted outcomes for real subprocess calls.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

#[async_trait]
impl<I: Invoker + ?Sized> Invoker for Arc<I> {
    async fn invoke(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        (**self).invoke(program, args).await
    }
}

#[async_trait]
impl<I: Invoker + ?Sized> Invoker for &I {
    async fn invoke(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        (**self).invoke(program, args).await
    }
}

/// Real subprocess invoker, capturing stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output().await?;
        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Fail fast at startup when the configured data-source command is missing.
pub fn ensure_command_available(program: &str) -> Result<(), CommandError> {
    which::which(program)
        .map(|_| ())
        .map_err(|_| CommandError::NotInstalled(program.to_string()))
}
