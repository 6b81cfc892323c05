//! Retry-aware execution of the external data-source command.
//!
//! Failures are classified from stderr and retried with a failure-specific
//! backoff: exponential (capped) for rate limits, linear for transient
//! network trouble, a flat pause for everything else. Exhausting the retry
//! budget surfaces an error the fetch controller treats as a soft failure.

use std::time::Duration;
use tracing::warn;

use super::invoker::{CommandOutput, Invoker};
use super::CommandError;

/// Rate-limit backoff base and ceiling, in seconds.
const RATE_LIMIT_BASE_SECS: u64 = 60;
const RATE_LIMIT_MAX_SECS: u64 = 300;
/// Linear step for transient network failures, in seconds.
const NETWORK_STEP_SECS: u64 = 5;
/// Flat pause before retrying unclassified failures, in seconds.
const OTHER_PAUSE_SECS: u64 = 2;

/// Classification of a failed invocation, from stderr text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Network,
    Other,
}

/// Classify a non-zero exit by case-insensitive stderr substring match.
#[must_use]
pub fn classify_stderr(stderr: &str) -> FailureKind {
    let lower = stderr.to_lowercase();
    if lower.contains("rate limit") {
        FailureKind::RateLimited
    } else if lower.contains("timeout") || lower.contains("connection") {
        FailureKind::Network
    } else {
        FailureKind::Other
    }
}

/// Delay before retry number `attempt + 2` after a failure on `attempt`
/// (zero-based). Pure, so the schedule is testable without sleeping.
#[must_use]
pub fn backoff_delay(kind: FailureKind, attempt: u32) -> Duration {
    let secs = match kind {
        FailureKind::RateLimited => RATE_LIMIT_BASE_SECS
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(RATE_LIMIT_MAX_SECS),
        FailureKind::Network => NETWORK_STEP_SECS * (u64::from(attempt) + 1),
        FailureKind::Other => OTHER_PAUSE_SECS,
    };
    Duration::from_secs(secs)
}

/// Runs the external data-source command with retry and backoff.
pub struct CommandRunner<I: Invoker> {
    invoker: I,
    program: String,
    max_retries: u32,
}

impl<I: Invoker> CommandRunner<I> {
    pub fn new(invoker: I, program: impl Into<String>, max_retries: u32) -> Self {
        Self {
            invoker,
            program: program.into(),
            max_retries,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the command, retrying up to `max_retries` times on failure.
    ///
    /// Returns captured stdout on the first successful attempt. A spawn
    /// failure (program missing, not executable) is not retried.
    pub async fn run(&self, args: &[String]) -> Result<String, CommandError> {
        let display = self.display_command(args);

        let mut last_stderr = String::new();
        for attempt in 0..=self.max_retries {
            let output = self
                .invoker
                .invoke(&self.program, args)
                .await
                .map_err(|source| CommandError::Spawn {
                    command: display.clone(),
                    source,
                })?;

            if output.succeeded() {
                return Ok(output.stdout);
            }

            last_stderr = output.stderr.trim().to_string();
            if attempt == self.max_retries {
                break;
            }

            let kind = classify_stderr(&last_stderr);
            let delay = backoff_delay(kind, attempt);
            self.log_retry(kind, attempt, delay, &output);
            tokio::time::sleep(delay).await;
        }

        Err(CommandError::Exhausted {
            command: display,
            attempts: self.max_retries + 1,
            stderr: last_stderr,
        })
    }

    fn display_command(&self, args: &[String]) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend_from_slice(args);
        parts.join(" ")
    }

    fn log_retry(&self, kind: FailureKind, attempt: u32, delay: Duration, output: &CommandOutput) {
        let wait = humantime::format_duration(delay);
        match kind {
            FailureKind::RateLimited => warn!(
                "Rate limit detected. Waiting {wait} before retry {}/{}",
                attempt + 1,
                self.max_retries
            ),
            FailureKind::Network => warn!(
                "Network issue detected. Waiting {wait} before retry {}/{}",
                attempt + 1,
                self.max_retries
            ),
            FailureKind::Other => warn!(
                "Command failed (attempt {}/{}): {}",
                attempt + 1,
                self.max_retries + 1,
                output.stderr.trim()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;
    use std::sync::Mutex;

    /// Pops scripted outcomes in order; panics past the end of the script.
    struct ScriptedInvoker {
        script: Mutex<Vec<CommandOutput>>,
        calls: Mutex<u32>,
    }

    impl ScriptedInvoker {
        fn new(script: Vec<CommandOutput>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Invoker for ScriptedInvoker {
        async fn invoke(&self, _program: &str, _args: &[String]) -> io::Result<CommandOutput> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.script.lock().unwrap().remove(0))
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn fail(stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_classify_rate_limit() {
        assert_eq!(
            classify_stderr("API rate limit exceeded"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_stderr("you have hit a secondary RATE LIMIT"),
            FailureKind::RateLimited
        );
    }

    #[test]
    fn test_classify_network() {
        assert_eq!(classify_stderr("request timeout"), FailureKind::Network);
        assert_eq!(
            classify_stderr("Connection reset by peer"),
            FailureKind::Network
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify_stderr("HTTP 404 Not Found"), FailureKind::Other);
        assert_eq!(classify_stderr(""), FailureKind::Other);
    }

    #[test]
    fn test_backoff_rate_limit_schedule() {
        // 60, 120, 240, then capped at 300
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 0),
            Duration::from_secs(60)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 1),
            Duration::from_secs(120)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 2),
            Duration::from_secs(240)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 3),
            Duration::from_secs(300)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 10),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_backoff_network_schedule() {
        assert_eq!(
            backoff_delay(FailureKind::Network, 0),
            Duration::from_secs(5)
        );
        assert_eq!(
            backoff_delay(FailureKind::Network, 2),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_backoff_other_flat() {
        assert_eq!(backoff_delay(FailureKind::Other, 0), Duration::from_secs(2));
        assert_eq!(backoff_delay(FailureKind::Other, 5), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_run_success_first_attempt() {
        let invoker = ScriptedInvoker::new(vec![ok("[]")]);
        let runner = CommandRunner::new(&invoker, "gh", 3);
        let out = runner.run(&["api".to_string()]).await.unwrap();
        assert_eq!(out, "[]");
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_rate_limited_three_times_then_success() {
        let invoker = ScriptedInvoker::new(vec![
            fail("rate limit exceeded"),
            fail("rate limit exceeded"),
            fail("rate limit exceeded"),
            ok("[]"),
        ]);
        let runner = CommandRunner::new(&invoker, "gh", 3);

        let out = runner.run(&["api".to_string()]).await.unwrap();
        assert_eq!(out, "[]");
        assert_eq!(invoker.calls(), 4, "total attempts should be 4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhausts_retries() {
        let invoker = ScriptedInvoker::new(vec![
            fail("HTTP 403"),
            fail("HTTP 403"),
            fail("HTTP 403"),
            fail("HTTP 403"),
        ]);
        let runner = CommandRunner::new(&invoker, "gh", 3);

        let err = runner.run(&["api".to_string()]).await.unwrap_err();
        assert_eq!(invoker.calls(), 4);
        match err {
            CommandError::Exhausted {
                attempts, stderr, ..
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(stderr, "HTTP 403");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_network_failure_then_success() {
        let invoker = ScriptedInvoker::new(vec![fail("connection refused"), ok("data")]);
        let runner = CommandRunner::new(&invoker, "gh", 3);

        let out = runner.run(&[]).await.unwrap();
        assert_eq!(out, "data");
        assert_eq!(invoker.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_zero_retries_fails_immediately() {
        let invoker = ScriptedInvoker::new(vec![fail("rate limit")]);
        let runner = CommandRunner::new(&invoker, "gh", 0);

        let err = runner.run(&[]).await.unwrap_err();
        assert_eq!(invoker.calls(), 1);
        assert!(matches!(err, CommandError::Exhausted { attempts: 1, .. }));
    }

    struct FailingSpawn;

    #[async_trait]
    impl Invoker for FailingSpawn {
        async fn invoke(&self, _program: &str, _args: &[String]) -> io::Result<CommandOutput> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_not_retried() {
        let runner = CommandRunner::new(FailingSpawn, "gh", 3);
        let err = runner.run(&[]).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
