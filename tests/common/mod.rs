//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use teamfetch::config::{ApiConfig, AppConfig, GithubConfig, StorageConfig};
use teamfetch::source::{CommandOutput, Invoker};

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Build an `AppConfig` rooted in a test directory.
pub fn test_config(root: &Path, organizations: &[&str], max_retries: u32) -> AppConfig {
    AppConfig {
        github: GithubConfig {
            organization: None,
            organizations: organizations.iter().map(ToString::to_string).collect(),
        },
        api: ApiConfig {
            command: "gh".to_string(),
            max_retries,
        },
        storage: StorageConfig {
            root: root.to_path_buf(),
        },
    }
}

/// Invoker that replays scripted outcomes keyed by the full argument line.
///
/// Each key holds a queue of outcomes consumed in order; an unknown key or
/// exhausted queue yields a generic HTTP 404 failure, which models hitting
/// an endpoint the test did not expect to be called.
#[derive(Default)]
pub struct ScriptedInvoker {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stub(&self, args_line: &str, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap()
            .entry(args_line.to_string())
            .or_default()
            .push_back(output);
    }

    pub fn stub_ok(&self, args_line: &str, stdout: &str) {
        self.stub(
            args_line,
            CommandOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    pub fn stub_fail(&self, args_line: &str, stderr: &str) {
        self.stub(
            args_line,
            CommandOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Argument lines of every invocation observed so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    async fn invoke(&self, _program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let key = args.join(" ");
        self.calls.lock().unwrap().push(key.clone());

        let scripted = self.responses.lock().unwrap().get_mut(&key).and_then(VecDeque::pop_front);
        Ok(scripted.unwrap_or(CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: "HTTP 404: Not Found".to_string(),
        }))
    }
}

/// Argument line for a paginated api call, matching the controller's shape.
pub fn api_args(endpoint: &str) -> String {
    format!("api {endpoint} --paginate")
}

/// Argument line for the maintainer-scoped membership query.
pub fn maintainer_args(endpoint: &str) -> String {
    format!("api {endpoint} --paginate -f role=maintainer")
}

/// JSON array of team objects.
pub fn teams_json(names: &[&str]) -> String {
    let items: Vec<serde_json::Value> = names
        .iter()
        .map(|n| serde_json::json!({ "name": n, "slug": n }))
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// JSON array of member objects.
pub fn members_json(logins: &[&str]) -> String {
    let items: Vec<serde_json::Value> = logins
        .iter()
        .map(|l| serde_json::json!({ "login": l }))
        .collect();
    serde_json::Value::Array(items).to_string()
}
