//! Ollama CLI spawning.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::GenerationClient;
use super::response::clean_response;
use crate::error::GenerationError;
use crate::prompt::GenerationRequest;

/// Default timeout for Ollama subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "SMART_COMMIT_TIMEOUT";

/// Environment variable to override the Ollama binary.
const BINARY_ENV_VAR: &str = "SMART_COMMIT_OLLAMA";

const DEFAULT_BINARY: &str = "ollama";

/// Get the configured timeout duration.
///
/// Reads from SMART_COMMIT_TIMEOUT environment variable if set,
/// otherwise uses the default of 300 seconds.
///
/// Logs a warning if the environment variable is set but contains
/// an invalid value (non-numeric, empty, or negative).
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Get the configured Ollama binary name or path.
fn get_binary() -> String {
    match env::var(BINARY_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_BINARY.to_string(),
    }
}

/// Check if the Ollama CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_ollama_installed(binary: &str) -> Result<(), GenerationError> {
    which::which(binary)
        .map(|_| ())
        .map_err(|_| GenerationError::NotInstalled(binary.to_string()))
}

/// Generation client that runs `ollama run <model>` with the prompt on stdin.
pub struct OllamaCli {
    binary: String,
    timeout: Duration,
}

impl OllamaCli {
    /// Client configured from the environment.
    pub fn from_env() -> Self {
        Self {
            binary: get_binary(),
            timeout: get_timeout(),
        }
    }

    /// Client using an explicit binary and timeout.
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run the backend and return its raw stdout.
    ///
    /// The timeout covers writing the prompt and waiting for output; the child
    /// is killed if it elapses.
    async fn run(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        check_ollama_installed(&self.binary)?;

        let timeout_secs = self.timeout.as_secs();
        debug!(
            "Running {} run {} ({} prompt chars, timeout {}s)",
            self.binary,
            request.model,
            request.prompt.len(),
            timeout_secs
        );

        let mut child = Command::new(&self.binary)
            .arg("run")
            .arg(&request.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(GenerationError::SpawnFailed)?;

        let stdin = child.stdin.take();
        let prompt = request.prompt.as_bytes();
        let exchange = async move {
            if let Some(mut stdin) = stdin {
                stdin
                    .write_all(prompt)
                    .await
                    .map_err(GenerationError::WriteFailed)?;
                // Dropping stdin closes the pipe so the model sees end of input
            }
            child
                .wait_with_output()
                .await
                .map_err(GenerationError::SpawnFailed)
        };

        // Writing the prompt counts against the timeout as well
        let output = timeout(self.timeout, exchange)
            .await
            .map_err(|_| GenerationError::Timeout(timeout_secs))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(GenerationError::NonZeroExit { code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl GenerationClient for OllamaCli {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let raw = self.run(request).await?;
        let message = clean_response(&raw);

        if message.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(message)
    }
}
