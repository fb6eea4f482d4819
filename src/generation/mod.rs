//! Text-generation backend integration.

pub mod ollama;
pub mod response;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::prompt::GenerationRequest;

pub use ollama::{OllamaCli, check_ollama_installed};
pub use response::clean_response;

/// Marker that starts every fallback message, so a failed generation can never
/// be mistaken for a real commit message.
pub const FALLBACK_PREFIX: &str = "[generation failed]";

/// Trait for sending a composed request to a text-generation backend.
///
/// This abstraction allows mocking the backend in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the request. Called once per run, never retried.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Placeholder text shown in place of a generated message when the backend fails.
pub fn fallback_message(error: &GenerationError) -> String {
    match error {
        GenerationError::NotInstalled(binary) => {
            format!("{FALLBACK_PREFIX} {binary} command not found")
        }
        GenerationError::EmptyResponse => {
            format!("{FALLBACK_PREFIX} the model returned no output")
        }
        GenerationError::Timeout(secs) => {
            format!("{FALLBACK_PREFIX} the model did not answer within {secs}s")
        }
        GenerationError::NonZeroExit { code, .. } => {
            format!("{FALLBACK_PREFIX} the backend exited with code {code}")
        }
        GenerationError::SpawnFailed(_) | GenerationError::WriteFailed(_) => {
            format!("{FALLBACK_PREFIX} the backend could not be started")
        }
    }
}

/// Whether `message` is a fallback placeholder rather than generated text.
pub fn is_fallback(message: &str) -> bool {
    message.starts_with(FALLBACK_PREFIX)
}
