pub mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OpenAI API key is required. Provide it with --api-key, OPENAI_API_KEY, or the secrets file.")]
    NotConfigured,
    #[error("ChatGPT returned an empty response")]
    EmptyResponse,
    #[error("ChatGPT returned an unusable payload: {0}")]
    MalformedPayload(String),
    #[error("ChatGPT request failed: {0}")]
    Transport(String),
}

impl CompletionError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, CompletionError::NotConfigured)
    }
}

/// A chat model that turns a (system, user) prompt pair into text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, CompletionError>;
}

const HEALTH_SYSTEM: &str = "You confirm API connectivity briefly.";
const HEALTH_PROMPT: &str = "State in one sentence that ChatGPT is reachable for AMEA.";

/// Connectivity check. Always returns a human-readable status line.
pub async fn health_check(client: &dyn ChatCompletion) -> String {
    if !client.is_configured() {
        return "OpenAI API key is required for the health check.".to_string();
    }
    match client.complete(HEALTH_SYSTEM, HEALTH_PROMPT, false).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Health check failed: {e}");
            format!("Health check failed: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Option<Result<String, ()>>);

    #[async_trait]
    impl ChatCompletion for Canned {
        fn is_configured(&self) -> bool {
            self.0.is_some()
        }

        async fn complete(&self, _: &str, _: &str, _: bool) -> Result<String, CompletionError> {
            match &self.0 {
                None => Err(CompletionError::NotConfigured),
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(())) => Err(CompletionError::Transport("connection refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn health_check_reports_each_outcome() {
        let ok = Canned(Some(Ok("ChatGPT is reachable.".into())));
        assert_eq!(health_check(&ok).await, "ChatGPT is reachable.");

        let missing = Canned(None);
        assert!(health_check(&missing).await.contains("API key is required"));

        let broken = Canned(Some(Err(())));
        let status = health_check(&broken).await;
        assert!(status.starts_with("Health check failed"));
        assert!(status.contains("connection refused"));
    }

    #[test]
    fn not_configured_is_distinguishable() {
        assert!(CompletionError::NotConfigured.is_not_configured());
        assert!(!CompletionError::EmptyResponse.is_not_configured());
    }
}
