use anyhow::Result;
use async_trait::async_trait;

use super::types::ChatMessage;

/// Core trait that all generation backends must implement
#[async_trait]
pub trait Model: Send + Sync {
    /// Send the prompt plus recent conversation history and return the reply text.
    ///
    /// Errors here mean the request itself failed (transport, non-success
    /// status). Callers decide how failures surface to the user.
    async fn generate(&self, history: &[ChatMessage], prompt: &str) -> Result<String>;

    /// Get the name of the model
    fn name(&self) -> &str;

    /// Whether a credential is available for outbound requests
    fn is_configured(&self) -> bool;

    /// Install or replace the credential used for outbound requests
    fn set_api_key(&mut self, key: String);
}
