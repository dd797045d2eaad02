use anyhow::Result;

use crate::app::{get_config_dir, get_data_dir, Config};
use crate::cli::Cli;
use crate::models::GeminiModel;
use crate::session::{ChatSession, ConversationStore, CredentialStore};

/// Build a chat session from configuration and CLI overrides.
///
/// The credential is resolved environment variable first, stored credential
/// second; when both are absent the session starts unconfigured and the
/// interface asks for a key before the first outbound request.
pub(crate) fn build_session(cli: &Cli, config: &Config) -> Result<(ChatSession, CredentialStore)> {
    let credentials = CredentialStore::new(get_config_dir()?)?;

    let api_key = std::env::var(&config.credentials.api_key_env)
        .ok()
        .filter(|key| !key.is_empty())
        .or_else(|| credentials.load());

    let model_name = cli
        .model
        .clone()
        .unwrap_or_else(|| config.assistant.model.clone());

    let model = GeminiModel::new(
        &config.assistant.base_url,
        &model_name,
        api_key,
        config.generation.clone(),
    )?;

    let store = ConversationStore::new(get_data_dir()?)?;
    let session = ChatSession::load(store, Box::new(model));

    Ok((session, credentials))
}
