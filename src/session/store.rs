use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::conversation::Conversation;
use crate::constants::{CONVERSATIONS_FILE, CREDENTIAL_FILE};

/// Persists the whole conversation set as one JSON document
pub struct ConversationStore {
    path: PathBuf,
}

impl ConversationStore {
    /// Create a store rooted at the given data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        Ok(Self {
            path: data_dir.join(CONVERSATIONS_FILE),
        })
    }

    /// Load every saved conversation. A missing file is an empty set; a
    /// corrupt file is logged and treated as empty rather than failing
    /// startup.
    pub fn load(&self) -> Vec<Conversation> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&json) {
            Ok(conversations) => conversations,
            Err(e) => {
                warn!(
                    "Discarding unreadable conversation store at {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Serialize the entire set. Called after every mutation.
    pub fn save(&self, conversations: &[Conversation]) -> Result<()> {
        let json = serde_json::to_string_pretty(conversations)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Persists the API credential separately from conversation data
pub struct CredentialStore {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    api_key: String,
}

impl CredentialStore {
    /// Create a credential store rooted at the given config directory
    pub fn new(config_dir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir).with_context(|| {
            format!("Failed to create config directory {}", config_dir.display())
        })?;
        Ok(Self {
            path: config_dir.join(CREDENTIAL_FILE),
        })
    }

    /// Load the stored key, if any
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        match toml::from_str::<CredentialFile>(&content) {
            Ok(file) => Some(file.api_key),
            Err(e) => {
                warn!(
                    "Ignoring unreadable credential file at {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Store the key for future sessions
    pub fn save(&self, api_key: &str) -> Result<()> {
        let content = toml::to_string_pretty(&CredentialFile {
            api_key: api_key.to_string(),
        })?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_conversation_set_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();

        let mut first = Conversation::seeded(ChatMessage::user("How do firewalls work?"));
        first.append(ChatMessage::assistant("They filter packets."));
        let second = Conversation::seeded(ChatMessage::user("Explain TCP vs UDP"));
        let saved = vec![first, second];

        store.save(&saved).unwrap();
        let loaded = store.load();

        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();

        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_credential_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path()).unwrap();

        assert_eq!(store.load(), None);
        store.save("test-api-key").unwrap();
        assert_eq!(store.load(), Some("test-api-key".to_string()));
    }

    #[test]
    fn test_corrupt_credential_ignored() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path()).unwrap();

        std::fs::write(store.path(), "api_key = [broken").unwrap();
        assert_eq!(store.load(), None);
    }
}
