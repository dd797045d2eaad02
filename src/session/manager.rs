use anyhow::Result;
use tracing::{debug, error};

use super::conversation::Conversation;
use super::store::ConversationStore;
use crate::constants::{FALLBACK_REPLY, MISSING_KEY_REPLY};
use crate::models::{ChatMessage, Model};
use crate::utils::NetChatError;

/// What a submit produced
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input; nothing changed
    Ignored,
    /// The assistant replied (real content or the fixed fallback)
    Replied(ChatMessage),
    /// No credential is configured; the reply is a placeholder and the
    /// caller should ask the user for a key
    NeedsCredential(ChatMessage),
}

/// Owns the conversation set, the active conversation and the visible
/// transcript, and drives reply generation.
///
/// Every mutation is followed by an explicit save; generation runs behind a
/// single-slot in-flight guard so a second submit is rejected while one is
/// outstanding.
pub struct ChatSession {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    transcript: Vec<ChatMessage>,
    store: ConversationStore,
    model: Box<dyn Model>,
    in_flight: bool,
}

impl ChatSession {
    /// Load persisted conversations and activate the most recently updated
    /// one, hydrating its messages into the transcript.
    pub fn load(store: ConversationStore, model: Box<dyn Model>) -> Self {
        let conversations = store.load();

        // New conversations are inserted at the front; iterating from the
        // back makes timestamp ties resolve to the most recently inserted.
        let active_id = conversations
            .iter()
            .rev()
            .max_by_key(|c| c.timestamp)
            .map(|c| c.id.clone());

        let transcript = active_id
            .as_deref()
            .and_then(|id| conversations.iter().find(|c| c.id == id))
            .map(|c| c.messages.clone())
            .unwrap_or_default();

        debug!(
            "Loaded {} conversation(s), active: {:?}",
            conversations.len(),
            active_id
        );

        Self {
            conversations,
            active_id,
            transcript,
            store,
            model,
            in_flight: false,
        }
    }

    /// Create a fresh conversation, make it active and clear the transcript
    pub fn start_new(&mut self) -> Result<String> {
        let conversation = Conversation::new();
        let id = conversation.id.clone();

        self.conversations.insert(0, conversation);
        self.active_id = Some(id.clone());
        self.transcript.clear();
        self.save()?;

        Ok(id)
    }

    /// Activate a conversation by id. Unknown ids are a silent no-op.
    pub fn select(&mut self, id: &str) {
        let Some(conversation) = self.conversations.iter().find(|c| c.id == id) else {
            debug!("Ignoring selection of unknown conversation {}", id);
            return;
        };
        self.transcript = conversation.messages.clone();
        self.active_id = Some(id.to_string());
    }

    /// Submit a user message and wait for the assistant reply.
    ///
    /// Appends the user message (creating a conversation when none is
    /// active), generates the reply, appends it, and persists after each
    /// mutation. Generation failures degrade to the fixed fallback reply and
    /// are never surfaced as errors.
    pub async fn submit(&mut self, text: &str) -> Result<SubmitOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.in_flight {
            return Err(NetChatError::Busy.into());
        }

        // History for the request excludes the message being submitted;
        // it travels as the prompt.
        let history = self.transcript.clone();

        let user_message = ChatMessage::user(text);
        self.transcript.push(user_message.clone());
        let seeded = match self.active_conversation_mut() {
            Some(conversation) => {
                conversation.append(user_message);
                None
            }
            None => Some(Conversation::seeded(user_message)),
        };
        if let Some(conversation) = seeded {
            self.active_id = Some(conversation.id.clone());
            self.conversations.insert(0, conversation);
        }
        self.save()?;

        let (reply_text, needs_credential) = if self.model.is_configured() {
            self.in_flight = true;
            let result = self.model.generate(&history, text).await;
            self.in_flight = false;

            match result {
                Ok(reply) => (reply, false),
                Err(e) => {
                    error!("Reply generation failed: {:#}", e);
                    (FALLBACK_REPLY.to_string(), false)
                }
            }
        } else {
            (MISSING_KEY_REPLY.to_string(), true)
        };

        let assistant_message = ChatMessage::assistant(reply_text);
        self.transcript.push(assistant_message.clone());
        if let Some(conversation) = self.active_conversation_mut() {
            conversation.append(assistant_message.clone());
        }
        self.save()?;

        if needs_credential {
            Ok(SubmitOutcome::NeedsCredential(assistant_message))
        } else {
            Ok(SubmitOutcome::Replied(assistant_message))
        }
    }

    /// Install a credential on the backend for subsequent requests
    pub fn install_api_key(&mut self, key: String) {
        self.model.set_api_key(key);
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    fn active_conversation_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn save(&self) -> Result<()> {
        self.store.save(&self.conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_TOPIC, EMPTY_CANDIDATE_REPLY};
    use crate::models::MessageRole;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Backend stub with a scripted response and a request counter
    struct StubModel {
        reply: Option<String>,
        configured: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StubModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                configured: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                configured: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn unconfigured() -> Self {
            Self {
                reply: Some(EMPTY_CANDIDATE_REPLY.to_string()),
                configured: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Model for StubModel {
        async fn generate(&self, _history: &[ChatMessage], _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(anyhow!("simulated transport failure")),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn set_api_key(&mut self, _key: String) {
            self.configured = true;
        }
    }

    fn session_with(dir: &TempDir, model: StubModel) -> ChatSession {
        let store = ConversationStore::new(dir.path()).unwrap();
        ChatSession::load(store, Box::new(model))
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_assistant() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::replying("Packets are filtered."));

        let outcome = session.submit("How do firewalls work?").await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Replied(_)));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].role, MessageRole::User);
        assert_eq!(session.transcript()[1].role, MessageRole::Assistant);
        assert_eq!(session.transcript()[1].content, "Packets are filtered.");

        let conversation = &session.conversations()[0];
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.topic, "How do firewalls work?");
    }

    #[tokio::test]
    async fn test_empty_and_whitespace_input_ignored() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::replying("unused"));

        assert_eq!(session.submit("").await.unwrap(), SubmitOutcome::Ignored);
        assert_eq!(
            session.submit("   \t\n").await.unwrap(),
            SubmitOutcome::Ignored
        );
        assert!(session.transcript().is_empty());
        assert!(session.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_fallback() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::failing());

        let outcome = session.submit("What is a VPN?").await.unwrap();

        match outcome {
            SubmitOutcome::Replied(reply) => assert_eq!(reply.content, FALLBACK_REPLY),
            other => panic!("expected a reply, got {:?}", other),
        }
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_skips_endpoint() {
        let dir = TempDir::new().unwrap();
        let model = StubModel::unconfigured();
        let calls = model.calls.clone();
        let mut session = session_with(&dir, model);

        let outcome = session.submit("What is a VPN?").await.unwrap();

        match outcome {
            SubmitOutcome::NeedsCredential(reply) => {
                assert_eq!(reply.content, MISSING_KEY_REPLY)
            }
            other => panic!("expected credential request, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_new_clears_transcript_and_is_unique() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::replying("ok"));

        session.submit("How do firewalls work?").await.unwrap();
        assert_eq!(session.transcript().len(), 2);

        let first = session.start_new().unwrap();
        assert!(session.transcript().is_empty());
        assert_eq!(session.active_id(), Some(first.as_str()));

        let second = session.start_new().unwrap();
        assert_ne!(first, second);
        let existing: Vec<&str> = session.conversations().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(existing.len(), 3);
    }

    #[tokio::test]
    async fn test_new_conversation_has_default_topic() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::replying("ok"));

        session.start_new().unwrap();
        assert_eq!(session.conversations()[0].topic, DEFAULT_TOPIC);
    }

    #[tokio::test]
    async fn test_select_unknown_id_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::replying("ok"));

        session.submit("Explain TCP vs UDP").await.unwrap();
        let active_before = session.active_id().map(str::to_string);
        let transcript_before = session.transcript().to_vec();

        session.select("conv-does-not-exist");

        assert_eq!(session.active_id().map(str::to_string), active_before);
        assert_eq!(session.transcript(), transcript_before.as_slice());
    }

    #[tokio::test]
    async fn test_select_replaces_transcript() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::replying("ok"));

        session.submit("Explain TCP vs UDP").await.unwrap();
        let first_id = session.active_id().unwrap().to_string();

        session.start_new().unwrap();
        session.submit("What is a VPN?").await.unwrap();

        session.select(&first_id);
        assert_eq!(session.active_id(), Some(first_id.as_str()));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].content, "Explain TCP vs UDP");
    }

    #[tokio::test]
    async fn test_session_reload_restores_most_recent() {
        let dir = TempDir::new().unwrap();
        {
            let mut session = session_with(&dir, StubModel::replying("reply"));
            session.submit("Explain TCP vs UDP").await.unwrap();
            session.start_new().unwrap();
            session.submit("How to prevent DDoS attacks").await.unwrap();
        }

        let reloaded = session_with(&dir, StubModel::replying("reply"));
        assert_eq!(reloaded.conversations().len(), 2);
        // the most recently updated conversation is hydrated
        assert_eq!(reloaded.transcript().len(), 2);
        assert_eq!(
            reloaded.transcript()[0].content,
            "How to prevent DDoS attacks"
        );
    }

    #[tokio::test]
    async fn test_install_api_key_configures_backend() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, StubModel::unconfigured());

        assert!(!session.is_configured());
        session.install_api_key("key".to_string());
        assert!(session.is_configured());
    }
}
