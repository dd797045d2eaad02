use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_TOPIC, TOPIC_MAX_CHARS};
use crate::models::{ChatMessage, MessageRole};

/// A saved conversation: ordered messages plus a short derived topic label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub topic: String,
    pub messages: Vec<ChatMessage>,
    /// Last-update time, serialized as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with a fresh unique id
    pub fn new() -> Self {
        Self {
            id: new_conversation_id(),
            topic: DEFAULT_TOPIC.to_string(),
            messages: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a conversation seeded with its first message
    pub fn seeded(first: ChatMessage) -> Self {
        let mut conversation = Self::new();
        conversation.append(first);
        conversation
    }

    /// Append a message and refresh the topic and timestamp
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.topic = derive_topic(&self.messages);
        self.timestamp = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

fn new_conversation_id() -> String {
    format!("conv-{}", Uuid::new_v4())
}

/// Derive a short topic label from the first user message: cut at the first
/// sentence boundary and at the character cap, with an ellipsis when the
/// cap was the limiting factor.
pub fn derive_topic(messages: &[ChatMessage]) -> String {
    let Some(first_user) = messages.iter().find(|m| m.role == MessageRole::User) else {
        return DEFAULT_TOPIC.to_string();
    };

    let first_sentence = first_user.content.split('.').next().unwrap_or("");
    let truncated: String = first_sentence.chars().take(TOPIC_MAX_CHARS).collect();
    let topic = truncated.trim().to_string();

    if topic.chars().count() == TOPIC_MAX_CHARS {
        format!("{}...", topic)
    } else {
        topic
    }
}

/// Group conversations by calendar date for display, newest date first and
/// newest conversation first within each date.
pub fn grouped_by_date(conversations: &[Conversation]) -> Vec<(String, Vec<&Conversation>)> {
    let mut sorted: Vec<&Conversation> = conversations.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut groups: Vec<(String, Vec<&Conversation>)> = Vec::new();
    for conversation in sorted {
        let date = conversation.timestamp.format("%Y-%m-%d").to_string();
        match groups.last_mut() {
            Some((last_date, members)) if *last_date == date => members.push(conversation),
            _ => groups.push((date, vec![conversation])),
        }
    }
    groups
}
