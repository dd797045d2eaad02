/// Session management module - Gateway

mod conversation;
mod manager;
mod selector;
mod store;

pub use conversation::{derive_topic, grouped_by_date, Conversation};
pub use manager::{ChatSession, SubmitOutcome};
pub use selector::select_conversation;
pub use store::{ConversationStore, CredentialStore};
