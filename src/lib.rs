pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, Config};
pub use models::{ChatMessage, GeminiModel, MessageRole, Model};
pub use session::{ChatSession, Conversation, SubmitOutcome};
pub use utils::NetChatError;
