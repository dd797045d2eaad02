/// Constants module to avoid magic numbers in the codebase

// Generation Endpoint
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

// Credential resolution
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

// Sampling Parameters
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

// Conversation Limits
pub const HISTORY_CONTEXT_MESSAGES: usize = 10; // older messages are excluded from the payload
pub const TOPIC_MAX_CHARS: usize = 30;

// Storage
pub const CONVERSATIONS_FILE: &str = "conversations.json";
pub const CREDENTIAL_FILE: &str = "credential.toml";

// Fixed Strings
pub const DEFAULT_TOPIC: &str = "New Conversation";

pub const SYSTEM_PROMPT: &str = "You are an expert Network Security Assistant specializing in networking concepts, protocols, \
cybersecurity, and network architecture. Provide detailed, technically accurate responses \
to questions about networking and security topics. Include practical examples where relevant. \
If you don't know the answer to a networking or security question, admit it rather than providing \
incorrect information. Always maintain context from the prior conversation and ask relevant \
follow-up questions to help the user deepen their understanding.";

pub const MISSING_KEY_REPLY: &str = "Please enter your Gemini API key to continue.";

pub const FALLBACK_REPLY: &str = "I'm having trouble connecting to my knowledge base right now. \
Please check your API key and network connection, then try again.";

pub const EMPTY_CANDIDATE_REPLY: &str = "I couldn't process your request. Please try again.";

// Suggested prompts shown on an empty transcript
pub const SUGGESTED_PROMPTS: &[&str] = &[
    "How do firewalls work?",
    "Explain TCP vs UDP",
    "What is a VPN?",
    "How to prevent DDoS attacks",
];
