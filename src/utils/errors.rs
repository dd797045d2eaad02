use thiserror::Error;

/// Main error type for NetChat
#[derive(Error, Debug)]
pub enum NetChatError {
    #[error("API key is not configured")]
    MissingCredential,

    #[error("A reply is already being generated")]
    Busy,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),
}
