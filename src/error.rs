//! Error types for the voice assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Failures reported by the speech-to-text boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("audio could not be understood")]
    Unintelligible,

    #[error("speech recognition service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Request Pipeline Errors
    // =============================

    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Timed out after {seconds}s waiting for {operation}")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    // =============================
    // Capability Errors
    // =============================

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssistantError {
    /// Short message safe to hand back to an end user.
    ///
    /// Internal detail (upstream bodies, paths, library errors) stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::Transcription(TranscriptionError::Unintelligible) => {
                "Speech recognition could not understand the audio".to_string()
            }
            AssistantError::Transcription(TranscriptionError::ServiceUnavailable(_)) => {
                "Speech recognition service is unavailable".to_string()
            }
            AssistantError::Oracle(_) => "The assistant is temporarily unavailable".to_string(),
            AssistantError::Synthesis(_) => "Could not generate the spoken response".to_string(),
            AssistantError::Timeout { operation, .. } => {
                format!("The request timed out while waiting for {}", operation)
            }
            AssistantError::InvalidToolInput(msg) => msg.clone(),
            _ => "Internal error while processing the request".to_string(),
        }
    }
}
