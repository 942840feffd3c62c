//! Stock Voice Assistant
//!
//! A voice-driven stock market Q&A service that:
//! - Transcribes spoken questions
//! - Routes them through a supervisor to a web/news search agent and a
//!   price history agent
//! - Summarizes the findings with a reasoning oracle (Gemini)
//! - Speaks the answer back as an mp3 served over HTTP
//!
//! PIPELINE:
//! AUDIO → TRANSCRIBE → SUPERVISE → (DELEGATE → TOOL → OBSERVE)* → ANSWER → SYNTHESIZE

pub mod agent;
pub mod api;
pub mod config;
pub mod deadline;
pub mod error;
pub mod gemini;
pub mod models;
pub mod oracle;
pub mod pipeline;
pub mod supervisor;
pub mod tools;
pub mod voice;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use error::{AssistantError, TranscriptionError};
