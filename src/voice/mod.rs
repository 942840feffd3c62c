//! Speech boundaries: audio in, audio out

use crate::error::TranscriptionError;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub mod stt;
pub mod tts;

pub use stt::{AudioNormalizer, GoogleSpeechTranscriber};
pub use tts::GoogleTranslateSynthesizer;

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> std::result::Result<String, TranscriptionError>;
}

/// Synthesized speech stored where the HTTP layer can serve it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    /// Path under `/static` clients fetch the audio from
    pub url: String,
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioArtifact>;
}
