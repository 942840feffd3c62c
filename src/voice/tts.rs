//! Text-to-speech through the Google Translate voice endpoint
//!
//! The endpoint only accepts short text, so answers are split at word
//! boundaries and the mp3 fragments are concatenated into one file.

use crate::error::AssistantError;
use crate::tools::USER_AGENT;
use crate::voice::{AudioArtifact, Synthesizer};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;

pub struct GoogleTranslateSynthesizer {
    client: Client,
    static_dir: PathBuf,
}

impl GoogleTranslateSynthesizer {
    pub fn new(static_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            static_dir: static_dir.into(),
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        index: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let total = total.to_string();
        let index = index.to_string();
        let length = chunk.chars().count().to_string();

        let response = self
            .client
            .get(TTS_ENDPOINT)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", language),
                ("client", "tw-ob"),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", length.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AssistantError::Synthesis(format!("speech request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Synthesis(format!(
                "speech endpoint returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssistantError::Synthesis(format!("speech body unreadable: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for GoogleTranslateSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioArtifact> {
        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(AssistantError::Synthesis(
                "nothing to synthesize".to_string(),
            ));
        }

        let start = Instant::now();
        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let fragment = self
                .fetch_chunk(chunk, language, index, chunks.len())
                .await?;
            audio.extend_from_slice(&fragment);
        }

        let artifact = write_artifact(&self.static_dir, &audio).await?;
        info!(
            chunks = chunks.len(),
            bytes = audio.len(),
            url = %artifact.url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Synthesized response audio"
        );
        Ok(artifact)
    }
}

/// Store mp3 bytes under a fresh unique name in `static_dir`
pub async fn write_artifact(static_dir: &Path, audio: &[u8]) -> Result<AudioArtifact> {
    tokio::fs::create_dir_all(static_dir).await?;

    let filename = format!("response_{}.mp3", Uuid::new_v4().simple());
    let path = static_dir.join(&filename);
    tokio::fs::write(&path, audio).await?;
    debug!(path = %path.display(), "Wrote audio artifact");

    Ok(AudioArtifact {
        path,
        url: format!("/static/{}", filename),
    })
}

/// Split at word boundaries into pieces of at most `max_chars` characters.
/// A single word longer than the limit is cut.
fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
