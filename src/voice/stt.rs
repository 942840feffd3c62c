//! Speech-to-text
//!
//! Uploaded audio (any container ffmpeg understands) is normalized to
//! 16 kHz mono signed 16-bit PCM, then sent to the Google speech endpoint.

use crate::error::TranscriptionError;
use crate::tools::USER_AGENT;
use crate::voice::Transcriber;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const SAMPLE_RATE: u32 = 16_000;
const SPEECH_ENDPOINT: &str = "https://www.google.com/speech-api/v2/recognize";

/// Peak amplitude at or below which a buffer counts as silence
const SILENCE_THRESHOLD: i16 = 64;

type TranscriptionResult<T> = std::result::Result<T, TranscriptionError>;

/// Converts arbitrary audio to raw PCM with an ffmpeg subprocess
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl AudioNormalizer {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }

    pub async fn to_pcm(&self, audio: &[u8]) -> TranscriptionResult<Vec<u8>> {
        let rate = SAMPLE_RATE.to_string();
        let mut child = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-i", "pipe:0"])
            .args(["-ac", "1", "-ar", rate.as_str(), "-f", "s16le", "pipe:1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TranscriptionError::ServiceUnavailable(format!("failed to start ffmpeg: {}", e))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            TranscriptionError::ServiceUnavailable("failed to open ffmpeg stdin".to_string())
        })?;

        // Feed stdin while stdout drains so neither pipe fills up
        let input = audio.to_vec();
        let writer = tokio::spawn(async move {
            let written = stdin.write_all(&input).await;
            drop(stdin);
            written
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                TranscriptionError::ServiceUnavailable(format!(
                    "audio conversion timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                TranscriptionError::ServiceUnavailable(format!("failed to read ffmpeg output: {}", e))
            })?;

        if let Ok(Err(e)) = writer.await {
            debug!(error = %e, "ffmpeg closed stdin early");
        }

        if !output.status.success() {
            // ffmpeg rejects input it cannot decode
            warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Audio conversion failed"
            );
            return Err(TranscriptionError::Unintelligible);
        }

        Ok(output.stdout)
    }
}

pub struct GoogleSpeechTranscriber {
    client: Client,
    normalizer: AudioNormalizer,
    api_key: String,
    language: String,
}

impl GoogleSpeechTranscriber {
    pub fn new(
        api_key: String,
        language: impl Into<String>,
        normalizer: AudioNormalizer,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            normalizer,
            api_key,
            language: language.into(),
        })
    }

    async fn recognize(&self, pcm: Vec<u8>) -> TranscriptionResult<String> {
        let unavailable = |e: reqwest::Error| TranscriptionError::ServiceUnavailable(e.to_string());

        let response = self
            .client
            .post(SPEECH_ENDPOINT)
            .query(&[
                ("client", "chromium"),
                ("lang", self.language.as_str()),
                ("key", self.api_key.as_str()),
                ("output", "json"),
            ])
            .header(CONTENT_TYPE, format!("audio/l16; rate={}", SAMPLE_RATE))
            .body(pcm)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscriptionError::ServiceUnavailable(format!(
                "recognition request failed with {}",
                status
            )));
        }

        let body = response.text().await.map_err(unavailable)?;
        parse_recognition_response(&body).ok_or(TranscriptionError::Unintelligible)
    }
}

#[async_trait]
impl Transcriber for GoogleSpeechTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> TranscriptionResult<String> {
        if audio.is_empty() {
            return Err(TranscriptionError::Unintelligible);
        }
        if self.api_key.is_empty() {
            return Err(TranscriptionError::ServiceUnavailable(
                "SPEECH_API_KEY not configured".to_string(),
            ));
        }

        let start = Instant::now();
        let pcm = self.normalizer.to_pcm(audio).await?;
        if is_silent(&pcm) {
            debug!(bytes = pcm.len(), "Audio is silent");
            return Err(TranscriptionError::Unintelligible);
        }

        let transcript = self.recognize(pcm).await?;
        debug!(
            chars = transcript.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transcribed audio"
        );
        Ok(transcript)
    }
}

/// Little-endian 16-bit samples with no sample above the silence threshold
fn is_silent(pcm: &[u8]) -> bool {
    pcm.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .all(|sample| sample.saturating_abs() <= SILENCE_THRESHOLD)
}

/// The service answers with one JSON object per line; the first carrying a
/// non-empty result wins, and within it the most confident alternative.
fn parse_recognition_response(body: &str) -> Option<String> {
    let result = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find_map(|value| {
            value
                .get("result")
                .and_then(Value::as_array)
                .and_then(|results| results.first().cloned())
        })?;

    let alternatives = result.get("alternative").and_then(Value::as_array)?;

    let best = alternatives
        .iter()
        .filter(|alt| alt.get("confidence").is_some())
        .max_by(|a, b| {
            let confidence = |v: &Value| v.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
            confidence(a).total_cmp(&confidence(b))
        })
        .or_else(|| alternatives.first())?;

    best.get("transcript")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
