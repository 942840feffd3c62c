//! Process configuration
//!
//! Read once at startup from the environment (and `.env` when present),
//! then shared read-only by every request.

use crate::error::AssistantError;
use crate::Result;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Deadlines applied to each kind of external call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub oracle: Duration,
    pub retrieval: Duration,
    pub transcription: Duration,
    pub synthesis: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            oracle: Duration::from_secs(60),
            retrieval: Duration::from_secs(30),
            transcription: Duration::from_secs(60),
            synthesis: Duration::from_secs(60),
        }
    }
}

/// Step budgets for the orchestration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Tool invocations a specialized agent may make per delegation
    pub agent_max_tool_calls: u32,
    /// Agent delegations the supervisor may make per request
    pub supervisor_max_delegations: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            agent_max_tool_calls: 4,
            supervisor_max_delegations: 4,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub tts_language: String,
    pub speech_api_key: String,
    pub speech_language: String,
    pub ffmpeg_path: PathBuf,
    pub timeouts: Timeouts,
    pub limits: Limits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-flash".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            tts_language: "en".to_string(),
            speech_api_key: String::new(),
            speech_language: "en-US".to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            timeouts: Timeouts::default(),
            limits: Limits::default(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .field("tts_language", &self.tts_language)
            .field("speech_api_key", &redact(&self.speech_api_key))
            .field("speech_language", &self.speech_language)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("timeouts", &self.timeouts)
            .field("limits", &self.limits)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "[REDACTED]"
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.port,
        };

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => {
                    let value: u64 = parse_value(key, &raw)?;
                    if value == 0 {
                        return Err(AssistantError::Config(format!(
                            "{} must be greater than zero",
                            key
                        )));
                    }
                    Ok(Duration::from_secs(value))
                }
                None => Ok(default),
            }
        };

        let timeouts = Timeouts {
            oracle: secs("ORACLE_TIMEOUT_SECS", defaults.timeouts.oracle)?,
            retrieval: secs("RETRIEVAL_TIMEOUT_SECS", defaults.timeouts.retrieval)?,
            transcription: secs("TRANSCRIPTION_TIMEOUT_SECS", defaults.timeouts.transcription)?,
            synthesis: secs("SYNTHESIS_TIMEOUT_SECS", defaults.timeouts.synthesis)?,
        };

        let limits = Limits {
            agent_max_tool_calls: match lookup("AGENT_MAX_TOOL_CALLS") {
                Some(raw) => parse_value("AGENT_MAX_TOOL_CALLS", &raw)?,
                None => defaults.limits.agent_max_tool_calls,
            },
            supervisor_max_delegations: match lookup("SUPERVISOR_MAX_DELEGATIONS") {
                Some(raw) => parse_value("SUPERVISOR_MAX_DELEGATIONS", &raw)?,
                None => defaults.limits.supervisor_max_delegations,
            },
        };

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            port,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            tts_language: lookup("TTS_LANGUAGE").unwrap_or(defaults.tts_language),
            speech_api_key: lookup("SPEECH_API_KEY").unwrap_or_default(),
            speech_language: lookup("SPEECH_LANGUAGE").unwrap_or(defaults.speech_language),
            ffmpeg_path: lookup("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            timeouts,
            limits,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AssistantError::Config(format!("{} has invalid value '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = tokio_test::assert_ok!(AppConfig::from_lookup(lookup_from(&[])));
        assert_eq!(config.port, 8000);
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.timeouts, Timeouts::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("API_PORT", "9090"),
            ("ORACLE_TIMEOUT_SECS", "5"),
            ("AGENT_MAX_TOOL_CALLS", "2"),
            ("STATIC_DIR", "/tmp/audio"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.timeouts.oracle, Duration::from_secs(5));
        assert_eq!(config.limits.agent_max_tool_calls, 2);
        assert_eq!(config.static_dir, PathBuf::from("/tmp/audio"));
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("RETRIEVAL_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(AssistantError::Config(_))));

        let result = AppConfig::from_lookup(lookup_from(&[("ORACLE_TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "abc123")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("abc123"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
