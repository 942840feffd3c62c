//! Session pipeline
//!
//! AUDIO → TRANSCRIBE → SUPERVISE → FINAL ANSWER → SYNTHESIZE
//!
//! Built once at startup and shared by every request.

use crate::agent::{history_agent, search_agent, Agent};
use crate::config::{AppConfig, Timeouts};
use crate::deadline::with_deadline;
use crate::error::AssistantError;
use crate::models::{Conversation, PipelineResponse};
use crate::oracle::{GeminiOracle, ReasoningOracle};
use crate::supervisor::{final_answer, Supervisor};
use crate::tools::{DuckDuckGoProvider, StockHistoryTool, WebSearchTool, YahooFinanceSource};
use crate::voice::{
    AudioNormalizer, GoogleSpeechTranscriber, GoogleTranslateSynthesizer, Synthesizer,
    Transcriber,
};
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct SessionPipeline {
    transcriber: Arc<dyn Transcriber>,
    supervisor: Supervisor,
    synthesizer: Arc<dyn Synthesizer>,
    language: String,
    timeouts: Timeouts,
}

impl SessionPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        supervisor: Supervisor,
        synthesizer: Arc<dyn Synthesizer>,
        language: impl Into<String>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            transcriber,
            supervisor,
            synthesizer,
            language: language.into(),
            timeouts,
        }
    }

    /// Wire the live services described by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeouts = config.timeouts;
        let limits = config.limits;

        let oracle: Arc<dyn ReasoningOracle> = Arc::new(GeminiOracle::new(
            config.gemini_api_key.clone(),
            &config.gemini_model,
            timeouts.oracle,
        )?);

        let search_tool = Arc::new(WebSearchTool::new(
            Arc::new(DuckDuckGoProvider::new(timeouts.retrieval)?),
            timeouts.retrieval,
        ));
        let history_tool = Arc::new(StockHistoryTool::new(Arc::new(YahooFinanceSource::new(
            timeouts.retrieval,
        )?)));

        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(search_agent(
                Arc::clone(&oracle),
                search_tool,
                limits.agent_max_tool_calls,
                timeouts,
            )),
            Arc::new(history_agent(
                Arc::clone(&oracle),
                history_tool,
                limits.agent_max_tool_calls,
                timeouts,
            )),
        ];
        let supervisor = Supervisor::new(
            oracle,
            agents,
            limits.supervisor_max_delegations,
            timeouts.oracle,
        );

        let transcriber = GoogleSpeechTranscriber::new(
            config.speech_api_key.clone(),
            config.speech_language.clone(),
            AudioNormalizer::new(config.ffmpeg_path.clone(), timeouts.transcription),
            timeouts.transcription,
        )?;
        let synthesizer =
            GoogleTranslateSynthesizer::new(config.static_dir.clone(), timeouts.synthesis)?;

        info!(
            model = %config.gemini_model,
            static_dir = %config.static_dir.display(),
            "Session pipeline ready"
        );

        Ok(Self::new(
            Arc::new(transcriber),
            supervisor,
            Arc::new(synthesizer),
            config.tts_language.clone(),
            timeouts,
        ))
    }

    /// One full voice round trip. Any failing stage fails the whole request.
    pub async fn process(&self, audio: &[u8]) -> Result<PipelineResponse> {
        let start = Instant::now();

        // === TRANSCRIBE ===
        let transcription = with_deadline("transcription", self.timeouts.transcription, async {
            self.transcriber
                .transcribe(audio)
                .await
                .map_err(AssistantError::from)
        })
        .await?;
        info!(%transcription, "Pipeline: transcribed");

        // === SUPERVISE ===
        let trace = self
            .supervisor
            .run(Conversation::from_query(transcription.clone()))
            .await?;
        let response = final_answer(&trace)
            .map(str::to_string)
            .ok_or_else(|| AssistantError::Oracle("supervisor produced no answer".to_string()))?;
        debug!(turns = trace.len(), "Pipeline: supervisor finished");

        // === SYNTHESIZE ===
        let artifact = with_deadline(
            "synthesis",
            self.timeouts.synthesis,
            self.synthesizer.synthesize(&response, &self.language),
        )
        .await?;

        info!(
            audio_url = %artifact.url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline: completed"
        );

        Ok(PipelineResponse {
            transcription,
            response,
            audio_url: artifact.url,
        })
    }

    /// Run the supervisor on a caller-supplied conversation
    pub async fn supervise(&self, conversation: Conversation) -> Result<Conversation> {
        self.supervisor.run(conversation).await
    }

    /// Text-only query; returns the full trace
    pub async fn ask(&self, query: &str) -> Result<Conversation> {
        self.supervise(Conversation::from_query(query)).await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::pipeline;
    use super::*;
    use crate::error::TranscriptionError;
    use crate::oracle::{OracleReply, ScriptStep, ScriptedOracle};

    #[tokio::test]
    async fn test_process_round_trip() {
        let oracle = Arc::new(ScriptedOracle::replies(vec![OracleReply::text(
            "AAPL is trading at $190.",
        )]));
        let (pipeline, synthesizer) = pipeline(oracle);

        let response = tokio_test::assert_ok!(pipeline.process(b"What is the stock price of AAPL?").await);

        assert_eq!(response.transcription, "What is the stock price of AAPL?");
        assert_eq!(response.response, "AAPL is trading at $190.");
        assert_eq!(response.audio_url, "/static/response_test.mp3");
        assert_eq!(
            synthesizer.texts.lock().await.clone(),
            vec!["AAPL is trading at $190.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unintelligible_audio_stops_pipeline() {
        let oracle = Arc::new(ScriptedOracle::replies(vec![OracleReply::text("unused")]));
        let (pipeline, synthesizer) = pipeline(oracle.clone());

        let result = pipeline.process(b"").await;
        assert!(matches!(
            result,
            Err(AssistantError::Transcription(TranscriptionError::Unintelligible))
        ));
        assert!(oracle.requests().await.is_empty());
        assert!(synthesizer.texts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_failure_skips_synthesis() {
        let oracle = Arc::new(ScriptedOracle::new(vec![ScriptStep::Fail(
            "invalid api key".to_string(),
        )]));
        let (pipeline, synthesizer) = pipeline(oracle);

        let result = pipeline.process(b"AAPL news").await;
        assert!(matches!(result, Err(AssistantError::Oracle(_))));
        assert!(synthesizer.texts.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_transcription_times_out() {
        let oracle = Arc::new(ScriptedOracle::replies(vec![]));
        let (pipeline, _) = pipeline(oracle);

        let result = pipeline.process(b"hang").await;
        assert!(matches!(
            result,
            Err(AssistantError::Timeout {
                operation: "transcription",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_ask_returns_full_trace() {
        let oracle = Arc::new(ScriptedOracle::replies(vec![OracleReply::text(
            "Markets are open.",
        )]));
        let (pipeline, _) = pipeline(oracle);

        let trace = tokio_test::assert_ok!(pipeline.ask("Are markets open?").await);
        assert_eq!(trace.len(), 2);
        assert_eq!(final_answer(&trace), Some("Markets are open."));
    }

    #[test]
    fn test_from_config_builds_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            static_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        assert!(SessionPipeline::from_config(&config).is_ok());
    }
}
