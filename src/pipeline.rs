//! Conversion pipeline: code in, described audio out.
//!
//! Description generation strictly precedes synthesis because the
//! synthesizer consumes the selector's output. Each conversion owns its
//! results end to end — nothing is cached, queued, or persisted, so
//! concurrent requests share no mutable state.

use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::describer::{AnalysisResult, DocHint, DocSelector};
use crate::speech::{AudioResult, SpeechSynthesizer, TtsMethod};

/// One request's worth of input. Immutable, dropped when the request ends.
#[derive(Debug, Clone)]
pub struct CodeSubmission {
    pub code: String,
    /// Requested TTS tier by model identifier; `None` or an unknown
    /// identifier means auto-select.
    pub model_id: Option<String>,
}

/// Composite result: the description, the audio, and which tier produced
/// each.
#[derive(Debug, Clone)]
pub struct ConversionResponse {
    pub analysis: AnalysisResult,
    pub audio: AudioResult,
}

pub struct Pipeline {
    selector: DocSelector,
    synthesizer: SpeechSynthesizer,
    hint: DocHint,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            selector: DocSelector::new(config),
            synthesizer: SpeechSynthesizer::new(config),
            hint: DocHint::Auto,
        }
    }

    /// Convert a submission. Never fails on backend unavailability — both
    /// stages terminate in a guaranteed tier.
    pub async fn convert(&self, submission: CodeSubmission) -> ConversionResponse {
        let t0 = Instant::now();

        let analysis = self.selector.describe(&submission.code, self.hint).await;

        let requested = submission
            .model_id
            .as_deref()
            .and_then(TtsMethod::from_model_id);
        let audio = self
            .synthesizer
            .synthesize(&analysis.description, requested)
            .await;

        let total_ms = t0.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Converted {} chars of code in {total_ms:.0}ms: doc={} tts={} ({:.1}s audio)",
            submission.code.len(),
            analysis.method,
            audio.method,
            audio.samples.len() as f64 / f64::from(audio.sample_rate),
        );

        ConversionResponse { analysis, audio }
    }
}
