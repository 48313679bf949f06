//! Audio synthesis with tiered backend fallback.
//!
//! Quality order: Kokoro neural TTS → OS speech engine → algorithmic
//! speech-cadence synthesis → pure tones. First success wins; the tone
//! tier cannot fail, so synthesis never does. A submission may request a
//! starting tier by model identifier — lower tiers still apply, higher
//! ones are skipped.

pub mod kokoro;
pub mod system;
pub mod waveform;

use std::sync::Arc;

use tracing::debug;

use crate::chain::{self, attempt, Attempt};
use crate::config::Config;
use crate::error::BackendError;
use system::SystemTts;

/// Which tier produced the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TtsMethod {
    NeuralTts,
    SystemTts,
    AlgorithmicSynthesis,
    ToneSynthesis,
}

impl TtsMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NeuralTts => "neural-tts",
            Self::SystemTts => "system-tts",
            Self::AlgorithmicSynthesis => "algorithmic-synthesis",
            Self::ToneSynthesis => "tone-synthesis",
        }
    }

    /// Parse a requested model identifier. Accepts the wire names plus the
    /// identifiers the original web UI offered; anything unknown means
    /// auto-select.
    pub fn from_model_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "neural-tts" | "xtts" | "kokoro" => Some(Self::NeuralTts),
            "system-tts" | "pyttsx3" | "espeak" => Some(Self::SystemTts),
            "algorithmic-synthesis" | "basic" => Some(Self::AlgorithmicSynthesis),
            "tone-synthesis" | "simple" | "tones" => Some(Self::ToneSynthesis),
            _ => None,
        }
    }
}

impl std::fmt::Display for TtsMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesized waveform plus how it was produced.
#[derive(Debug, Clone)]
pub struct AudioResult {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub method: TtsMethod,
    /// Present only when every preferred tier failed and tone synthesis
    /// produced the audio.
    pub note: Option<String>,
}

pub struct SpeechSynthesizer {
    kokoro: crate::config::KokoroConfig,
    system: SystemTts,
}

impl SpeechSynthesizer {
    pub fn new(config: &Config) -> Self {
        Self {
            kokoro: config.kokoro.clone(),
            system: SystemTts::new(&config.system_tts),
        }
    }

    /// Synthesize `text`, starting at `requested` when given. Never fails.
    pub async fn synthesize(&self, text: &str, requested: Option<TtsMethod>) -> AudioResult {
        let start = requested.unwrap_or(TtsMethod::NeuralTts);
        debug!("Synthesizing {} chars starting at {start}", text.len());

        let mut tiers: Vec<(TtsMethod, Attempt<'_, (Vec<f32>, u32)>)> = Vec::new();

        if start <= TtsMethod::NeuralTts {
            tiers.push((TtsMethod::NeuralTts, attempt(self.neural(text))));
        }
        if start <= TtsMethod::SystemTts {
            tiers.push((TtsMethod::SystemTts, attempt(self.system.synthesize(text))));
        }
        if start <= TtsMethod::AlgorithmicSynthesis {
            tiers.push((
                TtsMethod::AlgorithmicSynthesis,
                attempt(async move {
                    Ok((waveform::algorithmic(text), waveform::SAMPLE_RATE))
                }),
            ));
        }

        let outcome = chain::first_success(tiers, TtsMethod::ToneSynthesis, || {
            (waveform::tones(text), waveform::SAMPLE_RATE)
        })
        .await;

        let (samples, sample_rate) = outcome.output;
        AudioResult {
            samples,
            sample_rate,
            method: outcome.tag,
            note: outcome.note,
        }
    }

    async fn neural(&self, text: &str) -> Result<(Vec<f32>, u32), BackendError> {
        let engine = kokoro::get_or_load(&self.kokoro).await.ok_or_else(|| {
            BackendError::Unavailable("Kokoro model files not found or failed to load".into())
        })?;

        let text = text.to_string();
        let samples = run_inference(engine, text).await?;
        Ok((samples, kokoro::SAMPLE_RATE))
    }
}

/// ONNX inference is CPU-bound and synchronous; keep it off the async
/// executor threads.
async fn run_inference(
    engine: Arc<kokoro::KokoroEngine>,
    text: String,
) -> Result<Vec<f32>, BackendError> {
    tokio::task::spawn_blocking(move || engine.synthesize(&text))
        .await
        .map_err(|e| BackendError::Runtime(format!("inference task failed: {e}")))?
}
