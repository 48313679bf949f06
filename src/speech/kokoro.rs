//! Neural TTS tier: Kokoro ONNX inference.
//!
//! Pipeline:
//! 1. Text → sentences (split on .!?)
//! 2. Sentence → phonemes (misaki-rs G2P)
//! 3. Phonemes → token IDs (tokenizer.json vocabulary)
//! 4. Token IDs + voice style + speed → ONNX inference → f32 audio (24kHz)
//!
//! The engine loads at most once per process; missing model files make the
//! tier permanently unavailable and the chain degrades past it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ndarray::{Array2, Array3};
use ndarray_npy::NpzReader;
use ort::value::Tensor;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::KokoroConfig;
use crate::error::BackendError;

pub const SAMPLE_RATE: u32 = 24_000;
const MAX_TOKENS: usize = 510; // Voice style array first dimension
const SENTENCE_GAP_SECS: f32 = 0.2;

const MODEL_FILE: &str = "kokoro-v1.0.onnx";
const VOICES_FILE: &str = "voices-v1.0.bin";
const TOKENIZER_FILE: &str = "tokenizer.json";

static ENGINE: OnceCell<Option<Arc<KokoroEngine>>> = OnceCell::const_new();

/// Process-wide engine handle. Loaded on first use, under a guard that
/// admits exactly one loader even with concurrent first requests; the
/// result (even a failed load) is reused for the process lifetime.
pub async fn get_or_load(config: &KokoroConfig) -> Option<Arc<KokoroEngine>> {
    ENGINE
        .get_or_init(|| {
            let config = config.clone();
            async move {
                match tokio::task::spawn_blocking(move || KokoroEngine::load(&config)).await {
                    Ok(Ok(engine)) => Some(Arc::new(engine)),
                    Ok(Err(e)) => {
                        warn!("Neural TTS unavailable: {e}");
                        None
                    }
                    Err(e) => {
                        warn!("Neural TTS load task failed: {e}");
                        None
                    }
                }
            }
        })
        .await
        .clone()
}

/// Native Kokoro TTS engine.
pub struct KokoroEngine {
    // ONNX model (Mutex because ort 2.0 Session::run needs &mut)
    session: Mutex<ort::session::Session>,

    // Phonemizer (misaki-rs G2P)
    phonemizer: misaki_rs::G2P,

    // Tokenizer vocabulary: char → token ID
    vocab: HashMap<char, i64>,

    // Style vectors for the configured voice, indexed by token count.
    // shape: (510, 256)
    styles: Array2<f32>,

    speed: f32,
}

impl KokoroEngine {
    /// Load the ONNX model, tokenizer, voice style and phonemizer.
    /// Blocking; call from spawn_blocking.
    pub fn load(config: &KokoroConfig) -> Result<Self, String> {
        let t0 = Instant::now();

        let model_path = find_file(config, MODEL_FILE)?;
        let voices_path = find_file(config, VOICES_FILE)?;
        let tokenizer_path = find_file(config, TOKENIZER_FILE)?;

        info!("Loading tokenizer from {}", tokenizer_path.display());
        let vocab = load_tokenizer(&tokenizer_path)?;

        info!("Loading voice '{}' from {}", config.voice, voices_path.display());
        let styles = load_voice(&voices_path, &config.voice)?;

        info!("Loading ONNX model from {}", model_path.display());
        let session = ort::session::Session::builder()
            .map_err(|e| format!("Failed to create ONNX session builder: {e}"))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| format!("Failed to set optimization level: {e}"))?
            .with_intra_threads(4)
            .map_err(|e| format!("Failed to set thread count: {e}"))?
            .commit_from_file(&model_path)
            .map_err(|e| format!("Failed to load ONNX model: {e}"))?;

        let phonemizer = misaki_rs::G2P::new(misaki_rs::Language::EnglishUS);

        let load_ms = t0.elapsed().as_millis();
        info!("Kokoro TTS loaded in {load_ms}ms");

        Ok(Self {
            session: Mutex::new(session),
            phonemizer,
            vocab,
            styles,
            speed: config.speed,
        })
    }

    /// Generate audio for a full description: sentence-level chunks joined
    /// with a short pause. Blocking; call from spawn_blocking.
    pub fn synthesize(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let sentences = split_sentences(text.trim());
        if sentences.is_empty() {
            return Err(BackendError::Runtime("nothing to synthesize".into()));
        }

        let gap = (SENTENCE_GAP_SECS * SAMPLE_RATE as f32) as usize;
        let mut samples = Vec::new();

        for sentence in &sentences {
            let chunk = self.generate(sentence)?;
            if chunk.is_empty() {
                continue;
            }
            if !samples.is_empty() {
                samples.resize(samples.len() + gap, 0.0);
            }
            samples.extend(chunk);
        }

        if samples.is_empty() {
            return Err(BackendError::Runtime("model produced no audio".into()));
        }
        Ok(samples)
    }

    /// Generate audio samples for a single sentence.
    fn generate(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        // 1. Text → phonemes via misaki-rs G2P
        let (phonemes, _tokens) = self
            .phonemizer
            .g2p(text)
            .map_err(|e| BackendError::Runtime(format!("phonemization failed: {e}")))?;

        if phonemes.is_empty() {
            return Ok(Vec::new());
        }

        // 2. Phonemes → token IDs, padded at both ends
        let mut token_ids: Vec<i64> = Vec::with_capacity(phonemes.len() + 2);
        token_ids.push(0);
        for ch in phonemes.chars() {
            if let Some(&id) = self.vocab.get(&ch) {
                token_ids.push(id);
            }
            // Skip unknown characters silently
        }
        token_ids.push(0);

        let n_tokens = token_ids.len().min(MAX_TOKENS);
        token_ids.truncate(n_tokens);

        // 3. Style vector for this token count (clamped to max)
        let style_idx = n_tokens.saturating_sub(2).min(self.styles.nrows() - 1);
        let style_vec: Vec<f32> = self.styles.row(style_idx).to_vec();

        // 4. Build ONNX input tensors
        let tokens_array = Array2::from_shape_vec((1, n_tokens), token_ids)
            .map_err(|e| BackendError::Runtime(format!("failed to shape tokens tensor: {e}")))?;
        let tokens_tensor = Tensor::from_array(tokens_array)
            .map_err(|e| BackendError::Runtime(format!("failed to create tokens tensor: {e}")))?;

        let style_array = Array2::from_shape_vec((1, 256), style_vec)
            .map_err(|e| BackendError::Runtime(format!("failed to shape style tensor: {e}")))?;
        let style_tensor = Tensor::from_array(style_array)
            .map_err(|e| BackendError::Runtime(format!("failed to create style tensor: {e}")))?;

        let speed_array = ndarray::Array1::from_vec(vec![self.speed]);
        let speed_tensor = Tensor::from_array(speed_array)
            .map_err(|e| BackendError::Runtime(format!("failed to create speed tensor: {e}")))?;

        // 5. Run inference (Session::run needs &mut, hence the lock)
        let mut session = self
            .session
            .lock()
            .map_err(|_| BackendError::Runtime("ONNX session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![
                "tokens" => tokens_tensor,
                "style" => style_tensor,
                "speed" => speed_tensor
            ])
            .map_err(|e| BackendError::Runtime(format!("ONNX inference failed: {e}")))?;

        // 6. Extract audio samples from the first output tensor
        let first_output = outputs
            .iter()
            .next()
            .ok_or_else(|| BackendError::Runtime("no output tensor from model".into()))?;

        let (_shape, audio_slice) = first_output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| BackendError::Runtime(format!("failed to extract audio tensor: {e}")))?;

        let samples: Vec<f32> = audio_slice.to_vec();
        debug!(
            "Kokoro generated {} samples ({:.1}s)",
            samples.len(),
            samples.len() as f32 / SAMPLE_RATE as f32
        );

        Ok(samples)
    }
}

// --- Helper functions ---

/// Locate a model file: configured dir first, then current dir, then
/// ~/.cache/kokoro.
fn find_file(config: &KokoroConfig, name: &str) -> Result<PathBuf, String> {
    let search_dirs: Vec<PathBuf> = [
        (!config.model_dir.is_empty()).then(|| PathBuf::from(&config.model_dir)),
        std::env::current_dir().ok(),
        dirs::home_dir().map(|h| h.join(".cache/kokoro")),
    ]
    .into_iter()
    .flatten()
    .collect();

    for dir in &search_dirs {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(format!("{name} not found in {search_dirs:?}"))
}

/// Load tokenizer vocabulary from tokenizer.json.
fn load_tokenizer(path: &Path) -> Result<HashMap<char, i64>, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("Failed to read tokenizer: {e}"))?;

    let data: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse tokenizer JSON: {e}"))?;

    let vocab = data["model"]["vocab"]
        .as_object()
        .ok_or("Missing model.vocab in tokenizer.json")?;

    let mut map = HashMap::new();
    for (token, id) in vocab {
        let id = id.as_i64().ok_or("Token ID is not an integer")?;
        // Each token should be a single character
        if let Some(ch) = token.chars().next() {
            map.insert(ch, id);
        }
    }

    Ok(map)
}

/// Load one voice's style array from the NPZ voices file.
/// Stored shape is (510, 1, 256); squeezed to (510, 256).
fn load_voice(path: &Path, voice: &str) -> Result<Array2<f32>, String> {
    let file = fs::File::open(path).map_err(|e| format!("Failed to open voices file: {e}"))?;

    let mut npz = NpzReader::new(file).map_err(|e| format!("Failed to read NPZ voices file: {e}"))?;

    let arr: Array3<f32> = npz
        .by_name(&format!("{voice}.npy"))
        .map_err(|e| format!("Voice '{voice}' not found: {e}"))?;

    let dim0 = arr.shape()[0];
    let dim2 = arr.shape()[2];
    arr.into_shape_with_order((dim0, dim2))
        .map_err(|e| format!("Failed to reshape voice '{voice}': {e}"))
}

/// Split text into sentences at .!? boundaries.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'.' || b == b'!' || b == b'?')
            && i + 1 < bytes.len()
            && bytes[i + 1].is_ascii_whitespace()
        {
            let end = i + 1;
            let s = text[start..end].trim();
            if !s.is_empty() {
                sentences.push(s);
            }
            start = end;
        }
    }

    // Remainder
    let s = text[start..].trim();
    if !s.is_empty() {
        sentences.push(s);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let parts = split_sentences("First part. Second part! Third?");
        assert_eq!(parts, vec!["First part.", "Second part!", "Third?"]);
    }

    #[test]
    fn decimal_points_do_not_split() {
        let parts = split_sentences("Runs at 3.5 seconds per call.");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn missing_model_files_fail_the_load() {
        let config = KokoroConfig {
            model_dir: "/nonexistent/kokoro".into(),
            ..KokoroConfig::default()
        };
        // Current dir and home cache may not have the files either; the
        // point is that load reports, not panics.
        if let Err(e) = KokoroEngine::load(&config) {
            assert!(e.contains("not found"));
        }
    }
}
