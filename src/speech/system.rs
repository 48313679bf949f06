//! OS speech engine tier: espeak-ng subprocess.
//!
//! espeak-ng writes a WAV stream to stdout; decode it with hound and hand
//! the samples upstream. A missing binary, a non-zero exit, or output that
//! doesn't decode are all tier failures — the chain moves on.

use std::io::Cursor;
use std::process::Stdio;
use std::sync::OnceLock;

use tokio::process::Command;
use tracing::debug;

use crate::config::SystemTtsConfig;
use crate::error::BackendError;

static AVAILABLE: OnceLock<bool> = OnceLock::new();

pub struct SystemTts {
    command: String,
    words_per_minute: u32,
}

impl SystemTts {
    pub fn new(config: &SystemTtsConfig) -> Self {
        Self {
            command: config.command.clone(),
            words_per_minute: config.words_per_minute,
        }
    }

    /// Whether the speech binary responds at all. Probed once per process.
    fn available(&self) -> bool {
        *AVAILABLE.get_or_init(|| {
            let found = std::process::Command::new(&self.command)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false);
            debug!("System TTS probe: {} available={found}", self.command);
            found
        })
    }

    /// Synthesize `text`, returning samples and the engine's sample rate.
    pub async fn synthesize(&self, text: &str) -> Result<(Vec<f32>, u32), BackendError> {
        if !self.available() {
            return Err(BackendError::Unavailable(format!(
                "{} not installed",
                self.command
            )));
        }

        let output = Command::new(&self.command)
            .arg("--stdout")
            .arg("-s")
            .arg(self.words_per_minute.to_string())
            .arg(text)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BackendError::Runtime(format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            return Err(BackendError::Runtime(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        decode_wav(&output.stdout)
    }
}

/// Decode a 16-bit mono WAV byte stream into f32 samples.
fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), BackendError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| BackendError::Runtime(format!("undecodable WAV output: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .filter_map(Result::ok)
            .map(|s| f32::from(s) / 32768.0)
            .collect(),
        hound::SampleFormat::Float => reader.samples::<f32>().filter_map(Result::ok).collect(),
    };

    if samples.is_empty() {
        return Err(BackendError::Runtime("speech engine produced no samples".into()));
    }

    Ok((samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_tier_failure() {
        assert!(decode_wav(b"not a wav file").is_err());
    }

    #[test]
    fn valid_wav_round_trips() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..100i16 {
            writer.write_sample(i * 100).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, rate) = decode_wav(cursor.get_ref()).unwrap();
        assert_eq!(samples.len(), 100);
        assert_eq!(rate, 22_050);
    }
}
