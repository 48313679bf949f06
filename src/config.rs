//! Configuration management for code-narrator-rs.
//!
//! Loads config from YAML files in standard locations. Every field has a
//! default so the service runs with no config file at all — including with
//! no backends installed, in which case requests degrade to the built-in
//! synthesis tiers.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// Hosted instruction-tuned generation API (Hugging Face style).
///
/// The token is read from the environment variable named by `token_env`;
/// its absence is the normal local-only mode, not an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api-inference.huggingface.co/models".into(),
            model: "google/flan-t5-base".into(),
            token_env: "HUGGINGFACE_API_TOKEN".into(),
            timeout_secs: 10,
        }
    }
}

/// Local Ollama daemon used by both local documentation tiers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub instruct_model: String,
    pub base_model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".into(),
            instruct_model: "llama3.2:3b".into(),
            base_model: "qwen2.5-coder:1.5b-base".into(),
            timeout_secs: 30,
        }
    }
}

/// Kokoro ONNX neural TTS. `model_dir` empty means search the standard
/// locations (current dir, ~/.cache/kokoro).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KokoroConfig {
    pub voice: String,
    pub speed: f32,
    pub model_dir: String,
}

impl Default for KokoroConfig {
    fn default() -> Self {
        Self {
            voice: "af_heart".into(),
            speed: 1.0,
            model_dir: String::new(),
        }
    }
}

/// OS speech engine (espeak-ng subprocess).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemTtsConfig {
    pub command: String,
    pub words_per_minute: u32,
}

impl Default for SystemTtsConfig {
    fn default() -> Self {
        Self {
            command: "espeak-ng".into(),
            words_per_minute: 170,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub ollama: OllamaConfig,
    pub kokoro: KokoroConfig,
    pub system_tts: SystemTtsConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/code-narrator/config.yaml
    /// 3. /etc/code-narrator/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/code-narrator/config.yaml")),
                Some(PathBuf::from("/etc/code-narrator/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    /// Remote API token, if the configured environment variable is set and
    /// non-empty.
    pub fn remote_token(&self) -> Option<String> {
        std::env::var(&self.remote.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.remote.enabled);
        assert_eq!(config.remote.token_env, "HUGGINGFACE_API_TOKEN");
        assert!(config.ollama.host.contains("11434"));
        assert_eq!(config.system_tts.command, "espeak-ng");
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yml::from_str("server:\n  port: 9100\n").unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.ollama.instruct_model, "llama3.2:3b");
    }

    #[test]
    fn missing_token_env_means_no_token() {
        let config = Config {
            remote: RemoteConfig {
                token_env: "CODE_NARRATOR_TEST_TOKEN_THAT_IS_NEVER_SET".into(),
                ..RemoteConfig::default()
            },
            ..Config::default()
        };
        assert!(config.remote_token().is_none());
    }
}
