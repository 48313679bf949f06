//! Local generation through an Ollama daemon: the local documentation tiers.
//!
//! Both local tiers share this client — the instruction-tuned model uses
//! the default chat template, the base model generates a raw continuation.
//! A daemon that is not running, or a model that is not pulled, surfaces as
//! a tier failure exactly like a model that errors mid-generation.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::config::OllamaConfig;
use crate::error::BackendError;

pub struct OllamaGenerator {
    host: String,
    client: Client,
}

impl OllamaGenerator {
    pub fn new(config: &OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            host: config.host.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// One generation attempt against `/api/generate`. `raw` skips the
    /// model's chat template (base completion models).
    pub async fn generate(&self, model: &str, prompt: &str, raw: bool) -> Result<String, BackendError> {
        let body = json!({
            "model": model,
            "prompt": prompt,
            "raw": raw,
            "stream": false,
            "options": {
                "temperature": 0.3,
                "num_predict": 200
            }
        });

        let url = format!("{}/api/generate", self.host);
        debug!("Ollama generation request: model={model} raw={raw}");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::from_http("ollama", &e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            // Daemon is up but the model is not pulled.
            return Err(BackendError::Unavailable(format!(
                "ollama model {model} not found"
            )));
        }
        if !status.is_success() {
            return Err(BackendError::Runtime(format!(
                "ollama returned status {status}"
            )));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Runtime(format!("ollama payload unreadable: {e}")))?;

        let text = data["response"].as_str().unwrap_or("").trim().to_string();

        if text.is_empty() {
            Err(BackendError::Runtime("ollama returned empty response".into()))
        } else {
            Ok(text)
        }
    }
}
