//! Hosted instruction-tuned generation: the remote documentation tier.
//!
//! One bounded-timeout call to a Hugging Face style inference endpoint.
//! Constructed only when an API token is configured; any failure — connect,
//! timeout, non-2xx, malformed or empty payload — is a tier failure and the
//! selector moves on to the local backends. No retry.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::BackendError;

pub struct RemoteInstructClient {
    endpoint: String,
    model: String,
    token: String,
    client: Client,
}

impl RemoteInstructClient {
    pub fn new(config: &RemoteConfig, token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            token,
            client,
        }
    }

    /// Single generation attempt against `{endpoint}/{model}`.
    pub async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/{}", self.endpoint, self.model);
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": 200,
                "temperature": 0.3,
                "return_full_text": false
            }
        });

        debug!("Remote generation request to {url}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::from_http("remote endpoint", &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Runtime(format!(
                "remote endpoint returned status {status}"
            )));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Runtime(format!("remote payload unreadable: {e}")))?;

        // HF text-generation payloads are a list of {"generated_text": ...}.
        let text = data[0]["generated_text"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            Err(BackendError::Runtime(
                "remote endpoint returned no generated text".into(),
            ))
        } else {
            Ok(text)
        }
    }
}
