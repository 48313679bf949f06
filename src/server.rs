//! HTTP boundary for the conversion pipeline.
//!
//! `POST /synthesize` takes `{code, model_id?}` and answers with WAV bytes;
//! the generated description and the method tags ride along as response
//! headers so a degraded conversion is visible without failing the
//! request. `GET /health` always reports healthy — backend availability is
//! a quality concern, not a liveness one.

use std::io::Cursor;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::pipeline::{CodeSubmission, Pipeline};

const INDEX_HTML: &str = include_str!("../static/index.html");

const DESCRIPTION_HEADER: HeaderName = HeaderName::from_static("x-description");
const DOC_METHOD_HEADER: HeaderName = HeaderName::from_static("x-doc-method");
const TTS_METHOD_HEADER: HeaderName = HeaderName::from_static("x-tts-method");
const DEGRADED_HEADER: HeaderName = HeaderName::from_static("x-degraded");

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub code: String,
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Client-visible failures. Backend degradation is never one of them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/synthesize", post(handle_synthesize))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<(), std::io::Error> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, app).await
}

// --- Handlers ---

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

async fn handle_synthesize(
    State(state): State<AppState>,
    payload: Result<Json<SynthesizeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    let response = state
        .pipeline
        .convert(CodeSubmission {
            code: req.code,
            model_id: req.model_id,
        })
        .await;

    let wav = encode_wav(&response.audio.samples, response.audio.sample_rate)
        .map_err(|e| ApiError::Internal(format!("WAV encoding failed: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    insert_text_header(&mut headers, DESCRIPTION_HEADER, &response.analysis.description);
    headers.insert(
        DOC_METHOD_HEADER,
        HeaderValue::from_static(response.analysis.method.as_str()),
    );
    headers.insert(
        TTS_METHOD_HEADER,
        HeaderValue::from_static(response.audio.method.as_str()),
    );

    let degraded: Vec<&str> = [response.analysis.note.as_deref(), response.audio.note.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !degraded.is_empty() {
        insert_text_header(&mut headers, DEGRADED_HEADER, &degraded.join("; "));
    }

    Ok((headers, wav).into_response())
}

// --- Helpers ---

/// Header values must be visible ASCII; anything else becomes a space.
fn sanitize_header(text: &str) -> String {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

fn insert_text_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(&sanitize_header(value)) {
        headers.insert(name, value);
    }
}

/// Serialize f32 samples into a 16-bit mono WAV container.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            // f32 [-1, 1] → i16
            let s = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_encoding_carries_all_samples() {
        let samples = vec![0.0f32; 2205];
        let bytes = encode_wav(&samples, 22_050).unwrap();
        // 44-byte RIFF header plus two bytes per sample.
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[test]
    fn header_sanitization_strips_control_and_unicode() {
        assert_eq!(sanitize_header("one\ntwo\tthree"), "one two three");
        assert_eq!(sanitize_header("café"), "caf");
        assert_eq!(sanitize_header("  plain  "), "plain");
    }
}
