use std::time::Duration;

use serde::Deserialize;

use super::{AnalysisError, AnalysisResult, GenerateRequest, ModelTransport};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// `generateContent` over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    client: reqwest::Client,
    api_base: String,
}

impl GeminiTransport {
    pub fn new(api_base: Option<String>, timeout: Duration) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|err| AnalysisError::Transport {
                message: err.to_string(),
            })?;
        let api_base = api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { client, api_base })
    }

    pub fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{model_id}:generateContent", self.api_base)
    }
}

impl ModelTransport for GeminiTransport {
    async fn generate(&self, request: &GenerateRequest) -> AnalysisResult<String> {
        let url = self.endpoint(&request.model_id);
        tracing::debug!(%url, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &request.api_key)
            .json(&request.body)
            .send()
            .await
            .map_err(|err| AnalysisError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AnalysisError::Transport {
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        candidate_text(&body)
    }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(body: &str) -> AnalysisResult<String> {
    let envelope: GenerateContentResponse =
        serde_json::from_str(body).map_err(|err| AnalysisError::InvalidResponse {
            message: format!("response envelope is not JSON: {err}"),
        })?;

    let text = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::InvalidResponse {
            message: "response contained no text".to_string(),
        });
    }
    Ok(text)
}
