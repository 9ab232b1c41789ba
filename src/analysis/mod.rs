use std::future::Future;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::acquisition::ImagePayload;
use crate::i18n::Language;

mod gemini;
pub mod prompt;

pub use gemini::{GeminiTransport, DEFAULT_API_BASE};

const LOG_BODY_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no API key configured")]
    MissingCredential,
    #[error("request to model endpoint failed: {message}")]
    Transport { message: String },
    #[error("model endpoint returned status {status}")]
    Status { status: u16, body: String },
    #[error("model returned an invalid response: {message}")]
    InvalidResponse { message: String },
}

impl AnalysisError {
    /// Localization key shown to the user for this failure.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::MissingCredential => "error.apiKeyMissing",
            Self::Transport { .. } | Self::Status { .. } | Self::InvalidResponse { .. } => {
                "display.errorDefault"
            }
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Score and narrative returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScouterResult {
    pub power_level: u64,
    pub reasoning: String,
}

impl ScouterResult {
    /// Parse the model's JSON text; rejects non-integer or negative scores and blank narratives.
    pub fn from_model_text(text: &str) -> AnalysisResult<Self> {
        let result: ScouterResult =
            serde_json::from_str(text.trim()).map_err(|err| AnalysisError::InvalidResponse {
                message: err.to_string(),
            })?;
        if result.reasoning.trim().is_empty() {
            return Err(AnalysisError::InvalidResponse {
                message: "reasoning is empty".to_string(),
            });
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub id: &'static str,
    pub name_key: &'static str,
    /// JSON object merged verbatim into `generationConfig`.
    pub params: &'static str,
}

impl ModelConfig {
    fn params_object(&self) -> Map<String, Value> {
        match serde_json::from_str::<Value>(self.params) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(model = self.id, "model params are not a JSON object; ignoring");
                Map::new()
            }
        }
    }
}

pub const AVAILABLE_MODELS: [ModelConfig; 2] = [
    ModelConfig {
        id: "gemini-2.5-flash",
        name_key: "model.gemini-2.5-flash.name",
        params: "{}",
    },
    ModelConfig {
        id: "gemini-2.5-pro",
        name_key: "model.gemini-2.5-pro.name",
        params: "{}",
    },
];

pub fn default_model() -> ModelConfig {
    AVAILABLE_MODELS[0]
}

/// Look up a model by id, falling back to the default for unknown ids.
pub fn find_model(id: &str) -> ModelConfig {
    AVAILABLE_MODELS
        .iter()
        .copied()
        .find(|model| model.id == id)
        .unwrap_or_else(default_model)
}

/// One `generateContent` call, ready for a transport.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model_id: String,
    pub api_key: String,
    pub body: Value,
}

/// Seam between request building and the network.
pub trait ModelTransport {
    /// Send the request and return the model's text output.
    fn generate(&self, request: &GenerateRequest) -> impl Future<Output = AnalysisResult<String>>;
}

pub struct AnalysisClient<T> {
    transport: T,
    fallback_api_key: Option<String>,
}

impl<T: ModelTransport> AnalysisClient<T> {
    pub fn new(transport: T, fallback_api_key: Option<String>) -> Self {
        Self {
            transport,
            fallback_api_key: fallback_api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn resolve_api_key(&self, api_key: &str) -> AnalysisResult<String> {
        let explicit = api_key.trim();
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }
        self.fallback_api_key
            .clone()
            .ok_or(AnalysisError::MissingCredential)
    }

    /// Single attempt, no retry.
    pub async fn analyze(
        &self,
        payload: &ImagePayload,
        model: &ModelConfig,
        language: Language,
        api_key: &str,
    ) -> AnalysisResult<ScouterResult> {
        let api_key = self.resolve_api_key(api_key)?;
        let request = GenerateRequest {
            model_id: model.id.to_string(),
            api_key,
            body: build_request_body(payload, model, language),
        };

        tracing::info!(
            model = model.id,
            language = language.code(),
            mime = payload.mime_type(),
            bytes = payload.len(),
            "requesting power level analysis"
        );
        let text = self.transport.generate(&request).await.inspect_err(|err| {
            tracing::warn!(%err, "power level request failed");
        })?;

        ScouterResult::from_model_text(&text).inspect_err(|err| {
            tracing::warn!(
                %err,
                body = %truncate_for_log(&text),
                "model response did not match the expected shape"
            );
        })
    }
}

pub fn build_request_body(payload: &ImagePayload, model: &ModelConfig, language: Language) -> Value {
    let encoded = base64::engine::general_purpose::STANDARD.encode(payload.bytes());
    let mut generation_config = Map::new();
    generation_config.insert(
        "responseMimeType".to_string(),
        Value::String("application/json".to_string()),
    );
    generation_config.insert(
        "responseSchema".to_string(),
        prompt::response_schema(language),
    );
    generation_config.extend(model.params_object());

    json!({
        "contents": [{
            "parts": [
                { "text": prompt::instruction(language) },
                { "inlineData": { "mimeType": payload.mime_type(), "data": encoded } },
            ],
        }],
        "generationConfig": Value::Object(generation_config),
    })
}

fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= LOG_BODY_LIMIT {
        return text.to_string();
    }
    let truncated: String = text.chars().take(LOG_BODY_LIMIT).collect();
    format!("{truncated}...")
}
