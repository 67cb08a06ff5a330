use std::fmt;
use async_trait::async_trait;
use bp_core::{ChatMessage, Error, LanguageModel, Result, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::ModelConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("Gemini API key is required".to_string()))?;

        Ok(Self {
            client: super::http_client()?,
            api_key,
            model: config.model_name.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system_prompt }],
            },
            contents: messages
                .iter()
                .map(|m| Content {
                    role: Some(match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }),
                    parts: vec![Part { text: &m.content }],
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(super::provider_error("Gemini", response).await);
        }

        let response = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Generation(format!("Malformed Gemini response: {}", e)))?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or_else(|| Error::Generation("Gemini returned no candidates".to_string()))?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        body: Arc<Mutex<Option<Value>>>,
        key: Arc<Mutex<Option<String>>>,
    }

    async fn spawn_server(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route(
                "/models/:model",
                post(
                    move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        *captured.body.lock().unwrap() = Some(body);
                        *captured.key.lock().unwrap() = headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        (status, Json(reply))
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), captured)
    }

    fn model(base_url: String) -> GeminiModel {
        GeminiModel::new(&ModelConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some(base_url),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let result = GeminiModel::new(&ModelConfig::default());
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Configuration error: Gemini API key is required");
    }

    #[tokio::test]
    async fn test_generate_sends_system_instruction_and_user_turn() {
        let reply = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "I read about queues. "}, {"text": "Source: https://example.com/a"}]
                }
            }]
        });
        let (base_url, captured) = spawn_server(StatusCode::OK, reply).await;
        let model = model(base_url);

        let text = model
            .generate("be brief", &[ChatMessage::user("https://example.com/a")])
            .await
            .unwrap();
        assert_eq!(text, "I read about queues. Source: https://example.com/a");

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "https://example.com/a");
        assert_eq!(captured.key.lock().unwrap().as_deref(), Some("test-key"));
    }

    #[tokio::test]
    async fn test_provider_error_is_generation_error() {
        let reply = json!({"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}});
        let (base_url, _) = spawn_server(StatusCode::TOO_MANY_REQUESTS, reply).await;

        let result = model(base_url)
            .generate("prompt", &[ChatMessage::user("https://example.com/a")])
            .await;
        match result {
            Err(Error::Generation(message)) => assert!(message.contains("Resource exhausted")),
            other => panic!("expected generation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_is_generation_error() {
        let (base_url, _) = spawn_server(StatusCode::OK, json!({"candidates": []})).await;

        let result = model(base_url)
            .generate("prompt", &[ChatMessage::user("https://example.com/a")])
            .await;
        assert!(matches!(result, Err(Error::Generation(_))));
    }
}
