use std::env;
use std::fmt;

use anyhow::Context as _;
use async_trait::async_trait;
use atelier_database::model::chat::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::{FALLBACK_REPLY, ResponseGenerator};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Longest provider error body kept for logs; anything past this is noise.
const MAX_ERROR_BODY_LEN: usize = 512;

/// Thin client for the Gemini `generateContent` endpoint. Holds no
/// conversation state; every call carries the full transcript.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .context("GEMINI_API_KEY is not set")?;
        let model = env::var("GEMINI_MODEL")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        let base_url = env::var("GEMINI_BASE_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        Ok(Self::new(api_key, model, base_url))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ResponseGenerator for GeminiClient {
    async fn generate(
        &self,
        user_message: &str,
        history: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: crate::prompt::system_prompt(),
                }],
            },
            contents: build_contents(user_message, history),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(model = %self.model, history_len = history.len(), "requesting completion");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: truncate_chars(&body, MAX_ERROR_BODY_LEN),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        Ok(body
            .reply_text()
            .unwrap_or_else(|| FALLBACK_REPLY.to_owned()))
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// History in Gemini's role vocabulary (`user`/`model`), with the new
/// message appended as the final user turn.
fn build_contents(user_message: &str, history: &[ChatMessage]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(history.len() + 1);
    for message in history {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };
        contents.push(Content {
            role: Some(role.to_owned()),
            parts: vec![Part {
                text: message.content.clone(),
            }],
        });
    }
    contents.push(Content {
        role: Some("user".to_owned()),
        parts: vec![Part {
            text: user_message.to_owned(),
        }],
    });
    contents
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn reply_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn history_message(id: i64, role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            user_id: 1,
            role,
            content: content.to_owned(),
            created_at: 1700000000 + id,
        }
    }

    #[test]
    fn transcript_maps_roles_and_appends_new_turn() {
        let history = vec![
            history_message(1, MessageRole::User, "hi"),
            history_message(2, MessageRole::Assistant, "hello!"),
        ];
        let contents = build_contents("how are you?", &history);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[0].parts[0].text, "hi");
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(contents[1].parts[0].text, "hello!");
        assert_eq!(contents[2].role.as_deref(), Some("user"));
        assert_eq!(contents[2].parts[0].text, "how are you?");
    }

    #[test]
    fn empty_history_yields_single_user_turn() {
        let contents = build_contents("Hello", &[]);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[0].parts[0].text, "Hello");
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "Hi there!"}]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key", "gemini-test", server.uri());
        let reply = client.generate("hello", &[]).await.unwrap();
        assert_eq!(reply, "Hi there!");
    }

    #[tokio::test]
    async fn empty_candidates_fall_back_to_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key", "gemini-test", server.uri());
        let reply = client.generate("hello", &[]).await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn blank_reply_text_falls_back_to_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{"text": "   "}] }
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key", "gemini-test", server.uri());
        let reply = client.generate("hello", &[]).await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn quota_failure_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"error": "quota exceeded"})),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key", "gemini-test", server.uri());
        let err = client.generate("hello", &[]).await.unwrap_err();
        match err {
            ProviderError::Api { status, .. } => assert_eq!(status, 429),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
