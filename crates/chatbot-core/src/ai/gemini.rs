use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::CompletionBackend;
use crate::config::ClientSettings;
use crate::error::CompletionError;

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

impl<'a> GeminiRequest<'a> {
    fn user_turn(text: &'a str) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text }],
            }],
        }
    }
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    /// Text of the first part of the first candidate, if any.
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

/// Client for the `generateContent` endpoint. The API key is only exposed
/// when building the request query string.
#[derive(Debug)]
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            // No timeout: the transport's own behaviour is the only limit.
            client: Client::new(),
            api_key: settings.api_key,
            base_url: settings.base_url,
            model: settings.model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without the key.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub async fn generate(&self, prompt: &str) -> Result<Option<String>, CompletionError> {
        let request = GeminiRequest::user_turn(prompt);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), model = %self.model, "generateContent responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Server {
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }

        let body = response.bytes().await?;
        let parsed: GeminiResponse = serde_json::from_slice(&body)?;
        Ok(parsed.into_first_text())
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, CompletionError> {
        self.generate(prompt).await
    }
}

/// `error.message` from an error payload, when the body is one.
fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_text(json: &str) -> Option<String> {
        serde_json::from_str::<GeminiResponse>(json)
            .unwrap()
            .into_first_text()
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GeminiRequest::user_turn("What is Rust?")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "What is Rust?"}]}]
            })
        );
    }

    #[test]
    fn test_first_candidate_text() {
        let json = r#"{"candidates":[
            {"content":{"parts":[{"text":"Hello"},{"text":"ignored"}],"role":"model"}},
            {"content":{"parts":[{"text":"second"}]}}
        ]}"#;
        assert_eq!(first_text(json), Some("Hello".to_string()));
    }

    #[test]
    fn test_missing_candidates() {
        assert_eq!(first_text("{}"), None);
        assert_eq!(first_text(r#"{"candidates":[]}"#), None);
        assert_eq!(first_text(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), None);
        assert_eq!(first_text(r#"{"candidates":[{"content":{"parts":[]}}]}"#), None);
        assert_eq!(first_text(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#), None);
    }

    #[test]
    fn test_parse_error_message() {
        assert_eq!(
            parse_error_message(r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#),
            Some("quota exceeded".to_string())
        );
        assert_eq!(parse_error_message(r#"{"error":{}}"#), None);
        assert_eq!(parse_error_message("<html>Bad Gateway</html>"), None);
        assert_eq!(parse_error_message(""), None);
    }

    #[test]
    fn test_endpoint_omits_key() {
        let client = GeminiClient::new(ClientSettings {
            api_key: SecretString::from("secret-key"),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        });
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}
