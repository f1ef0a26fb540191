//! Proxy to a Gemini-compatible `generateContent` endpoint for the
//! disaster-management chat assistant.

use crate::config::AssistantConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, header};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use rustls::{ClientConfig, RootCertStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{Duration, timeout};
use utoipa::ToSchema;

pub const SYSTEM_PROMPT: &str = "You are a helpful disaster management assistant. You specialize in:

1. Emergency Response Planning
2. Risk Assessment and Mitigation
3. Evacuation Procedures
4. Resource Management
5. Communication Protocols
6. Post-Disaster Recovery
7. Business Continuity Planning
8. Public Safety Information

Provide accurate, helpful, and actionable advice. Always prioritize safety and follow established emergency management best practices. If you're unsure about specific local procedures, recommend consulting local emergency management authorities.

Keep responses concise but informative. For emergency situations, provide immediate actionable steps first, then additional context.";

pub const SYSTEM_ACKNOWLEDGEMENT: &str = "I understand. I'm ready to assist with disaster management questions and provide helpful, safety-focused guidance.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Gemini API key not set.")]
    MissingApiKey,
    #[error("failed to build request: {0}")]
    Request(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("upstream response had no candidate text")]
    EmptyResponse,
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

impl ChatError {
    /// Text placed in the `reply` field when the chat fails.
    pub fn reply(&self) -> String {
        match self {
            ChatError::MissingApiKey => self.to_string(),
            other => format!("AI error: {other}"),
        }
    }
}

/// One turn of the conversation as the dashboard sends it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// `user` or `assistant`
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

/// Full upstream conversation: system prompt, canned acknowledgement, then
/// the caller's turns with `assistant` renamed to `model`.
fn conversation(messages: &[ChatMessage]) -> GenerateRequest {
    let mut contents = Vec::with_capacity(messages.len() + 2);
    contents.push(Content::text("user", SYSTEM_PROMPT));
    contents.push(Content::text("model", SYSTEM_ACKNOWLEDGEMENT));
    contents.extend(messages.iter().map(|m| {
        let role = if m.role == "assistant" {
            "model"
        } else {
            m.role.as_str()
        };
        Content::text(role, &m.content)
    }));
    GenerateRequest { contents }
}

fn first_candidate_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.text)
        .filter(|t| !t.is_empty())
}

pub struct AssistantClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: AssistantConfig,
}

impl AssistantClient {
    pub fn new(config: AssistantConfig) -> Result<Self, ChatError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Ok(Self { client, config })
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            api_key
        )
    }

    #[tracing::instrument(skip(self, messages), fields(turns = messages.len(), model = %self.config.model))]
    pub async fn reply(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ChatError::MissingApiKey)?;

        let body = serde_json::to_vec(&conversation(messages))
            .map_err(|e| ChatError::Request(e.to_string()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint(api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, concat!("disaster-ops/", env!("CARGO_PKG_VERSION")))
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| ChatError::Request(e.to_string()))?;

        let limit = Duration::from_secs(self.config.timeout_secs);
        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ChatError::Transport(e.to_string()))?;
            let status = response.status();
            let bytes = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ChatError::Transport(e.to_string()))?
                .to_bytes();
            Ok::<_, ChatError>((status, bytes))
        };
        let (status, bytes) = timeout(limit, exchange)
            .await
            .map_err(|_| ChatError::Timeout(limit))??;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).chars().take(200).collect();
            tracing::warn!(status = status.as_u16(), "Assistant upstream rejected request");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::Transport(format!("invalid response body: {e}")))?;
        first_candidate_text(parsed).ok_or(ChatError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversation_prepends_prompt_and_maps_roles() {
        let request = conversation(&[
            ChatMessage {
                role: "user".into(),
                content: "How do I prepare for a flood?".into(),
            },
            ChatMessage {
                role: "assistant".into(),
                content: "Move valuables upstairs.".into(),
            },
        ]);
        let value = serde_json::to_value(&request).unwrap();
        let contents = value["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], SYSTEM_PROMPT);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[3]["role"], "model");
    }

    #[test]
    fn first_candidate_text_is_extracted() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Stay on high ground."}]}}
            ]
        }))
        .unwrap();
        assert_eq!(
            first_candidate_text(parsed).as_deref(),
            Some("Stay on high ground.")
        );

        let empty: GenerateResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(first_candidate_text(empty).is_none());
    }

    #[test]
    fn missing_key_reply_has_no_prefix() {
        assert_eq!(ChatError::MissingApiKey.reply(), "Gemini API key not set.");
        assert!(ChatError::EmptyResponse.reply().starts_with("AI error: "));
    }
}
