use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Public demo worker for the Atlas Sentinel evidence index. Used when the
/// config file does not override the endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://taxintegrity-chat-worker.samanyu-karanam.workers.dev/";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("worker error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// One evidence reference attached to an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub tag: String,
    pub source: String,
    pub page: Option<i64>,
    pub score: Option<f64>,
}

impl Citation {
    fn from_value(value: &Value) -> Self {
        Self {
            tag: str_field(value, "tag"),
            source: str_field(value, "source"),
            page: value.get("page").and_then(Value::as_i64),
            score: value.get("score").and_then(Value::as_f64),
        }
    }
}

/// Normalized result of one chat turn.
///
/// The worker's payload shape has drifted over time, so every field is
/// optional on the wire. Decoding applies a named default per field and never
/// fails: a partially-populated payload yields a fully-populated value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RagResponse {
    pub text: String,
    pub citations: Vec<Citation>,
    pub retrieved: u64,
    #[allow(dead_code)]
    pub used_general_knowledge: bool,
}

impl RagResponse {
    pub fn from_value(value: &Value) -> Self {
        let citations = value
            .get("citations")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(Citation::from_value).collect())
            .unwrap_or_default();

        Self {
            text: str_field(value, "text"),
            citations,
            retrieved: value.get("retrieved").and_then(Value::as_u64).unwrap_or(0),
            used_general_knowledge: value
                .get("used_general_knowledge")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Clone)]
pub struct SentinelClient {
    client: Client,
    endpoint: String,
}

impl SentinelClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one user message to the worker. A single attempt: no retry, no
    /// timeout, no cancellation. The caller is responsible for rejecting
    /// empty input before this is reached.
    pub async fn send(&self, message: &str) -> Result<RagResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        Ok(RagResponse::from_value(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ChatRequest {
            message: "What is the accuracy penalty?",
        })
        .unwrap();
        assert_eq!(body, json!({ "message": "What is the accuracy penalty?" }));
    }

    #[test]
    fn test_decode_full_payload() {
        let payload = json!({
            "text": "20% of the underpayment.",
            "citations": [
                { "tag": "#1", "source": "Pub5869", "page": 12, "score": 0.9 }
            ],
            "retrieved": 5,
            "used_general_knowledge": true
        });

        let response = RagResponse::from_value(&payload);
        assert_eq!(response.text, "20% of the underpayment.");
        assert_eq!(response.retrieved, 5);
        assert!(response.used_general_knowledge);
        assert_eq!(
            response.citations,
            vec![Citation {
                tag: "#1".to_string(),
                source: "Pub5869".to_string(),
                page: Some(12),
                score: Some(0.9),
            }]
        );
    }

    #[test]
    fn test_decode_empty_payload() {
        let response = RagResponse::from_value(&json!({}));
        assert_eq!(response.text, "");
        assert!(response.citations.is_empty());
        assert_eq!(response.retrieved, 0);
        assert!(!response.used_general_knowledge);
    }

    #[test]
    fn test_decode_non_numeric_retrieved() {
        let response = RagResponse::from_value(&json!({ "retrieved": "five" }));
        assert_eq!(response.retrieved, 0);
    }

    #[test]
    fn test_decode_citations_wrong_type() {
        let response = RagResponse::from_value(&json!({ "citations": "none" }));
        assert!(response.citations.is_empty());
    }

    #[test]
    fn test_decode_citation_missing_fields() {
        let payload = json!({ "citations": [{ "tag": "#2" }, 42] });
        let response = RagResponse::from_value(&payload);

        assert_eq!(response.citations.len(), 2);
        assert_eq!(response.citations[0].tag, "#2");
        assert_eq!(response.citations[0].source, "");
        assert_eq!(response.citations[0].page, None);
        // A non-object entry decodes to an all-default citation; the renderer
        // drops it for its empty tag.
        assert_eq!(response.citations[1].tag, "");
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let payload = json!({ "text": "Hello", "model_version": "v3" });
        let response = RagResponse::from_value(&payload);
        assert_eq!(response.text, "Hello");
    }
}
