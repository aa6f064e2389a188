//! Remote policy and feedback REST contract.
//!
//! The server delivers a namespaced config document; only the `ruzd`
//! namespace concerns this SDK. A document without a readable `tracking`
//! flag is invalid and reported as an error — the gate then fails open.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use ruzd_core::ids::PlayerId;
use ruzd_core::level::TrackingLevel;

/// Default policy/feedback API endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://harbor.ruzd.net";

/// Bounded timeout for policy/feedback requests, owned by this client.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Remote policy/feedback call failures.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Transport-level failure (connect, timeout, body decode).
    #[error("policy transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("policy endpoint returned status {0}")]
    Status(u16),
    /// The document arrived but carries no usable tracking flag.
    #[error("invalid policy document: {0}")]
    Invalid(String),
}

/// Resolved remote tracking policy.
#[derive(Clone, Debug, PartialEq)]
pub struct RemotePolicy {
    /// Whether the server allows tracking at all.
    pub enabled: bool,
    /// Severity threshold events must meet.
    pub level: TrackingLevel,
    /// Server-provided collector endpoint, used when the host gave none.
    pub endpoint: Option<String>,
}

/// Feedback record posted to the API.
#[derive(Clone, Debug, Serialize)]
pub struct FeedbackRecord {
    /// User rating.
    pub rating: i32,
    /// Player/install id.
    pub user_id: PlayerId,
    /// Free-text message, already truncated by the gate.
    pub message: Option<String>,
    /// Extra key-value context (session id, run id, host extras).
    pub context: HashMap<String, String>,
}

/// REST contract for remote policy and feedback.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Fetch the remote tracking policy for a game.
    async fn fetch_policy(
        &self,
        game_id: &str,
        sdk: &str,
        build: &str,
        player_id: &PlayerId,
    ) -> Result<RemotePolicy, PolicyError>;

    /// Post a user feedback record.
    async fn post_feedback(
        &self,
        game_id: &str,
        sdk: &str,
        build: &str,
        feedback: &FeedbackRecord,
    ) -> Result<(), PolicyError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RemoteConfigDoc {
    #[serde(default)]
    #[allow(dead_code)]
    id: Option<String>,
    #[serde(default)]
    namespaces: Vec<NamespaceDoc>,
}

#[derive(Debug, Deserialize)]
struct NamespaceDoc {
    name: String,
    #[serde(default)]
    config: HashMap<String, AttributeDoc>,
}

/// One typed attribute: `{"type": "boolean", "value": true}`.
#[derive(Debug, Deserialize)]
struct AttributeDoc {
    #[serde(rename = "type")]
    kind: String,
    value: Value,
}

impl AttributeDoc {
    fn as_bool(&self) -> Option<bool> {
        (self.kind == "boolean").then(|| self.value.as_bool()).flatten()
    }

    fn as_i64(&self) -> Option<i64> {
        (self.kind == "integer").then(|| self.value.as_i64()).flatten()
    }

    fn as_str(&self) -> Option<&str> {
        (self.kind == "string").then(|| self.value.as_str()).flatten()
    }
}

impl RemoteConfigDoc {
    fn attribute(&self, key: &str) -> Option<&AttributeDoc> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == "ruzd")
            .and_then(|ns| ns.config.get(key))
    }
}

impl RemotePolicy {
    fn from_document(doc: &RemoteConfigDoc) -> Result<Self, PolicyError> {
        let enabled = doc
            .attribute("tracking")
            .and_then(AttributeDoc::as_bool)
            .ok_or_else(|| PolicyError::Invalid("no readable `tracking` flag".into()))?;

        let level = doc
            .attribute("tracking_level")
            .and_then(AttributeDoc::as_i64)
            .map_or(TrackingLevel::default(), |raw| {
                TrackingLevel::try_from(raw.clamp(0, u8::MAX.into()) as u8).unwrap_or_else(|e| {
                    warn!(raw, error = %e, "unknown tracking level in policy, using default");
                    TrackingLevel::default()
                })
            });

        let endpoint = doc
            .attribute("tracking_endpoint")
            .and_then(AttributeDoc::as_str)
            .map(str::to_string);

        Ok(Self {
            enabled,
            level,
            endpoint,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Production policy client over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPolicyClient {
    client: reqwest::Client,
    base: String,
}

impl HttpPolicyClient {
    /// Client against the default API endpoint.
    pub fn new() -> Result<Self, PolicyError> {
        Self::with_endpoint(DEFAULT_API_ENDPOINT)
    }

    /// Client against a custom API endpoint (staging, tests).
    pub fn with_endpoint(base: impl Into<String>) -> Result<Self, PolicyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base: base.into(),
        })
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn fetch_policy(
        &self,
        game_id: &str,
        sdk: &str,
        build: &str,
        player_id: &PlayerId,
    ) -> Result<RemotePolicy, PolicyError> {
        let url = format!("{}/v0/game/{game_id}/config", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[("sdk", sdk), ("build", build), ("user_id", player_id.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PolicyError::Status(response.status().as_u16()));
        }

        let doc: RemoteConfigDoc = response.json().await?;
        let policy = RemotePolicy::from_document(&doc)?;
        debug!(
            enabled = policy.enabled,
            level = %policy.level,
            endpoint = policy.endpoint.as_deref().unwrap_or("-"),
            "remote tracking policy fetched"
        );
        Ok(policy)
    }

    async fn post_feedback(
        &self,
        game_id: &str,
        sdk: &str,
        build: &str,
        feedback: &FeedbackRecord,
    ) -> Result<(), PolicyError> {
        let url = format!("{}/v0/game/{game_id}/feedback", self.base);
        let response = self
            .client
            .post(&url)
            .query(&[("sdk", sdk), ("build", build)])
            .json(feedback)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PolicyError::Status(response.status().as_u16()));
        }
        debug!("feedback posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn policy_document(tracking: Value) -> Value {
        json!({
            "id": "cfg-1",
            "namespaces": [
                {
                    "name": "other",
                    "config": { "tracking": { "type": "boolean", "value": false } }
                },
                {
                    "name": "ruzd",
                    "config": {
                        "tracking": tracking,
                        "tracking_level": { "type": "integer", "value": 3 },
                        "tracking_endpoint": { "type": "string", "value": "https://events.example.com" }
                    }
                }
            ]
        })
    }

    fn client_for(server: &MockServer) -> HttpPolicyClient {
        HttpPolicyClient::with_endpoint(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn fetch_parses_the_ruzd_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/game/test-game-id/config"))
            .and(query_param("sdk", "ruzd-rs-test"))
            .and(query_param("build", "1.2.3"))
            .and(query_param("user_id", "player-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(policy_document(json!({ "type": "boolean", "value": true }))),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let policy = client
            .fetch_policy("test-game-id", "ruzd-rs-test", "1.2.3", &PlayerId::from("player-1"))
            .await
            .unwrap();

        assert_eq!(
            policy,
            RemotePolicy {
                enabled: true,
                level: TrackingLevel::Important,
                endpoint: Some("https://events.example.com".into()),
            }
        );
    }

    #[tokio::test]
    async fn missing_tracking_flag_is_invalid() {
        let server = MockServer::start().await;
        // Type says string, so the boolean accessor sees nothing usable.
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(policy_document(json!({ "type": "string", "value": "yes" }))),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .fetch_policy("test-game-id", "sdk", "b", &PlayerId::from("p"))
            .await;
        assert_matches!(result, Err(PolicyError::Invalid(_)));
    }

    #[tokio::test]
    async fn unknown_level_falls_back_to_default() {
        let server = MockServer::start().await;
        let mut doc = policy_document(json!({ "type": "boolean", "value": true }));
        doc["namespaces"][1]["config"]["tracking_level"] = json!({ "type": "integer", "value": 42 });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let policy = client
            .fetch_policy("test-game-id", "sdk", "b", &PlayerId::from("p"))
            .await
            .unwrap();
        assert_eq!(policy.level, TrackingLevel::Normal);
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .fetch_policy("test-game-id", "sdk", "b", &PlayerId::from("p"))
            .await;
        assert_matches!(result, Err(PolicyError::Status(500)));
    }

    #[tokio::test]
    async fn garbage_body_maps_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .fetch_policy("test-game-id", "sdk", "b", &PlayerId::from("p"))
            .await;
        assert_matches!(result, Err(PolicyError::Transport(_)));
    }

    #[tokio::test]
    async fn feedback_posts_the_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v0/game/test-game-id/feedback"))
            .and(query_param("sdk", "ruzd-rs-test"))
            .and(body_partial_json(json!({
                "rating": 5,
                "user_id": "player-1",
                "message": "great",
                "context": { "session_id": "s1" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let feedback = FeedbackRecord {
            rating: 5,
            user_id: PlayerId::from("player-1"),
            message: Some("great".into()),
            context: HashMap::from([("session_id".to_string(), "s1".to_string())]),
        };
        client
            .post_feedback("test-game-id", "ruzd-rs-test", "1.0", &feedback)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_feedback_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let feedback = FeedbackRecord {
            rating: 1,
            user_id: PlayerId::from("p"),
            message: None,
            context: HashMap::new(),
        };
        let result = client.post_feedback("test-game-id", "s", "b", &feedback).await;
        assert_matches!(result, Err(PolicyError::Status(400)));
    }
}
