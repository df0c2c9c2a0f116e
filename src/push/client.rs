use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::models::notification::NotificationType;

/// Payload pushed to devices: a display notification plus the data block the
/// mobile clients route taps with.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: PushData,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushData {
    pub notification_type: String,
    pub order_id: String,
    pub status: String,
    pub click_action: String,
}

impl PushMessage {
    pub fn order_event(
        title: impl Into<String>,
        body: impl Into<String>,
        notification_type: NotificationType,
        order_id: u64,
        status: &str,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: PushData {
                notification_type: notification_type.as_str().to_string(),
                order_id: order_id.to_string(),
                status: status.to_string(),
                click_action: "FLUTTER_NOTIFICATION_CLICK".to_string(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push transport error: {0}")]
    Transport(String),

    #[error("push provider rejected request: {0}")]
    Provider(String),
}

/// Provider error classification. Permanent kinds mean the registration is
/// gone for good and the token must be deactivated; transient kinds leave
/// the token active for the next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushErrorKind {
    Unregistered,
    InvalidToken,
    RateLimited,
    Unavailable,
}

impl PushErrorKind {
    pub fn is_permanent(self) -> bool {
        matches!(self, PushErrorKind::Unregistered | PushErrorKind::InvalidToken)
    }

    /// Maps a provider error string onto a kind. The matched fragments are
    /// the ones the push provider actually returns for dead registrations.
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("not-found")
            || lowered.contains("unregistered")
            || lowered.contains("requested entity was not found")
        {
            PushErrorKind::Unregistered
        } else if lowered.contains("invalid-registration") || lowered.contains("invalid-argument") {
            PushErrorKind::InvalidToken
        } else if lowered.contains("quota") || lowered.contains("rate") {
            PushErrorKind::RateLimited
        } else {
            PushErrorKind::Unavailable
        }
    }
}

/// Per-token result of one multicast send.
#[derive(Debug, Clone)]
pub struct TokenOutcome {
    pub token: String,
    pub error: Option<PushErrorKind>,
}

/// Outbound push transport. Constructed once at startup and injected into
/// the state; topic sends use a separate path that is never subject to
/// token deactivation.
#[async_trait]
pub trait PushClient: Send + Sync {
    async fn send_multicast(
        &self,
        message: &PushMessage,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, PushError>;

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<(), PushError>;
}

/// HTTP push client posting the provider's JSON API.
pub struct HttpPushClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MulticastResponse {
    results: Vec<SendResult>,
}

#[derive(Debug, Deserialize)]
struct SendResult {
    #[serde(default)]
    error: Option<String>,
}

impl HttpPushClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    async fn post(&self, body: serde_json::Value) -> Result<reqwest::Response, PushError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| PushError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(PushError::Provider(format!(
                "status {}",
                response.status()
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl PushClient for HttpPushClient {
    async fn send_multicast(
        &self,
        message: &PushMessage,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, PushError> {
        let body = json!({
            "tokens": tokens,
            "notification": { "title": message.title, "body": message.body },
            "data": message.data,
        });

        let response = self.post(body).await?;
        let parsed: MulticastResponse = response
            .json()
            .await
            .map_err(|err| PushError::Provider(err.to_string()))?;

        if parsed.results.len() != tokens.len() {
            return Err(PushError::Provider(format!(
                "expected {} results, got {}",
                tokens.len(),
                parsed.results.len()
            )));
        }

        Ok(tokens
            .iter()
            .zip(parsed.results)
            .map(|(token, result)| TokenOutcome {
                token: token.clone(),
                error: result.error.as_deref().map(PushErrorKind::classify),
            })
            .collect())
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<(), PushError> {
        let body = json!({
            "topic": topic,
            "notification": { "title": message.title, "body": message.body },
            "data": message.data,
        });

        self.post(body).await.map(|_| ())
    }
}

/// Stand-in used when no push endpoint is configured: reports success so the
/// rest of the fanout behaves exactly as in production.
pub struct NoopPushClient;

#[async_trait]
impl PushClient for NoopPushClient {
    async fn send_multicast(
        &self,
        message: &PushMessage,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, PushError> {
        debug!(title = %message.title, tokens = tokens.len(), "push disabled; multicast skipped");
        Ok(tokens
            .iter()
            .map(|token| TokenOutcome {
                token: token.clone(),
                error: None,
            })
            .collect())
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<(), PushError> {
        debug!(topic, title = %message.title, "push disabled; topic send skipped");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{PushClient, PushError, PushErrorKind, PushMessage, TokenOutcome};

    /// Records every send and fails configured tokens with configured kinds.
    #[derive(Default)]
    pub struct RecordingPushClient {
        pub failing_tokens: HashMap<String, PushErrorKind>,
        pub fail_transport: bool,
        pub multicasts: Mutex<Vec<(PushMessage, Vec<String>)>>,
        pub topic_sends: Mutex<Vec<(String, PushMessage)>>,
    }

    #[async_trait]
    impl PushClient for RecordingPushClient {
        async fn send_multicast(
            &self,
            message: &PushMessage,
            tokens: &[String],
        ) -> Result<Vec<TokenOutcome>, PushError> {
            if self.fail_transport {
                return Err(PushError::Transport("connection refused".to_string()));
            }

            self.multicasts
                .lock()
                .unwrap()
                .push((message.clone(), tokens.to_vec()));

            Ok(tokens
                .iter()
                .map(|token| TokenOutcome {
                    token: token.clone(),
                    error: self.failing_tokens.get(token).copied(),
                })
                .collect())
        }

        async fn send_to_topic(
            &self,
            topic: &str,
            message: &PushMessage,
        ) -> Result<(), PushError> {
            self.topic_sends
                .lock()
                .unwrap()
                .push((topic.to_string(), message.clone()));
            Ok(())
        }
    }
}
