//! HttpInterrogator - REST client for the interrogation middleware.
//!
//! Sends the converse payload as JSON to a single endpoint and maps HTTP
//! outcomes onto the game's error kinds.

use alibi_core::config::GameConfig;
use alibi_core::error::{AlibiError, Result};
use alibi_core::interrogator::{ConverseRequest, ConverseResponse, RemoteInterrogator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::wire::{ConversePayload, ConverseReply, HealthStatus};

/// `RemoteInterrogator` implementation that talks to the middleware over HTTP.
#[derive(Clone)]
pub struct HttpInterrogator {
    client: Client,
    endpoint: String,
    health_url: String,
}

impl HttpInterrogator {
    /// Creates a client for `endpoint` with reqwest's default settings.
    pub fn new(endpoint: impl Into<String>, health_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            health_url: health_url.into(),
        }
    }

    /// Creates a client for the configured endpoint and request timeout.
    pub fn from_config(config: &GameConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| AlibiError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.middleware_url.clone(),
            health_url: config.health_url(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Probes the middleware health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlibiError::server(status.as_u16(), "health check failed"));
        }

        response.json::<HealthStatus>().await.map_err(|err| {
            AlibiError::server(status.as_u16(), format!("Malformed health response: {err}"))
        })
    }

    async fn send_request(&self, payload: &ConversePayload<'_>) -> Result<ConverseReply> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body_text = response.text().await.map_err(map_transport_error)?;
        tracing::debug!(status = status.as_u16(), body = %body_text, "converse reply");

        interpret_reply(status, &body_text)
    }
}

#[async_trait]
impl RemoteInterrogator for HttpInterrogator {
    async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse> {
        let payload = ConversePayload::from(&request);
        tracing::debug!(?payload, "sending converse payload");

        let mut reply = self.send_request(&payload).await?;
        let question_text = reply.response.take().unwrap_or_default();
        if question_text.trim().is_empty() {
            return Err(AlibiError::server(
                StatusCode::OK.as_u16(),
                "middleware reply contained no question",
            ));
        }

        let case_file = request.is_session_start.then(|| reply.case_file());
        Ok(ConverseResponse {
            question_text,
            case_file,
        })
    }
}

/// Maps status and body onto a reply or an error kind.
///
/// Only an `error` field equal to "Session not found" means the remote
/// conversation is gone; other error text is a plain server error.
fn interpret_reply(status: StatusCode, body: &str) -> Result<ConverseReply> {
    let parsed = serde_json::from_str::<ConverseReply>(body);

    if let Ok(reply) = &parsed {
        if reply.is_session_lost() {
            return Err(AlibiError::SessionLost);
        }
    }

    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|reply| reply.error)
            .unwrap_or_else(|| body.to_string());
        return Err(AlibiError::server(status.as_u16(), message));
    }

    let reply = parsed.map_err(|err| {
        AlibiError::server(status.as_u16(), format!("Malformed middleware reply: {err}"))
    })?;
    if let Some(error) = reply.error {
        return Err(AlibiError::server(status.as_u16(), error));
    }
    Ok(reply)
}

fn map_transport_error(err: reqwest::Error) -> AlibiError {
    if err.is_timeout() {
        AlibiError::Timeout
    } else {
        AlibiError::network(format!("Middleware request failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_found_on_error_status() {
        let err = interpret_reply(StatusCode::NOT_FOUND, r#"{"error":"Session not found"}"#)
            .unwrap_err();
        assert_eq!(err, AlibiError::SessionLost);
    }

    #[test]
    fn test_session_not_found_on_success_status() {
        let err = interpret_reply(StatusCode::OK, r#"{"error":"Session not found"}"#).unwrap_err();
        assert_eq!(err, AlibiError::SessionLost);
    }

    #[test]
    fn test_error_text_mentioning_phrase_is_not_session_lost() {
        let body = r#"{"error":"Failed to get response from AI","details":"Session not found"}"#;
        let err = interpret_reply(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        assert_eq!(
            err,
            AlibiError::server(500, "Failed to get response from AI")
        );
    }

    #[test]
    fn test_non_json_error_body_is_kept() {
        let err = interpret_reply(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert_eq!(err, AlibiError::server(502, "upstream down"));
    }

    #[test]
    fn test_malformed_success_body() {
        let err = interpret_reply(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, AlibiError::ServerError { status: 200, .. }));
    }

    #[test]
    fn test_plain_reply() {
        let reply = interpret_reply(StatusCode::OK, r#"{"response":"Where were you?"}"#).unwrap();
        assert_eq!(reply.response.as_deref(), Some("Where were you?"));
    }
}
