//! JSON shapes exchanged with the interrogation middleware.

use alibi_core::interrogator::ConverseRequest;
use alibi_core::session::{CaseFile, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Error text the middleware uses when it no longer knows the conversation.
pub const SESSION_NOT_FOUND: &str = "Session not found";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConversePayload<'a> {
    player_name: &'a str,
    role: &'a str,
    difficulty: &'a str,
    conversation_history: Vec<HistoryEntry<'a>>,
    context: &'a [String],
    player_response: &'a str,
    start_interrogation: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryEntry<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Turn> for HistoryEntry<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            role: turn.speaker().as_str(),
            content: turn.text(),
        }
    }
}

impl<'a> From<&'a ConverseRequest> for ConversePayload<'a> {
    fn from(request: &'a ConverseRequest) -> Self {
        Self {
            player_name: &request.player_name,
            role: request.assigned_role.as_str(),
            difficulty: request.difficulty.as_str(),
            conversation_history: request
                .conversation_history
                .iter()
                .map(HistoryEntry::from)
                .collect(),
            context: &request.context,
            player_response: &request.player_response,
            start_interrogation: request.is_session_start,
        }
    }
}

/// Body of a converse reply. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConverseReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub scenario: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub evidence: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ConverseReply {
    pub fn is_session_lost(&self) -> bool {
        self.error.as_deref() == Some(SESSION_NOT_FOUND)
    }

    pub fn case_file(&mut self) -> CaseFile {
        let scenario_fields = self
            .scenario
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        CaseFile::new(scenario_fields, self.evidence.take().unwrap_or_default())
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub openai_configured: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alibi_core::session::{Difficulty, Role, Speaker};
    use serde_json::json;

    #[test]
    fn test_payload_field_names() {
        let request = ConverseRequest {
            player_name: "Al".to_string(),
            assigned_role: Role::InsideMan,
            difficulty: Difficulty::Hard,
            conversation_history: vec![
                Turn::new(Speaker::Detective, "Where were you?"),
                Turn::new(Speaker::Player, "Home"),
            ],
            context: vec!["Where were you?".to_string()],
            player_response: "Home".to_string(),
            is_session_start: false,
        };

        let value = serde_json::to_value(ConversePayload::from(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "playerName": "Al",
                "role": "Inside Man",
                "difficulty": "Hard",
                "conversationHistory": [
                    {"role": "detective", "content": "Where were you?"},
                    {"role": "player", "content": "Home"}
                ],
                "context": ["Where were you?"],
                "playerResponse": "Home",
                "startInterrogation": false
            })
        );
    }

    #[test]
    fn test_reply_with_null_scenario() {
        let mut reply: ConverseReply = serde_json::from_value(json!({
            "response": "Next question",
            "scenario": null,
            "evidence": ["a"],
            "difficulty": "Hard",
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let case_file = reply.case_file();
        assert!(case_file.scenario_fields.is_empty());
        assert_eq!(case_file.evidence_items, vec!["a".to_string()]);
        assert!(!reply.is_session_lost());
    }

    #[test]
    fn test_non_string_scenario_values_are_stringified() {
        let mut reply: ConverseReply = serde_json::from_value(json!({
            "response": "Q",
            "scenario": {"crime": "ATM Robbery", "floor": 3}
        }))
        .unwrap();

        let case_file = reply.case_file();
        assert_eq!(case_file.scenario_fields["crime"], "ATM Robbery");
        assert_eq!(case_file.scenario_fields["floor"], "3");
    }

    #[test]
    fn test_session_lost_requires_exact_text() {
        let lost = ConverseReply {
            error: Some("Session not found".to_string()),
            ..ConverseReply::default()
        };
        let other = ConverseReply {
            error: Some("Upstream said: Session not found for key".to_string()),
            ..ConverseReply::default()
        };
        assert!(lost.is_session_lost());
        assert!(!other.is_session_lost());
    }
}
