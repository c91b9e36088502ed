//! Contract with the remote question service.
//!
//! This module defines the `RemoteInterrogator` trait which is implemented
//! by the HTTP client in the `alibi-interaction` crate and by test doubles.

use crate::error::Result;
use crate::session::{CaseFile, Difficulty, Role, Turn};
use async_trait::async_trait;

/// Everything the remote service needs to produce the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverseRequest {
    pub player_name: String,
    pub assigned_role: Role,
    pub difficulty: Difficulty,
    pub conversation_history: Vec<Turn>,
    pub context: Vec<String>,
    pub player_response: String,
    pub is_session_start: bool,
}

/// A successful answer from the remote service.
///
/// `case_file` is only meaningful when the request started a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverseResponse {
    pub question_text: String,
    pub case_file: Option<CaseFile>,
}

impl ConverseResponse {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            question_text: text.into(),
            case_file: None,
        }
    }

    pub fn opening(text: impl Into<String>, case_file: CaseFile) -> Self {
        Self {
            question_text: text.into(),
            case_file: Some(case_file),
        }
    }
}

/// Request/response client for the question service.
///
/// Failures surface as `NetworkFailure`, `Timeout`, `ServerError`, or
/// `SessionLost`. Callers must treat every call as suspending.
#[async_trait]
pub trait RemoteInterrogator: Send + Sync {
    async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse>;
}
