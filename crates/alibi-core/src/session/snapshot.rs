use serde::{Deserialize, Serialize};

use super::model::{CaseFile, PlayerProfile, SessionState};
use crate::error::AlibiError;

/// What a view needs to draw the session at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_state: SessionState,
    pub current_question: Option<String>,
    pub case_file: Option<CaseFile>,
    pub profile: PlayerProfile,
    pub total_remaining_seconds: u32,
    pub response_remaining_seconds: u32,
    /// True until the player answers the opening question; no clock runs meanwhile.
    pub is_first_question: bool,
    /// Most recent remote failure, cleared by the next successful step.
    pub last_error: Option<AlibiError>,
    /// Number of turns in the transcript.
    pub transcript_len: usize,
}
