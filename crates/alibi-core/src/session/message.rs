//! Conversation turn types.
//!
//! This module contains types for representing single utterances in an
//! interrogation transcript.

use serde::{Deserialize, Serialize};

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// A question posed by the remote interrogator.
    Detective,
    /// An answer given by the player (or the no-answer sentinel).
    Player,
}

impl Speaker {
    /// Name used on the wire and in transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Detective => "detective",
            Speaker::Player => "player",
        }
    }
}

/// A single utterance in the transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
