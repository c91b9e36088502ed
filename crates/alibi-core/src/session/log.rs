//! Append-only transcript bookkeeping.

use super::message::{Speaker, Turn};

/// Ordered transcript of detective/player turns plus the question-only
/// context view that is sent alongside it.
///
/// Both sequences only grow during a session; [`ConversationLog::reset`]
/// is the single way to shrink them and clears both together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    context: Vec<String>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one turn to the transcript.
    pub fn append_turn(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn::new(speaker, text));
    }

    /// Appends a detective question followed by the player's answer.
    pub fn append_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.append_turn(Speaker::Detective, question);
        self.append_turn(Speaker::Player, answer);
    }

    /// Records a newly posed question in the context view.
    pub fn record_question(&mut self, question: impl Into<String>) {
        self.context.push(question.into());
    }

    /// Read-only copy of the transcript for transmission.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Read-only copy of the question-only context.
    pub fn context_snapshot(&self) -> Vec<String> {
        self.context.clone()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.context.is_empty()
    }

    /// Clears the transcript and the context view together.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.context.clear();
    }
}
