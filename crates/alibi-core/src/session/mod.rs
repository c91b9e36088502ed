//! Interrogation session domain module.
//!
//! # Module Structure
//!
//! - `message`: transcript turns (`Speaker`, `Turn`)
//! - `log`: append-only transcript and question context (`ConversationLog`)
//! - `model`: profile, case file and state types (`PlayerProfile`, `CaseFile`, `SessionState`)
//! - `snapshot`: read-only view state (`SessionSnapshot`)
//! - `machine`: the turn-taking state machine (`InterrogationSession`)

mod log;
mod machine;
mod message;
mod model;
mod snapshot;

pub use log::ConversationLog;
pub use machine::{InterrogationSession, RequestId, SessionEffect};
pub use message::{Speaker, Turn};
pub use model::{CaseFile, Difficulty, EndReason, PlayerProfile, Role, SessionState};
pub use snapshot::SessionSnapshot;
