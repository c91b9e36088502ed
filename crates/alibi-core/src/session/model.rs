//! Session domain model.
//!
//! Player profile, case file, and the session state enumeration.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scenario and evidence handed out by the remote service when a session starts.
///
/// Populated once from the first response and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFile {
    /// Scenario facts keyed by name (crime, location, time, method, ...)
    pub scenario_fields: BTreeMap<String, String>,
    /// Evidence items in the order the service listed them
    pub evidence_items: Vec<String>,
}

impl CaseFile {
    pub fn new(scenario_fields: BTreeMap<String, String>, evidence_items: Vec<String>) -> Self {
        Self {
            scenario_fields,
            evidence_items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scenario_fields.is_empty() && self.evidence_items.is_empty()
    }
}

/// Interrogation difficulty chosen by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    /// Parses a menu number (1-4) or a name. Anything unrecognised is `Normal`.
    pub fn parse_lenient(input: &str) -> Self {
        let input = input.trim();
        match input.parse::<usize>() {
            Ok(n @ 1..=4) => return Self::ALL[n - 1],
            Ok(_) => return Self::Normal,
            Err(_) => {}
        }
        match input.to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            "expert" => Difficulty::Expert,
            _ => Difficulty::Normal,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part the player is suspected of having played in the heist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Driver,
    Lookout,
    Hacker,
    Muscle,
    InsideMan,
    Mastermind,
    TechSpecialist,
    DemolitionsExpert,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Driver,
        Role::Lookout,
        Role::Hacker,
        Role::Muscle,
        Role::InsideMan,
        Role::Mastermind,
        Role::TechSpecialist,
        Role::DemolitionsExpert,
    ];

    /// Picks a role uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Role::Driver)
    }

    /// Name used on the wire and on screen.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "Driver",
            Role::Lookout => "Lookout",
            Role::Hacker => "Hacker",
            Role::Muscle => "Muscle",
            Role::InsideMan => "Inside Man",
            Role::Mastermind => "Mastermind",
            Role::TechSpecialist => "Tech Specialist",
            Role::DemolitionsExpert => "Demolitions Expert",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is being interrogated and under which rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub difficulty: Difficulty,
    pub assigned_role: Role,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The total clock ran out; the player walks free.
    PlayerSurvived,
    /// The detective declared a contradiction.
    PlayerCaught,
    /// The response clock ran out and auto-submission is disabled.
    PlayerTimedOutMidSession,
}

impl EndReason {
    pub fn headline(&self) -> &'static str {
        match self {
            EndReason::PlayerCaught => "CAUGHT BY AI!",
            EndReason::PlayerSurvived => "INTERROGATION SURVIVED!",
            EndReason::PlayerTimedOutMidSession => "TIME'S UP!",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EndReason::PlayerCaught => {
                "The AI detective has caught you in a lie!\n\nYou've been exposed and arrested."
            }
            EndReason::PlayerSurvived => {
                "Congratulations! You've survived the full interrogation.\n\nYou walk free!"
            }
            EndReason::PlayerTimedOutMidSession => {
                "You ran out of time to answer.\n\nThe interrogation continues..."
            }
        }
    }
}

/// The live phase of an interrogation. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionState {
    /// Waiting for name and difficulty.
    Intro,
    /// The opening request is in flight, or failed and awaits a retry.
    AwaitingFirstQuestion,
    /// A question is on screen and the player may answer.
    AwaitingAnswer,
    /// An answer was sent and the next question is in flight.
    Evaluating,
    /// Terminal until restart.
    Ended(EndReason),
}

impl SessionState {
    pub fn is_ended(&self) -> bool {
        matches!(self, SessionState::Ended(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_difficulty_parse_lenient() {
        assert_eq!(Difficulty::parse_lenient("1"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_lenient("4"), Difficulty::Expert);
        assert_eq!(Difficulty::parse_lenient(" hard "), Difficulty::Hard);
        assert_eq!(Difficulty::parse_lenient("Medium"), Difficulty::Normal);
        assert_eq!(Difficulty::parse_lenient("9"), Difficulty::Normal);
        assert_eq!(Difficulty::parse_lenient(""), Difficulty::Normal);
    }

    #[test]
    fn test_random_role_covers_the_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<Role> = (0..500).map(|_| Role::random(&mut rng)).collect();
        assert_eq!(seen.len(), Role::ALL.len());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::InsideMan.as_str(), "Inside Man");
        assert_eq!(Role::DemolitionsExpert.to_string(), "Demolitions Expert");
    }
}
