//! Turns session snapshots into terminal output.

use alibi_core::AlibiError;
use alibi_core::session::{CaseFile, EndReason, Role, SessionSnapshot, SessionState};
use colored::Colorize;

/// Response countdown values worth announcing while the player types.
const RESPONSE_WARNINGS: [u32; 3] = [30, 10, 5];

pub const INTRO_TEXT: &str = "\
You've been linked to a high-stakes robbery.
Your goal is to survive questioning until the clock runs out.

- The system already knows more than you think.
- Your story must be sharp, clear, and consistent.
- Contradict yourself, and you'll be exposed.

Last the full interrogation, and you walk free.";

/// Something the terminal should show the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Intro,
    Reviewing,
    CaseFile { role: Role, case_file: CaseFile },
    Question(String),
    Clock { total: u32, response: Option<u32> },
    Considering,
    Failure { error: AlibiError, opening: bool },
    Ended(EndReason),
}

/// Compares two snapshots and lists what changed for the player.
pub fn changes(prev: &SessionSnapshot, next: &SessionSnapshot) -> Vec<Notice> {
    let mut notices = Vec::new();
    let state_changed = prev.session_state != next.session_state;

    if state_changed {
        match next.session_state {
            SessionState::Intro => notices.push(Notice::Intro),
            SessionState::AwaitingFirstQuestion if next.last_error.is_none() => {
                notices.push(Notice::Reviewing)
            }
            SessionState::Evaluating => notices.push(Notice::Considering),
            _ => {}
        }
    }

    if prev.case_file.is_none() {
        if let Some(case_file) = &next.case_file {
            notices.push(Notice::CaseFile {
                role: next.profile.assigned_role,
                case_file: case_file.clone(),
            });
        }
    }

    let new_question = prev.current_question != next.current_question
        || (state_changed && prev.session_state == SessionState::AwaitingFirstQuestion);
    if next.session_state == SessionState::AwaitingAnswer && new_question {
        if let Some(question) = &next.current_question {
            notices.push(Notice::Question(question.clone()));
            notices.push(clock(next));
        }
    } else if next.session_state == SessionState::AwaitingAnswer
        && !next.is_first_question
        && prev.response_remaining_seconds != next.response_remaining_seconds
        && RESPONSE_WARNINGS.contains(&next.response_remaining_seconds)
    {
        notices.push(clock(next));
    }

    if prev.last_error != next.last_error {
        if let Some(error) = &next.last_error {
            notices.push(Notice::Failure {
                error: error.clone(),
                opening: next.session_state == SessionState::AwaitingFirstQuestion,
            });
        }
    }

    if let SessionState::Ended(reason) = next.session_state {
        if state_changed {
            notices.push(Notice::Ended(reason));
        }
    }

    notices
}

/// The clock line for the current snapshot.
pub fn clock(snapshot: &SessionSnapshot) -> Notice {
    Notice::Clock {
        total: snapshot.total_remaining_seconds,
        response: (!snapshot.is_first_question).then_some(snapshot.response_remaining_seconds),
    }
}

/// Formats seconds as `MM:SS`.
pub fn format_total(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn case_file_lines(role: Role, case_file: &CaseFile) -> Vec<String> {
    let mut lines = vec![format!("Your role: {role}")];
    if case_file.is_empty() {
        lines.push("The detective has not shared any case details.".to_string());
        return lines;
    }
    if !case_file.scenario_fields.is_empty() {
        lines.push("Case Details:".to_string());
        for (key, value) in &case_file.scenario_fields {
            lines.push(format!("   - {}: {}", capitalize(key), value));
        }
    }
    if !case_file.evidence_items.is_empty() {
        lines.push("Evidence:".to_string());
        for item in &case_file.evidence_items {
            lines.push(format!("   • {item}"));
        }
    }
    lines
}

pub fn clock_line(total: u32, response: Option<u32>) -> String {
    let response = match response {
        Some(seconds) => format!("Response Time: {seconds}s"),
        None => "Waiting for first answer...".to_string(),
    };
    format!("Total Time: {} | {}", format_total(total), response)
}

/// Renders a notice with terminal colors.
pub fn paint(notice: &Notice) -> String {
    match notice {
        Notice::Intro => format!(
            "{}\n\n{}\n\n{}",
            "=== ALIBI: The Interrogation Experience ===".bright_magenta().bold(),
            INTRO_TEXT,
            "Enter your name to begin.".bright_black()
        ),
        Notice::Reviewing => "The detective is reviewing your file...".bright_black().to_string(),
        Notice::CaseFile { role, case_file } => {
            let mut out = format!("{}\n", "INTERROGATION INITIATED".bright_red().bold());
            out.push_str(&case_file_lines(*role, case_file).join("\n").yellow().to_string());
            out
        }
        Notice::Question(question) => {
            format!("{}\n   {}", "Detective:".bright_magenta(), question.bright_blue())
        }
        Notice::Clock { total, response } => clock_line(*total, *response).cyan().to_string(),
        Notice::Considering => "The detective considers your answer...".bright_black().to_string(),
        Notice::Failure { error, opening } => {
            let hint = if *opening {
                "Type /retry to try again."
            } else {
                "Type your answer again to retry."
            };
            format!("{}\n{}", format!("Error: {error}").red(), hint.yellow())
        }
        Notice::Ended(reason) => format!(
            "\n{}\n\n{}\n\n{}",
            reason.headline().bright_red().bold(),
            reason.message(),
            "Play again? (y/n)".bright_black()
        ),
    }
}
