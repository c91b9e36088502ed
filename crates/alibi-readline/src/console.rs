//! Interprets prompt input against the current session phase.

use alibi_application::SessionHandle;
use alibi_core::session::{Difficulty, SessionState};
use anyhow::Result;
use colored::Colorize;

use crate::command::{Command, HELP_TEXT};
use crate::view;

#[derive(Debug, Clone, PartialEq, Eq)]
enum IntroStep {
    Name,
    Difficulty { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    handle: SessionHandle,
    intro: IntroStep,
    details: Option<(String, Difficulty)>,
}

impl Console {
    pub fn new(handle: SessionHandle) -> Self {
        Self {
            handle,
            intro: IntroStep::Name,
            details: None,
        }
    }

    /// Prompt text for the next line of input.
    pub fn prompt(&self) -> String {
        match self.handle.snapshot().session_state {
            SessionState::Intro => match self.intro {
                IntroStep::Name => "Name: ".to_string(),
                IntroStep::Difficulty { .. } => "Difficulty [1-4]: ".to_string(),
            },
            SessionState::Ended(_) => "(y/n) ".to_string(),
            _ => ">> ".to_string(),
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let state = self.handle.snapshot().session_state;
        match Command::parse(line) {
            Some(Ok(command)) => return self.run_command(command).await,
            // While answering, unknown slash text is part of the answer.
            Some(Err(word)) if state != SessionState::AwaitingAnswer => {
                println!("{}", format!("Unknown command: {word}").bright_black());
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        match state {
            SessionState::Intro => self.intro_input(line).await?,
            SessionState::AwaitingFirstQuestion => {
                println!(
                    "{}",
                    "The detective hasn't asked anything yet. Type /retry if loading failed."
                        .bright_black()
                );
            }
            SessionState::AwaitingAnswer => {
                report(self.handle.submit_answer(line).await)?;
            }
            SessionState::Evaluating => {
                println!(
                    "{}",
                    "The detective is still considering your last answer.".bright_black()
                );
            }
            SessionState::Ended(_) => match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => self.restart().await?,
                "n" | "no" => return Ok(Flow::Quit),
                _ => println!("{}", "Play again? (y/n)".bright_black()),
            },
        }
        Ok(Flow::Continue)
    }

    async fn run_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Help => println!("{}", HELP_TEXT.bright_black()),
            Command::Status => {
                let snapshot = self.handle.snapshot();
                println!("{}", view::paint(&view::clock(&snapshot)));
            }
            Command::Retry => match self.details.clone() {
                Some((name, difficulty)) => {
                    report(self.handle.submit_player_info(&name, difficulty).await)?;
                }
                None => println!("{}", "Nothing to retry yet.".bright_black()),
            },
            Command::Restart => self.restart().await?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn intro_input(&mut self, line: &str) -> Result<()> {
        let input = line.trim();
        match std::mem::replace(&mut self.intro, IntroStep::Name) {
            IntroStep::Name => {
                if input.is_empty() {
                    println!("{}", "A name is required.".yellow());
                    return Ok(());
                }
                println!("{}", "Choose difficulty:".bright_black());
                for (index, difficulty) in Difficulty::ALL.iter().enumerate() {
                    println!("{}", format!("  {}. {}", index + 1, difficulty).bright_black());
                }
                self.intro = IntroStep::Difficulty {
                    name: input.to_string(),
                };
            }
            IntroStep::Difficulty { name } => {
                let difficulty = Difficulty::parse_lenient(input);
                let result = self.handle.submit_player_info(&name, difficulty).await;
                if result.is_ok() {
                    self.details = Some((name, difficulty));
                }
                report(result)?;
            }
        }
        Ok(())
    }

    async fn restart(&mut self) -> Result<()> {
        self.handle.restart().await?;
        self.intro = IntroStep::Name;
        self.details = None;
        Ok(())
    }
}

/// Prints rejected commands; anything else means the runner is gone.
fn report(result: alibi_core::error::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_invalid_input() => {
            println!("{}", err.to_string().yellow());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
