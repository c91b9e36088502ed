use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;

use alibi_application::SessionRunner;
use alibi_core::config::GameConfig;
use alibi_core::outcome::PhraseClassifier;
use alibi_core::session::SessionSnapshot;
use alibi_interaction::HttpInterrogator;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

mod command;
mod console;
mod helper;
mod view;

use console::{Console, Flow};
use helper::CliHelper;
use view::Notice;

#[derive(Parser)]
#[command(name = "alibi")]
#[command(about = "ALIBI - survive an AI interrogation from your terminal", long_about = None)]
struct Cli {
    /// Interrogation endpoint URL
    #[arg(long)]
    url: Option<String>,

    /// Total interrogation budget in seconds
    #[arg(long)]
    total_seconds: Option<u32>,

    /// Seconds allowed per answer
    #[arg(long)]
    response_seconds: Option<u32>,

    /// Configuration file (default: ~/.config/alibi/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tracing filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// End the interrogation when an answer times out instead of submitting no answer
    #[arg(long)]
    no_auto_submit: bool,
}

enum InputEvent {
    Line(String),
    Interrupted,
    Eof,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(&config.log_level);
    tracing::debug!(?config, "configuration resolved");

    let interrogator = Arc::new(HttpInterrogator::from_config(&config)?);
    probe_health(&interrogator).await;

    let (handle, runner) =
        SessionRunner::spawn(config, interrogator, Arc::new(PhraseClassifier::new()));
    let renderer = tokio::spawn(render(handle.subscribe()));

    let (prompt_tx, mut events) = spawn_input_thread()?;
    let mut console = Console::new(handle);
    println!("{}", view::paint(&Notice::Intro));
    println!();

    loop {
        if prompt_tx.send(console.prompt()).is_err() {
            break;
        }
        let Some(event) = events.recv().await else {
            break;
        };

        match event {
            InputEvent::Line(line) => {
                if console.handle_line(&line).await? == Flow::Quit {
                    break;
                }
            }
            InputEvent::Interrupted => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            InputEvent::Eof => break,
        }
    }

    println!("{}", "Goodbye!".bright_green());

    // Dropping the last handle stops the runner, which closes the snapshot channel.
    drop(console);
    drop(prompt_tx);
    let _ = runner.await;
    let _ = renderer.await;

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = GameConfig::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => GameConfig::load()?,
    };

    if let Some(url) = &cli.url {
        config.middleware_url = url.clone();
    }
    if let Some(seconds) = cli.total_seconds {
        config.total_seconds = seconds;
    }
    if let Some(seconds) = cli.response_seconds {
        config.response_seconds = seconds;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.no_auto_submit {
        config.auto_submit_on_timeout = false;
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn probe_health(interrogator: &HttpInterrogator) {
    match interrogator.health().await {
        Ok(health) if health.is_ok() => {
            tracing::debug!(openai_configured = health.openai_configured, "middleware healthy");
            if !health.openai_configured {
                println!(
                    "{}",
                    "Warning: the interrogation service reports no AI backend configured.".yellow()
                );
            }
        }
        Ok(health) => {
            tracing::warn!(status = %health.status, "middleware reports a degraded status");
            println!(
                "{}",
                format!("Warning: interrogation service status is '{}'.", health.status).yellow()
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, endpoint = interrogator.endpoint(), "health probe failed");
            println!(
                "{}",
                format!("Warning: could not reach the interrogation service ({err}).").yellow()
            );
        }
    }
}

/// Prints what changed each time the runner publishes a snapshot.
async fn render(mut snapshots: watch::Receiver<SessionSnapshot>) {
    let mut previous = snapshots.borrow_and_update().clone();
    while snapshots.changed().await.is_ok() {
        let current = snapshots.borrow_and_update().clone();
        for notice in view::changes(&previous, &current) {
            println!("{}", view::paint(&notice));
        }
        previous = current;
    }
}

/// Runs the blocking line editor on its own thread.
///
/// Each prompt sent in yields exactly one `InputEvent` back.
fn spawn_input_thread() -> Result<(std_mpsc::Sender<String>, mpsc::UnboundedReceiver<InputEvent>)>
{
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    let (prompt_tx, prompt_rx) = std_mpsc::channel::<String>();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        while let Ok(prompt) = prompt_rx.recv() {
            let event = match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    InputEvent::Line(line)
                }
                Err(ReadlineError::Interrupted) => InputEvent::Interrupted,
                Err(ReadlineError::Eof) => InputEvent::Eof,
                Err(err) => {
                    eprintln!("{}", format!("Error: {err:?}").red());
                    InputEvent::Eof
                }
            };
            if event_tx.send(event).is_err() {
                break;
            }
        }
    });

    Ok((prompt_tx, event_rx))
}
