use alibi_core::error::{AlibiError, Result};
use alibi_core::session::{Difficulty, SessionSnapshot};
use tokio::sync::{mpsc, oneshot, watch};

/// Requests a view can make of the session.
#[derive(Debug)]
pub enum SessionCommand {
    SubmitPlayerInfo {
        name: String,
        difficulty: Difficulty,
        reply: oneshot::Sender<Result<()>>,
    },
    SubmitAnswer {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Restart {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// A view's connection to a running session.
///
/// Commands are queued to the runner and answered once applied. State
/// changes are published as [`SessionSnapshot`]s on a watch channel.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<SessionCommand>,
        snapshots: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            commands,
            snapshots,
        }
    }

    pub async fn submit_player_info(&self, name: &str, difficulty: Difficulty) -> Result<()> {
        self.request(|reply| SessionCommand::SubmitPlayerInfo {
            name: name.to_string(),
            difficulty,
            reply,
        })
        .await
    }

    /// Submits the player's raw input as the answer to the current question.
    pub async fn submit_answer(&self, text: &str) -> Result<()> {
        self.request(|reply| SessionCommand::SubmitAnswer {
            text: text.to_string(),
            reply,
        })
        .await
    }

    pub async fn restart(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Restart { reply }).await
    }

    /// A receiver that observes every published snapshot from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    async fn request<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(oneshot::Sender<Result<()>>) -> SessionCommand,
    {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| runner_stopped())?;
        response.await.map_err(|_| runner_stopped())?
    }
}

fn runner_stopped() -> AlibiError {
    AlibiError::internal("session runner has stopped")
}
