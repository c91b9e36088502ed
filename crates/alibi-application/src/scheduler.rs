use alibi_core::clock::{ClockTick, Scheduler};
use std::time::Duration;
use tokio::sync::mpsc;

/// Delivers clock ticks into the runner's tick channel after a tokio sleep.
///
/// Must be used from inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    sender: mpsc::UnboundedSender<ClockTick>,
}

impl TokioScheduler {
    pub fn new(sender: mpsc::UnboundedSender<ClockTick>) -> Self {
        Self { sender }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, tick: ClockTick) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The runner may be gone; nothing to deliver to then.
            let _ = sender.send(tick);
        });
    }
}
