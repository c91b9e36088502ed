//! Dual countdown engine.
//!
//! `SessionClock` owns two independent countdowns: the total session budget
//! and the per-question response budget. Time does not pass inside this
//! module. Each running countdown asks the injected [`Scheduler`] to deliver a
//! [`ClockTick`] one second later, and the owner feeds delivered ticks back
//! through [`SessionClock::on_tick`].
//!
//! A scheduler cannot take a tick back once it is handed over, so every tick
//! carries the epoch of the countdown that requested it. Stopping, pausing,
//! restarting, or cancelling a countdown bumps its epoch, and a delivered tick
//! whose epoch or countdown state no longer matches is dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Interval between two ticks of a running countdown.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Total,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
    Cancelled,
}

/// A scheduled wake-up for one countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub timer: TimerKind,
    pub epoch: u64,
}

/// Raised exactly once when a countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    TotalTimeExpired,
    ResponseTimeExpired,
}

/// Delivers ticks back to the clock owner after a delay.
///
/// Implementations only need fire-and-forget semantics; staleness is checked
/// by the clock on delivery.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, tick: ClockTick);
}

#[derive(Debug)]
struct Countdown {
    kind: TimerKind,
    budget: u32,
    remaining: u32,
    state: TimerState,
    epoch: u64,
}

impl Countdown {
    fn new(kind: TimerKind, budget: u32) -> Self {
        Self {
            kind,
            budget,
            remaining: budget,
            state: TimerState::Idle,
            epoch: 0,
        }
    }

    fn tick(&self) -> ClockTick {
        ClockTick {
            timer: self.kind,
            epoch: self.epoch,
        }
    }

    /// Starts a fresh tick chain, orphaning any tick already in flight.
    fn arm(&mut self, scheduler: &dyn Scheduler) {
        self.epoch += 1;
        self.state = TimerState::Running;
        scheduler.schedule(TICK_INTERVAL, self.tick());
    }

    fn halt(&mut self, state: TimerState) {
        self.epoch += 1;
        self.state = state;
    }

    fn reset(&mut self) {
        self.halt(TimerState::Idle);
        self.remaining = self.budget;
    }
}

pub struct SessionClock {
    total: Countdown,
    response: Countdown,
    scheduler: Arc<dyn Scheduler>,
}

impl SessionClock {
    pub fn new(total_seconds: u32, response_seconds: u32, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            total: Countdown::new(TimerKind::Total, total_seconds),
            response: Countdown::new(TimerKind::Response, response_seconds),
            scheduler,
        }
    }

    /// `Idle -> Running` for the total countdown. Returns whether it started.
    pub fn start_total(&mut self) -> bool {
        if self.total.state != TimerState::Idle {
            return false;
        }
        self.total.arm(self.scheduler.as_ref());
        tracing::debug!(remaining = self.total.remaining, "total clock started");
        true
    }

    /// Starts a new response countdown from the full budget, replacing any
    /// countdown already live.
    pub fn start_response(&mut self) {
        if self.response.state == TimerState::Cancelled {
            tracing::warn!("ignoring response clock start after cancellation");
            return;
        }
        self.response.remaining = self.response.budget;
        self.response.arm(self.scheduler.as_ref());
        tracing::debug!(remaining = self.response.remaining, "response clock started");
    }

    /// Stops the response countdown without raising an event.
    pub fn stop_response(&mut self) {
        if self.response.state == TimerState::Running {
            self.response.halt(TimerState::Idle);
        }
    }

    /// Freezes the total countdown at its current value.
    pub fn pause_total(&mut self) {
        if self.total.state == TimerState::Running {
            self.total.halt(TimerState::Paused);
        }
    }

    /// Continues a paused total countdown. Returns whether it resumed.
    pub fn resume_total(&mut self) -> bool {
        if self.total.state != TimerState::Paused {
            return false;
        }
        self.total.arm(self.scheduler.as_ref());
        true
    }

    /// Silences both countdowns for good. Idempotent.
    pub fn cancel_all(&mut self) {
        for countdown in [&mut self.total, &mut self.response] {
            if countdown.state != TimerState::Cancelled {
                countdown.halt(TimerState::Cancelled);
            }
        }
    }

    /// Returns both countdowns to `Idle` with full budgets.
    pub fn reset(&mut self) {
        self.total.reset();
        self.response.reset();
    }

    /// Applies one delivered tick. Stale ticks are ignored.
    pub fn on_tick(&mut self, tick: ClockTick) -> Option<ClockEvent> {
        let countdown = match tick.timer {
            TimerKind::Total => &mut self.total,
            TimerKind::Response => &mut self.response,
        };

        if countdown.state != TimerState::Running || countdown.epoch != tick.epoch {
            tracing::trace!(?tick, state = ?countdown.state, "dropping stale tick");
            return None;
        }

        countdown.remaining = countdown.remaining.saturating_sub(1);
        if countdown.remaining > 0 {
            self.scheduler.schedule(TICK_INTERVAL, tick);
            return None;
        }

        countdown.halt(TimerState::Expired);
        Some(match tick.timer {
            TimerKind::Total => ClockEvent::TotalTimeExpired,
            TimerKind::Response => ClockEvent::ResponseTimeExpired,
        })
    }

    /// Whether the total countdown will run out on its next tick, i.e. within
    /// the same one-second window as anything happening now.
    pub fn total_due_within_window(&self) -> bool {
        self.total.state == TimerState::Running && self.total.remaining <= 1
    }

    /// Expires a running total countdown immediately.
    pub fn expire_total_now(&mut self) -> bool {
        if self.total.state != TimerState::Running {
            return false;
        }
        self.total.remaining = 0;
        self.total.halt(TimerState::Expired);
        true
    }

    pub fn total_remaining(&self) -> u32 {
        self.total.remaining
    }

    pub fn response_remaining(&self) -> u32 {
        self.response.remaining
    }

    pub fn total_state(&self) -> TimerState {
        self.total.state
    }

    pub fn response_state(&self) -> TimerState {
        self.response.state
    }
}

/// Scheduler that only records what it was asked to deliver.
///
/// The owner decides when (and whether) each recorded tick is delivered,
/// which makes countdown behaviour reproducible without waiting.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<ClockTick>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every tick scheduled so far, in scheduling order.
    pub fn drain(&self) -> Vec<ClockTick> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, _delay: Duration, tick: ClockTick) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(tick);
        }
    }
}
