//! The interrogation state machine.
//!
//! `InterrogationSession` is synchronous and owns every piece of session
//! data. It never performs I/O itself: operations that need the remote
//! service return [`SessionEffect`]s, and the driver feeds completions back
//! through [`InterrogationSession::on_converse_result`]. Clock ticks arrive
//! through [`InterrogationSession::on_tick`]. The driver must call these
//! methods from one place, one at a time.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::log::ConversationLog;
use super::model::{CaseFile, Difficulty, EndReason, PlayerProfile, Role, SessionState};
use super::snapshot::SessionSnapshot;
use crate::clock::{ClockEvent, ClockTick, Scheduler, SessionClock, TimerState};
use crate::config::GameConfig;
use crate::error::{AlibiError, Result};
use crate::interrogator::{ConverseRequest, ConverseResponse};
use crate::outcome::{OutcomeClassifier, Verdict};

/// Identifies one remote call so late completions can be recognised.
pub type RequestId = u64;

/// Work the driver must carry out on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Issue a remote call and report its outcome with the same id.
    Converse {
        id: RequestId,
        request: ConverseRequest,
    },
    /// The call with this id is no longer wanted.
    Abort { id: RequestId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Opening,
    Resync,
    Answer,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: RequestId,
    kind: CallKind,
}

pub struct InterrogationSession {
    config: GameConfig,
    state: SessionState,
    profile: PlayerProfile,
    case_file: Option<CaseFile>,
    log: ConversationLog,
    current_question: Option<String>,
    is_first_question: bool,
    clock: SessionClock,
    classifier: Arc<dyn OutcomeClassifier>,
    rng: StdRng,
    next_request_id: RequestId,
    in_flight: Option<InFlight>,
    last_error: Option<AlibiError>,
}

impl InterrogationSession {
    pub fn new(
        config: GameConfig,
        scheduler: Arc<dyn Scheduler>,
        classifier: Arc<dyn OutcomeClassifier>,
    ) -> Self {
        Self::with_rng(config, scheduler, classifier, StdRng::from_entropy())
    }

    /// Like [`InterrogationSession::new`] with a caller-provided role generator.
    pub fn with_rng(
        config: GameConfig,
        scheduler: Arc<dyn Scheduler>,
        classifier: Arc<dyn OutcomeClassifier>,
        mut rng: StdRng,
    ) -> Self {
        let clock = SessionClock::new(config.total_seconds, config.response_seconds, scheduler);
        let profile = fresh_profile(&mut rng);
        Self {
            config,
            state: SessionState::Intro,
            profile,
            case_file: None,
            log: ConversationLog::new(),
            current_question: None,
            is_first_question: true,
            clock,
            classifier,
            rng,
            next_request_id: 0,
            in_flight: None,
            last_error: None,
        }
    }

    // ============================================================================
    // Commands
    // ============================================================================

    /// Starts the interrogation for `name` at `difficulty`.
    ///
    /// Accepted in `Intro`, and in `AwaitingFirstQuestion` as a retry once
    /// the previous opening call has failed. A retry keeps the assigned role.
    pub fn submit_player_info(
        &mut self,
        name: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<SessionEffect>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AlibiError::invalid_input("a name is required"));
        }

        let kind = match self.state {
            SessionState::Intro => {
                self.profile.assigned_role = Role::random(&mut self.rng);
                CallKind::Opening
            }
            SessionState::AwaitingFirstQuestion if self.in_flight.is_none() => {
                if self.clock.total_state() == TimerState::Idle {
                    CallKind::Opening
                } else {
                    // The total clock runs while any call is in flight.
                    self.clock.resume_total();
                    CallKind::Resync
                }
            }
            _ => {
                return Err(AlibiError::invalid_input(
                    "player details can only be entered before the interrogation starts",
                ));
            }
        };

        self.profile.name = name.to_string();
        self.profile.difficulty = difficulty;
        self.last_error = None;
        self.state = SessionState::AwaitingFirstQuestion;
        tracing::info!(
            name = %self.profile.name,
            role = %self.profile.assigned_role,
            difficulty = %self.profile.difficulty,
            "starting interrogation"
        );

        Ok(vec![self.issue(kind, String::new())])
    }

    /// Submits the player's literal answer to the current question.
    pub fn submit_answer(&mut self, text: &str) -> Result<Vec<SessionEffect>> {
        if self.state != SessionState::AwaitingAnswer || self.in_flight.is_some() {
            return Err(AlibiError::invalid_input(
                "there is no question waiting for an answer",
            ));
        }
        Ok(self.evaluate(text.to_string()))
    }

    /// Discards everything and returns to `Intro` with a new random role.
    pub fn restart(&mut self) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        if let Some(call) = self.in_flight.take() {
            effects.push(SessionEffect::Abort { id: call.id });
        }

        self.clock.cancel_all();
        self.clock.reset();
        self.log.reset();
        self.profile = fresh_profile(&mut self.rng);
        self.case_file = None;
        self.current_question = None;
        self.is_first_question = true;
        self.last_error = None;
        self.state = SessionState::Intro;
        tracing::info!("session restarted");

        effects
    }

    // ============================================================================
    // Driver callbacks
    // ============================================================================

    /// Applies a delivered clock tick.
    pub fn on_tick(&mut self, tick: ClockTick) -> Vec<SessionEffect> {
        if self.state.is_ended() {
            return Vec::new();
        }

        match self.clock.on_tick(tick) {
            None => Vec::new(),
            Some(ClockEvent::TotalTimeExpired) => self.end(EndReason::PlayerSurvived),
            Some(ClockEvent::ResponseTimeExpired) => self.on_response_expired(),
        }
    }

    /// Applies the outcome of the remote call `id`.
    ///
    /// Completions for calls that were aborted or superseded are dropped.
    pub fn on_converse_result(
        &mut self,
        id: RequestId,
        result: Result<ConverseResponse>,
    ) -> Vec<SessionEffect> {
        let call = match self.in_flight {
            Some(call) if call.id == id => call,
            _ => {
                tracing::debug!(id, "discarding result of a call that is no longer pending");
                return Vec::new();
            }
        };
        self.in_flight = None;

        match (call.kind, result) {
            (CallKind::Opening | CallKind::Resync, Ok(response)) => {
                self.on_opening(call.kind, response);
                Vec::new()
            }
            (CallKind::Opening | CallKind::Resync, Err(err)) => {
                tracing::warn!(error = %err, "opening question failed");
                self.clock.pause_total();
                self.last_error = Some(err);
                Vec::new()
            }
            (CallKind::Answer, Ok(response)) => self.on_next_question(response),
            (CallKind::Answer, Err(err)) if err.is_session_lost() => {
                tracing::warn!("remote session lost, restarting the conversation");
                self.log.reset();
                self.state = SessionState::AwaitingFirstQuestion;
                vec![self.issue(CallKind::Resync, String::new())]
            }
            (CallKind::Answer, Err(err)) => {
                tracing::warn!(error = %err, "evaluation failed, waiting for a retry");
                self.clock.pause_total();
                self.state = SessionState::AwaitingAnswer;
                self.last_error = Some(err);
                Vec::new()
            }
        }
    }

    // ============================================================================
    // Transitions
    // ============================================================================

    fn evaluate(&mut self, answer: String) -> Vec<SessionEffect> {
        self.clock.stop_response();
        self.clock.resume_total();

        let question = self.current_question.clone().unwrap_or_default();
        self.log.append_exchange(question, answer.clone());
        self.is_first_question = false;
        self.last_error = None;
        self.state = SessionState::Evaluating;
        tracing::debug!(turns = self.log.len(), "answer recorded");

        vec![self.issue(CallKind::Answer, answer)]
    }

    fn on_response_expired(&mut self) -> Vec<SessionEffect> {
        // Both clocks running out together always counts as surviving.
        if self.clock.total_due_within_window() {
            self.clock.expire_total_now();
            return self.end(EndReason::PlayerSurvived);
        }
        if self.state != SessionState::AwaitingAnswer {
            return Vec::new();
        }
        if !self.config.auto_submit_on_timeout {
            return self.end(EndReason::PlayerTimedOutMidSession);
        }

        tracing::info!("response time expired, submitting no answer");
        let sentinel = self.config.no_answer_sentinel.clone();
        self.evaluate(sentinel)
    }

    fn on_opening(&mut self, kind: CallKind, response: ConverseResponse) {
        if self.case_file.is_none() {
            self.case_file = Some(response.case_file.unwrap_or_default());
        }
        self.pose_question(response.question_text);

        // After a resync the player keeps playing against the running clock.
        if kind == CallKind::Resync && self.clock.total_state() != TimerState::Idle {
            self.clock.resume_total();
            self.clock.start_response();
            self.is_first_question = false;
        } else {
            self.is_first_question = true;
        }
        self.last_error = None;
        self.state = SessionState::AwaitingAnswer;
        tracing::info!(resync = kind == CallKind::Resync, "first question posed");
    }

    fn on_next_question(&mut self, response: ConverseResponse) -> Vec<SessionEffect> {
        if self.classifier.classify(&response.question_text) == Verdict::Caught {
            self.current_question = Some(response.question_text);
            return self.end(EndReason::PlayerCaught);
        }

        self.pose_question(response.question_text);
        self.clock.start_total();
        self.clock.start_response();
        self.last_error = None;
        self.state = SessionState::AwaitingAnswer;
        Vec::new()
    }

    fn pose_question(&mut self, question: String) {
        self.log.record_question(question.clone());
        self.current_question = Some(question);
    }

    fn end(&mut self, reason: EndReason) -> Vec<SessionEffect> {
        self.clock.cancel_all();
        self.state = SessionState::Ended(reason);
        tracing::info!(?reason, "interrogation ended");

        self.in_flight
            .take()
            .map(|call| SessionEffect::Abort { id: call.id })
            .into_iter()
            .collect()
    }

    fn issue(&mut self, kind: CallKind, player_response: String) -> SessionEffect {
        self.next_request_id += 1;
        let id = self.next_request_id;
        self.in_flight = Some(InFlight { id, kind });

        let request = ConverseRequest {
            player_name: self.profile.name.clone(),
            assigned_role: self.profile.assigned_role,
            difficulty: self.profile.difficulty,
            conversation_history: self.log.snapshot(),
            context: self.log.context_snapshot(),
            player_response,
            is_session_start: kind != CallKind::Answer,
        };
        tracing::debug!(id, ?kind, turns = request.conversation_history.len(), "issuing converse");

        SessionEffect::Converse { id, request }
    }

    // ============================================================================
    // Read access
    // ============================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_state: self.state,
            current_question: self.current_question.clone(),
            case_file: self.case_file.clone(),
            profile: self.profile.clone(),
            total_remaining_seconds: self.clock.total_remaining(),
            response_remaining_seconds: self.clock.response_remaining(),
            is_first_question: self.is_first_question,
            last_error: self.last_error.clone(),
            transcript_len: self.log.len(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn case_file(&self) -> Option<&CaseFile> {
        self.case_file.as_ref()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn last_error(&self) -> Option<&AlibiError> {
        self.last_error.as_ref()
    }
}

fn fresh_profile(rng: &mut StdRng) -> PlayerProfile {
    PlayerProfile {
        name: String::new(),
        difficulty: Difficulty::Normal,
        assigned_role: Role::random(rng),
    }
}
