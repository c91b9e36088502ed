//! SessionRunner - drives an `InterrogationSession` on a tokio runtime.
//!
//! The session itself is synchronous. The runner owns it exclusively and
//! feeds it three kinds of events from one loop:
//!
//! 1. clock ticks from [`TokioScheduler`]
//! 2. completions of remote calls it spawned
//! 3. commands from [`SessionHandle`]s
//!
//! After every event the current [`SessionSnapshot`] is published.

use alibi_core::clock::ClockTick;
use alibi_core::config::GameConfig;
use alibi_core::error::Result;
use alibi_core::interrogator::{ConverseRequest, ConverseResponse, RemoteInterrogator};
use alibi_core::outcome::OutcomeClassifier;
use alibi_core::session::{InterrogationSession, RequestId, SessionEffect, SessionSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::handle::{SessionCommand, SessionHandle};
use crate::scheduler::TokioScheduler;

const COMMAND_BUFFER: usize = 32;

struct Completion {
    id: RequestId,
    result: Result<ConverseResponse>,
}

pub struct SessionRunner {
    session: InterrogationSession,
    interrogator: Arc<dyn RemoteInterrogator>,
    ticks: mpsc::UnboundedReceiver<ClockTick>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    calls: HashMap<RequestId, JoinHandle<()>>,
}

impl SessionRunner {
    /// Builds a runner and the handle views use to talk to it.
    pub fn new(
        config: GameConfig,
        interrogator: Arc<dyn RemoteInterrogator>,
        classifier: Arc<dyn OutcomeClassifier>,
    ) -> (Self, SessionHandle) {
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let scheduler = Arc::new(TokioScheduler::new(tick_tx));
        let session = InterrogationSession::new(config, scheduler, classifier);
        Self::with_session(session, interrogator, ticks)
    }

    /// The session's scheduler must deliver into `ticks`.
    fn with_session(
        session: InterrogationSession,
        interrogator: Arc<dyn RemoteInterrogator>,
        ticks: mpsc::UnboundedReceiver<ClockTick>,
    ) -> (Self, SessionHandle) {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(session.snapshot());

        let runner = Self {
            session,
            interrogator,
            ticks,
            completion_tx,
            completions,
            commands,
            snapshots,
            calls: HashMap::new(),
        };
        (runner, SessionHandle::new(command_tx, snapshot_rx))
    }

    /// Spawns the runner onto the current runtime.
    pub fn spawn(
        config: GameConfig,
        interrogator: Arc<dyn RemoteInterrogator>,
        classifier: Arc<dyn OutcomeClassifier>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (runner, handle) = Self::new(config, interrogator, classifier);
        let task = tokio::spawn(runner.run());
        (handle, task)
    }

    /// Runs until every [`SessionHandle`] has been dropped.
    pub async fn run(mut self) {
        tracing::debug!("session runner started");
        loop {
            tokio::select! {
                biased;

                Some(tick) = self.ticks.recv() => {
                    let effects = self.session.on_tick(tick);
                    self.apply(effects);
                }
                Some(done) = self.completions.recv() => {
                    self.calls.remove(&done.id);
                    let effects = self.session.on_converse_result(done.id, done.result);
                    self.apply(effects);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
            self.publish();
        }

        for (_, call) in self.calls.drain() {
            call.abort();
        }
        tracing::debug!("session runner stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        // Publish before replying so a caller sees its own command applied.
        match command {
            SessionCommand::SubmitPlayerInfo {
                name,
                difficulty,
                reply,
            } => {
                let outcome = self.session.submit_player_info(&name, difficulty);
                let outcome = self.accept(outcome);
                self.publish();
                let _ = reply.send(outcome);
            }
            SessionCommand::SubmitAnswer { text, reply } => {
                let outcome = self.session.submit_answer(&text);
                let outcome = self.accept(outcome);
                self.publish();
                let _ = reply.send(outcome);
            }
            SessionCommand::Restart { reply } => {
                let effects = self.session.restart();
                self.apply(effects);
                self.publish();
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn accept(&mut self, outcome: Result<Vec<SessionEffect>>) -> Result<()> {
        match outcome {
            Ok(effects) => {
                self.apply(effects);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(error = %err, "command rejected");
                Err(err)
            }
        }
    }

    fn apply(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Converse { id, request } => self.start_call(id, request),
                SessionEffect::Abort { id } => {
                    if let Some(call) = self.calls.remove(&id) {
                        tracing::debug!(id, "aborting remote call");
                        call.abort();
                    }
                }
            }
        }
    }

    fn start_call(&mut self, id: RequestId, request: ConverseRequest) {
        let interrogator = Arc::clone(&self.interrogator);
        let completions = self.completion_tx.clone();
        tracing::debug!(id, start = request.is_session_start, "starting remote call");

        let call = tokio::spawn(async move {
            let result = interrogator.converse(request).await;
            let _ = completions.send(Completion { id, result });
        });
        self.calls.insert(id, call);
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alibi_core::AlibiError;
    use alibi_core::outcome::PhraseClassifier;
    use alibi_core::session::{CaseFile, Difficulty, EndReason, SessionState, Speaker};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies from a queue; once the queue is empty calls never complete.
    #[derive(Default)]
    struct ScriptedInterrogator {
        replies: Mutex<VecDeque<Result<ConverseResponse>>>,
        requests: Mutex<Vec<ConverseRequest>>,
    }

    impl ScriptedInterrogator {
        fn new(replies: Vec<Result<ConverseResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ConverseRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteInterrogator for ScriptedInterrogator {
        async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse> {
            self.requests.lock().unwrap().push(request);
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(reply) => reply,
                None => std::future::pending::<Result<ConverseResponse>>().await,
            }
        }
    }

    fn case_file() -> CaseFile {
        let mut fields = BTreeMap::new();
        fields.insert("location".to_string(), "warehouse".to_string());
        CaseFile::new(fields, vec!["fingerprint".to_string()])
    }

    fn config(total_seconds: u32, response_seconds: u32) -> GameConfig {
        GameConfig {
            total_seconds,
            response_seconds,
            ..GameConfig::default()
        }
    }

    fn spawn(
        config: GameConfig,
        interrogator: Arc<ScriptedInterrogator>,
    ) -> (SessionHandle, JoinHandle<()>) {
        SessionRunner::spawn(config, interrogator, Arc::new(PhraseClassifier::new()))
    }

    async fn wait_until<F>(handle: &SessionHandle, predicate: F) -> SessionSnapshot
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = handle.subscribe();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .expect("runner should still be publishing");
        snapshot.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_opening_question_poses_without_clocks() {
        let interrogator = ScriptedInterrogator::new(vec![Ok(ConverseResponse::opening(
            "Where were you at 9pm?",
            case_file(),
        ))]);
        let (handle, _task) = spawn(config(900, 60), interrogator.clone());

        handle
            .submit_player_info("Al", Difficulty::Normal)
            .await
            .unwrap();
        let snapshot = wait_until(&handle, |s| {
            s.session_state == SessionState::AwaitingAnswer
        })
        .await;

        assert_eq!(
            snapshot.current_question.as_deref(),
            Some("Where were you at 9pm?")
        );
        assert_eq!(snapshot.case_file, Some(case_file()));
        assert!(snapshot.is_first_question);
        assert_eq!(snapshot.total_remaining_seconds, 900);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.snapshot().total_remaining_seconds, 900);
        assert!(interrogator.requests()[0].is_session_start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_name_is_rejected() {
        let interrogator = ScriptedInterrogator::new(Vec::new());
        let (handle, _task) = spawn(config(900, 60), interrogator.clone());

        let err = handle
            .submit_player_info("  ", Difficulty::Easy)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(handle.snapshot().session_state, SessionState::Intro);
        assert!(interrogator.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_catch_phrase_ends_session() {
        let interrogator = ScriptedInterrogator::new(vec![
            Ok(ConverseResponse::opening("Where were you?", case_file())),
            Ok(ConverseResponse::question("We have you on camera.")),
        ]);
        let (handle, _task) = spawn(config(900, 60), interrogator);

        handle
            .submit_player_info("Al", Difficulty::Hard)
            .await
            .unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::AwaitingAnswer).await;
        handle.submit_answer("At home").await.unwrap();

        let snapshot = wait_until(&handle, |s| s.session_state.is_ended()).await;
        assert_eq!(
            snapshot.session_state,
            SessionState::Ended(EndReason::PlayerCaught)
        );
        assert_eq!(
            snapshot.current_question.as_deref(),
            Some("We have you on camera.")
        );

        let err = handle.submit_answer("wait").await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_timeout_submits_sentinel() {
        let interrogator = ScriptedInterrogator::new(vec![
            Ok(ConverseResponse::opening("Where were you?", case_file())),
            Ok(ConverseResponse::question("Who saw you?")),
        ]);
        let (handle, _task) = spawn(config(900, 3), interrogator.clone());

        handle
            .submit_player_info("Al", Difficulty::Normal)
            .await
            .unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::AwaitingAnswer).await;
        handle.submit_answer("At home").await.unwrap();
        wait_until(&handle, |s| {
            s.current_question.as_deref() == Some("Who saw you?")
        })
        .await;

        // Nobody answers; the third call hangs so the session stays Evaluating.
        let snapshot = wait_until(&handle, |s| s.session_state == SessionState::Evaluating).await;
        assert_eq!(snapshot.transcript_len, 4);

        let requests = interrogator.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].player_response, "[No Answer Submitted]");
        let last = requests[2].conversation_history.last().unwrap();
        assert_eq!(last.speaker(), Speaker::Player);
        assert_eq!(last.text(), "[No Answer Submitted]");
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_expiry_during_evaluation() {
        let interrogator = ScriptedInterrogator::new(vec![
            Ok(ConverseResponse::opening("Where were you?", case_file())),
            Ok(ConverseResponse::question("Who saw you?")),
        ]);
        let (handle, _task) = spawn(config(5, 60), interrogator.clone());

        handle
            .submit_player_info("Al", Difficulty::Normal)
            .await
            .unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::AwaitingAnswer).await;
        handle.submit_answer("At home").await.unwrap();
        wait_until(&handle, |s| {
            s.current_question.as_deref() == Some("Who saw you?")
        })
        .await;
        handle.submit_answer("Nobody").await.unwrap();

        let snapshot = wait_until(&handle, |s| s.session_state.is_ended()).await;
        assert_eq!(
            snapshot.session_state,
            SessionState::Ended(EndReason::PlayerSurvived)
        );
        assert_eq!(snapshot.total_remaining_seconds, 0);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(interrogator.requests().len(), 3);
        assert_eq!(
            handle.snapshot().session_state,
            SessionState::Ended(EndReason::PlayerSurvived)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_lost_resyncs_keeping_case_file() {
        let interrogator = ScriptedInterrogator::new(vec![
            Ok(ConverseResponse::opening("Where were you?", case_file())),
            Err(AlibiError::SessionLost),
            Ok(ConverseResponse::opening(
                "Let's start over. Where were you?",
                CaseFile::default(),
            )),
        ]);
        let (handle, _task) = spawn(config(900, 60), interrogator.clone());

        handle
            .submit_player_info("Al", Difficulty::Normal)
            .await
            .unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::AwaitingAnswer).await;
        handle.submit_answer("At home").await.unwrap();

        let snapshot = wait_until(&handle, |s| {
            s.current_question.as_deref() == Some("Let's start over. Where were you?")
        })
        .await;
        assert_eq!(snapshot.session_state, SessionState::AwaitingAnswer);
        assert_eq!(snapshot.case_file, Some(case_file()));
        assert_eq!(snapshot.transcript_len, 0);

        let requests = interrogator.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[2].is_session_start);
        assert!(requests[2].conversation_history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_retry() {
        let interrogator = ScriptedInterrogator::new(vec![
            Ok(ConverseResponse::opening("Where were you?", case_file())),
            Ok(ConverseResponse::question("Who saw you?")),
            Err(AlibiError::Timeout),
            Ok(ConverseResponse::question("Are you sure?")),
        ]);
        let (handle, _task) = spawn(config(900, 60), interrogator.clone());

        handle
            .submit_player_info("Al", Difficulty::Normal)
            .await
            .unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::AwaitingAnswer).await;
        handle.submit_answer("At home").await.unwrap();
        wait_until(&handle, |s| {
            s.current_question.as_deref() == Some("Who saw you?")
        })
        .await;
        handle.submit_answer("Nobody").await.unwrap();

        let failed = wait_until(&handle, |s| s.last_error.is_some()).await;
        assert_eq!(failed.session_state, SessionState::AwaitingAnswer);
        assert_eq!(failed.last_error, Some(AlibiError::Timeout));

        handle.submit_answer("Nobody, really").await.unwrap();
        let snapshot = wait_until(&handle, |s| {
            s.current_question.as_deref() == Some("Are you sure?")
        })
        .await;
        assert_eq!(snapshot.last_error, None);
        assert_eq!(interrogator.requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_abandons_pending_call() {
        let interrogator = ScriptedInterrogator::new(vec![Ok(ConverseResponse::opening(
            "Where were you?",
            case_file(),
        ))]);
        let (handle, _task) = spawn(config(900, 60), interrogator.clone());

        handle
            .submit_player_info("Al", Difficulty::Normal)
            .await
            .unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::AwaitingAnswer).await;
        handle.submit_answer("At home").await.unwrap();
        wait_until(&handle, |s| s.session_state == SessionState::Evaluating).await;

        handle.restart().await.unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.session_state, SessionState::Intro);
        assert_eq!(snapshot.transcript_len, 0);
        assert_eq!(snapshot.case_file, None);
        assert_eq!(snapshot.current_question, None);
        assert_eq!(snapshot.total_remaining_seconds, 900);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().session_state, SessionState::Intro);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_stops_when_handles_dropped() {
        let interrogator = ScriptedInterrogator::new(Vec::new());
        let (handle, task) = spawn(config(900, 60), interrogator);
        drop(handle);
        task.await.unwrap();
    }
}
