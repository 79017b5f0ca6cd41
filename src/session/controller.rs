use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime};
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::{
    db::Database,
    llm::{Evaluation, GradingService, QuestionService},
    models::{Candidate, ChatMessage, MessageRole},
    profile::{extract_profile, validate_field},
};

use super::{
    snapshot::{RecoverySnapshot, SnapshotStore},
    state::{Advance, Phase, SessionState, TickOutcome},
};

#[derive(Serialize, Clone)]
struct SessionStateChangedEvent {
    state: SessionState,
}

#[derive(Serialize, Clone)]
struct SessionTickEvent {
    question_index: usize,
    remaining_secs: u64,
}

#[derive(Serialize, Clone)]
struct SessionRecoveredEvent {
    candidate_id: String,
    question_index: usize,
}

#[derive(Serialize, Clone)]
struct EvaluationCompletedEvent {
    candidate_id: String,
    total_score: i64,
    summary: String,
}

#[derive(Serialize, Clone)]
struct EvaluationFailedEvent {
    candidate_id: String,
    message: String,
}

/// Owns the live interview state machine for the active candidate: the
/// profile-completion sub-flow, question delivery, the one-second countdown,
/// pause/resume, and the evaluation hand-off. All transitions go through the
/// single state mutex, so the ticker and user actions can never interleave
/// mid-transition.
pub struct InterviewController<R: Runtime = tauri::Wry> {
    state: Arc<Mutex<SessionState>>,
    db: Database,
    snapshots: SnapshotStore,
    questions: QuestionService,
    grading: GradingService,
    app_handle: AppHandle<R>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    generate_in_flight: Arc<AtomicBool>,
    evaluate_in_flight: Arc<AtomicBool>,
}

impl<R: Runtime> Clone for InterviewController<R> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            db: self.db.clone(),
            snapshots: self.snapshots.clone(),
            questions: self.questions.clone(),
            grading: self.grading.clone(),
            app_handle: self.app_handle.clone(),
            ticker: self.ticker.clone(),
            tick_interval: self.tick_interval,
            generate_in_flight: self.generate_in_flight.clone(),
            evaluate_in_flight: self.evaluate_in_flight.clone(),
        }
    }
}

impl<R: Runtime> InterviewController<R> {
    pub fn new(
        app_handle: AppHandle<R>,
        db: Database,
        snapshots: SnapshotStore,
        questions: QuestionService,
        grading: GradingService,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            db,
            snapshots,
            questions,
            grading,
            app_handle,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            generate_in_flight: Arc::new(AtomicBool::new(false)),
            evaluate_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn get_state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Creates a candidate from raw resume text and binds it as active.
    /// Extraction is best-effort; whatever it misses is collected through
    /// the chat flow, one field at a time.
    pub async fn ingest_resume(
        &self,
        raw_text: &str,
        file_name: Option<String>,
    ) -> Result<SessionState> {
        let extracted = extract_profile(raw_text);
        let candidate = Candidate::new(extracted.name, extracted.email, extracted.phone, file_name);
        self.db.insert_candidate(&candidate).await?;

        self.cancel_ticker().await;
        if let Err(err) = self.snapshots.clear() {
            warn!("Failed to discard recovery snapshot on resume upload: {err:#}");
        }

        let mut state = self.state.lock().await;
        match candidate.next_missing_field() {
            Some(field) => {
                state.bind_candidate(candidate.id.clone(), Phase::CollectingProfile);
                self.append_chat(ChatMessage::new(&candidate.id, MessageRole::Ai, field.prompt()))
                    .await?;
            }
            None => {
                state.bind_candidate(candidate.id.clone(), Phase::AwaitingStart);
            }
        }

        let snapshot = state.clone();
        drop(state);
        self.emit_state_changed(&snapshot);
        info!("Ingested resume for candidate {}", candidate.id);
        Ok(snapshot)
    }

    /// Routes a typed message: a profile answer while collecting, an answer
    /// to the current question while running. Anything else is rejected.
    pub async fn submit_message(&self, text: &str) -> Result<SessionState> {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            bail!("message is empty");
        }

        let mut state = self.state.lock().await;
        let candidate_id = state
            .active_candidate_id
            .clone()
            .ok_or_else(|| anyhow!("no active candidate"))?;

        match state.phase {
            Phase::CollectingProfile => {
                self.accept_profile_answer(&mut state, &candidate_id, &trimmed)
                    .await?;
            }
            Phase::Running => {
                match self
                    .advance_after_answer(&mut state, &candidate_id, Some(&trimmed))
                    .await?
                {
                    Advance::Next(_) => {
                        self.spawn_ticker(state.current_index).await;
                    }
                    Advance::Exhausted => {
                        let snapshot = state.clone();
                        drop(state);
                        self.cancel_ticker().await;
                        self.emit_state_changed(&snapshot);
                        self.run_evaluation(&candidate_id).await?;
                        return Ok(self.get_state().await);
                    }
                }
            }
            _ => bail!("session is not accepting input right now"),
        }

        let snapshot = state.clone();
        drop(state);
        self.emit_state_changed(&snapshot);
        Ok(snapshot)
    }

    /// Fills the next missing profile field in the fixed name -> email ->
    /// phone order. A failed validation mutates nothing; the same field
    /// stays next in line.
    async fn accept_profile_answer(
        &self,
        state: &mut SessionState,
        candidate_id: &str,
        text: &str,
    ) -> Result<()> {
        let candidate = self
            .db
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| anyhow!("active candidate missing from store"))?;
        let field = candidate
            .next_missing_field()
            .ok_or_else(|| anyhow!("profile is already complete"))?;

        validate_field(field, text).map_err(|err| anyhow!("{err}"))?;

        self.append_chat(ChatMessage::new(candidate_id, MessageRole::Candidate, text))
            .await?;
        self.db
            .update_candidate_field(candidate_id, field, text)
            .await?;

        let refreshed = self
            .db
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| anyhow!("active candidate missing from store"))?;
        match refreshed.next_missing_field() {
            Some(next) => {
                self.append_chat(ChatMessage::new(candidate_id, MessageRole::Ai, next.prompt()))
                    .await?;
            }
            None => {
                state.phase = Phase::AwaitingStart;
            }
        }
        Ok(())
    }

    /// Fetches the question set and enters `Running`. Failure leaves the
    /// session exactly where it was: awaiting start, nothing partial.
    pub async fn start_test(&self) -> Result<SessionState> {
        let candidate_id = {
            let state = self.state.lock().await;
            if state.phase != Phase::AwaitingStart {
                bail!("test can only start once the profile is complete");
            }
            state
                .active_candidate_id
                .clone()
                .ok_or_else(|| anyhow!("no active candidate"))?
        };

        let candidate = self
            .db
            .get_candidate(&candidate_id)
            .await?
            .ok_or_else(|| anyhow!("active candidate missing from store"))?;
        if candidate.test_completed {
            bail!("this candidate has already completed the test");
        }

        if self.generate_in_flight.swap(true, Ordering::SeqCst) {
            bail!("question generation is already in progress");
        }
        let context = candidate.name.clone().unwrap_or_default();
        let result = self.questions.generate(&context).await;
        self.generate_in_flight.store(false, Ordering::SeqCst);
        let queue = result.context("failed to fetch test questions")?;

        let mut state = self.state.lock().await;
        // The candidate may have been deleted or switched while the request
        // was out; the generated set is then dropped on the floor.
        if state.phase != Phase::AwaitingStart
            || state.active_candidate_id.as_deref() != Some(candidate_id.as_str())
        {
            debug!("Discarding generated questions for {candidate_id}: session moved on");
            return Ok(state.clone());
        }

        let first = state
            .begin_run(queue)
            .ok_or_else(|| anyhow!("question service returned an empty set"))?;
        self.append_chat(ChatMessage::new(
            &candidate_id,
            MessageRole::Ai,
            first.question,
        ))
        .await?;
        self.persist_snapshot(&state);
        self.spawn_ticker(state.current_index).await;

        let snapshot = state.clone();
        drop(state);
        self.emit_state_changed(&snapshot);
        info!("Started test for candidate {candidate_id}");
        Ok(snapshot)
    }

    /// Suspends the countdown. The ticker is cancelled outright; any tick
    /// already racing the lock sees `Paused` and lands stale.
    pub async fn pause(&self) -> Result<SessionState> {
        let mut state = self.state.lock().await;
        if !state.pause() {
            bail!("no running question to pause");
        }
        self.persist_snapshot(&state);
        let snapshot = state.clone();
        drop(state);

        self.cancel_ticker().await;
        self.emit_state_changed(&snapshot);
        Ok(snapshot)
    }

    pub async fn resume(&self) -> Result<SessionState> {
        let mut state = self.state.lock().await;
        if state.resume().is_none() {
            bail!("no paused question to resume");
        }
        self.persist_snapshot(&state);
        self.spawn_ticker(state.current_index).await;

        let snapshot = state.clone();
        drop(state);
        self.emit_state_changed(&snapshot);
        Ok(snapshot)
    }

    /// Re-issues a grading request after a failure. Answers were retained,
    /// so this is the whole retry story.
    pub async fn retry_evaluation(&self) -> Result<SessionState> {
        let candidate_id = {
            let state = self.state.lock().await;
            if state.phase != Phase::Evaluating {
                bail!("no evaluation to retry");
            }
            state
                .active_candidate_id
                .clone()
                .ok_or_else(|| anyhow!("no active candidate"))?
        };

        self.run_evaluation(&candidate_id).await?;
        Ok(self.get_state().await)
    }

    /// Binds an existing candidate as active. Completed candidates open in
    /// the terminal phase for display only.
    pub async fn select_candidate(&self, candidate_id: &str) -> Result<SessionState> {
        let candidate = self
            .db
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| anyhow!("candidate not found"))?;

        self.cancel_ticker().await;
        if let Err(err) = self.snapshots.clear() {
            warn!("Failed to discard recovery snapshot on candidate switch: {err:#}");
        }

        let mut state = self.state.lock().await;
        if candidate.test_completed {
            state.bind_candidate(candidate.id.clone(), Phase::Completed);
            state.total_score = candidate.score;
        } else if candidate.next_missing_field().is_some() {
            state.bind_candidate(candidate.id.clone(), Phase::CollectingProfile);
        } else {
            state.bind_candidate(candidate.id.clone(), Phase::AwaitingStart);
        }

        let snapshot = state.clone();
        drop(state);
        self.emit_state_changed(&snapshot);
        Ok(snapshot)
    }

    /// Removes a candidate and its transcript. Deleting the active one also
    /// clears the live session and its recovery snapshot; an in-flight
    /// evaluation for it becomes a no-op when the response lands.
    pub async fn delete_candidate(&self, candidate_id: &str) -> Result<()> {
        let was_active = {
            let mut state = self.state.lock().await;
            if state.active_candidate_id.as_deref() == Some(candidate_id) {
                state.reset();
                true
            } else {
                false
            }
        };

        if was_active {
            self.cancel_ticker().await;
        }
        if let Some(snapshot) = self.snapshots.load() {
            if snapshot.candidate_id == candidate_id {
                if let Err(err) = self.snapshots.clear() {
                    warn!("Failed to discard recovery snapshot on delete: {err:#}");
                }
            }
        }

        self.db.delete_candidate(candidate_id).await?;
        info!("Deleted candidate {candidate_id}");

        if was_active {
            let snapshot = self.get_state().await;
            self.emit_state_changed(&snapshot);
        }
        Ok(())
    }

    /// Startup recovery: rehydrate a snapshot left by an interrupted run.
    /// Restores into `Paused` and leaves the resume action to the user;
    /// a snapshot for a missing or completed candidate is discarded.
    pub async fn restore_from_snapshot(&self) -> Result<bool> {
        let snapshot = match self.snapshots.load() {
            Some(snapshot) => snapshot,
            None => return Ok(false),
        };

        let candidate = self.db.get_candidate(&snapshot.candidate_id).await?;
        let candidate = match candidate {
            Some(candidate) if !candidate.test_completed => candidate,
            _ => {
                info!("Discarding recovery snapshot: candidate missing or already completed");
                if let Err(err) = self.snapshots.clear() {
                    warn!("Failed to discard stale recovery snapshot: {err:#}");
                }
                return Ok(false);
            }
        };

        let mut state = self.state.lock().await;
        state.restore(&snapshot);
        let restored = state.clone();
        drop(state);

        info!(
            "Restored interview session for candidate {} at question {}",
            candidate.id, restored.current_index
        );
        let _ = self.app_handle.emit(
            "session-recovered",
            SessionRecoveredEvent {
                candidate_id: candidate.id,
                question_index: restored.current_index,
            },
        );
        self.emit_state_changed(&restored);
        Ok(true)
    }

    /// Shared transition for submit and timer expiry: record the answer
    /// (expiry records the empty string), then either arm the next question
    /// or hand off to evaluation. Caller holds the state lock.
    async fn advance_after_answer(
        &self,
        state: &mut SessionState,
        candidate_id: &str,
        answer_text: Option<&str>,
    ) -> Result<Advance> {
        state.record_answer(answer_text.unwrap_or(""));
        if let Some(text) = answer_text {
            self.append_chat(ChatMessage::new(candidate_id, MessageRole::Candidate, text))
                .await?;
        }

        let outcome = state.advance();
        if let Advance::Next(question) = &outcome {
            self.append_chat(ChatMessage::new(
                candidate_id,
                MessageRole::Ai,
                question.question.clone(),
            ))
            .await?;
            self.persist_snapshot(state);
        }
        Ok(outcome)
    }

    /// Sends the full answer sheet for grading. Failure keeps the session
    /// in `Evaluating` with the answers intact; success finalizes the
    /// candidate and tears the run down. If the candidate was deleted or
    /// switched while the request was out, the response is dropped.
    async fn run_evaluation(&self, candidate_id: &str) -> Result<()> {
        let answers = {
            let state = self.state.lock().await;
            if state.phase != Phase::Evaluating
                || state.active_candidate_id.as_deref() != Some(candidate_id)
            {
                return Ok(());
            }
            state.answer_sheet()
        };
        if answers.is_empty() {
            bail!("no answers to evaluate");
        }

        let candidate = match self.db.get_candidate(candidate_id).await? {
            Some(candidate) => candidate,
            None => return Ok(()),
        };

        if self.evaluate_in_flight.swap(true, Ordering::SeqCst) {
            bail!("evaluation is already in progress");
        }
        let context = candidate.name.clone().unwrap_or_default();
        let result = self.grading.evaluate(&answers, &context).await;
        self.evaluate_in_flight.store(false, Ordering::SeqCst);

        let evaluation = match result {
            Ok(evaluation) => evaluation,
            Err(err) => {
                error!("Evaluation request failed for {candidate_id}: {err}");
                let _ = self.app_handle.emit(
                    "evaluation-failed",
                    EvaluationFailedEvent {
                        candidate_id: candidate_id.to_string(),
                        message: err.to_string(),
                    },
                );
                return Err(anyhow::Error::new(err).context("failed to evaluate test"));
            }
        };

        self.apply_evaluation(candidate_id, evaluation).await
    }

    async fn apply_evaluation(&self, candidate_id: &str, evaluation: Evaluation) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Evaluating
            || state.active_candidate_id.as_deref() != Some(candidate_id)
        {
            debug!("Discarding evaluation result for {candidate_id}: session moved on");
            return Ok(());
        }

        for entry in &evaluation.scores {
            self.append_chat(
                ChatMessage::new(candidate_id, MessageRole::Ai, entry.feedback.clone())
                    .with_score(entry.score),
            )
            .await?;
        }
        self.append_chat(ChatMessage::new(
            candidate_id,
            MessageRole::Ai,
            format!("Test completed! Score: {}", evaluation.total_score),
        ))
        .await?;

        self.db
            .set_candidate_result(candidate_id, evaluation.total_score, &evaluation.summary)
            .await?;

        state.complete(evaluation.total_score);
        if let Err(err) = self.snapshots.clear() {
            warn!("Failed to clear recovery snapshot after evaluation: {err:#}");
        }

        let snapshot = state.clone();
        drop(state);
        self.emit_state_changed(&snapshot);
        let _ = self.app_handle.emit(
            "evaluation-completed",
            EvaluationCompletedEvent {
                candidate_id: candidate_id.to_string(),
                total_score: evaluation.total_score,
                summary: evaluation.summary,
            },
        );
        info!(
            "Evaluation completed for {candidate_id}: score {}",
            evaluation.total_score
        );
        Ok(())
    }

    /// Arms the countdown for the question at `armed_index`. Re-arming
    /// always cancels the previous ticker; a tick armed for a superseded
    /// index dies on its own the first time it observes the state.
    async fn spawn_ticker(&self, armed_index: usize) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut armed_index = armed_index;
            loop {
                time::sleep(tick_interval).await;

                let mut state = controller.state.lock().await;
                match state.tick(armed_index) {
                    TickOutcome::Stale => {
                        debug!("Ignoring stale tick for question {armed_index}");
                        break;
                    }
                    TickOutcome::Continue(remaining) => {
                        controller.persist_snapshot(&state);
                        drop(state);
                        let _ = controller.app_handle.emit(
                            "session-tick",
                            SessionTickEvent {
                                question_index: armed_index,
                                remaining_secs: remaining,
                            },
                        );
                    }
                    TickOutcome::Expired => {
                        let candidate_id = match state.active_candidate_id.clone() {
                            Some(id) => id,
                            None => break,
                        };
                        match controller
                            .advance_after_answer(&mut state, &candidate_id, None)
                            .await
                        {
                            Ok(Advance::Next(_)) => {
                                armed_index = state.current_index;
                                let snapshot = state.clone();
                                drop(state);
                                controller.emit_state_changed(&snapshot);
                            }
                            Ok(Advance::Exhausted) => {
                                let snapshot = state.clone();
                                drop(state);
                                controller.emit_state_changed(&snapshot);
                                if let Err(err) = controller.run_evaluation(&candidate_id).await {
                                    error!("Evaluation after final timer expiry failed: {err:#}");
                                }
                                break;
                            }
                            Err(err) => {
                                error!("Failed to advance after timer expiry: {err:#}");
                                break;
                            }
                        }
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn append_chat(&self, message: ChatMessage) -> Result<()> {
        self.db.append_chat_message(&message).await?;
        let _ = self.app_handle.emit("chat-message", message);
        Ok(())
    }

    fn persist_snapshot(&self, state: &SessionState) {
        if let Some(snapshot) = RecoverySnapshot::capture(state) {
            if let Err(err) = self.snapshots.save(&snapshot) {
                error!("Failed to persist recovery snapshot: {err:#}");
            }
        }
    }

    fn emit_state_changed(&self, state: &SessionState) {
        let _ = self.app_handle.emit(
            "session-state-changed",
            SessionStateChangedEvent {
                state: state.clone(),
            },
        );
    }
}
