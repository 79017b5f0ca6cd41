use serde::{Deserialize, Serialize};

use crate::llm::AnswerEntry;
use crate::models::Question;

use super::snapshot::RecoverySnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    CollectingProfile,
    AwaitingStart,
    Running,
    Paused,
    Evaluating,
    Completed,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

/// Outcome of moving past the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next(Question),
    Exhausted,
}

/// Outcome of one countdown tick. Ticks carry the index they were armed
/// for; a tick that lost the race against a submit is `Stale` and must be
/// ignored, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Stale,
    Continue(u64),
    Expired,
}

/// Working memory for the active candidate. The single `phase` field makes
/// contradictory flag combinations unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: Phase,
    pub active_candidate_id: Option<String>,
    pub queue: Vec<Question>,
    pub current_index: usize,
    pub remaining_secs: u64,
    pub total_score: i64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            active_candidate_id: None,
            queue: Vec::new(),
            current_index: 0,
            remaining_secs: 0,
            total_score: 0,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Binds a candidate as the active one, dropping whatever the previous
    /// candidate left behind.
    pub fn bind_candidate(&mut self, candidate_id: String, phase: Phase) {
        *self = Self {
            phase,
            active_candidate_id: Some(candidate_id),
            ..Self::default()
        };
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.queue.get(self.current_index)
    }

    /// Enters `Running` with a fresh queue. Returns the first question, or
    /// `None` for an empty queue (in which case nothing changes).
    pub fn begin_run(&mut self, queue: Vec<Question>) -> Option<Question> {
        let first = queue.first().cloned()?;
        self.phase = Phase::Running;
        self.queue = queue;
        self.current_index = 0;
        self.remaining_secs = first.time_limit_secs;
        self.total_score = 0;
        Some(first)
    }

    /// Fills the current question's answer. First write wins; later calls
    /// for the same index are ignored.
    pub fn record_answer(&mut self, text: &str) {
        if let Some(question) = self.queue.get_mut(self.current_index) {
            if question.answer.is_none() {
                question.answer = Some(text.to_string());
            }
        }
    }

    /// Moves to the next question, or into `Evaluating` when the queue is
    /// exhausted. The index only ever moves forward.
    pub fn advance(&mut self) -> Advance {
        self.current_index += 1;
        match self.queue.get(self.current_index) {
            Some(question) => {
                self.remaining_secs = question.time_limit_secs;
                Advance::Next(question.clone())
            }
            None => {
                self.phase = Phase::Evaluating;
                self.remaining_secs = 0;
                Advance::Exhausted
            }
        }
    }

    pub fn tick(&mut self, armed_index: usize) -> TickOutcome {
        if self.phase != Phase::Running || armed_index != self.current_index {
            return TickOutcome::Stale;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Continue(self.remaining_secs)
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            true
        } else {
            false
        }
    }

    /// Resuming restarts the current question's clock from its full limit;
    /// partially elapsed time is discarded.
    pub fn resume(&mut self) -> Option<u64> {
        if self.phase != Phase::Paused {
            return None;
        }
        let limit = self.current_question()?.time_limit_secs;
        self.phase = Phase::Running;
        self.remaining_secs = limit;
        Some(limit)
    }

    pub fn complete(&mut self, total_score: i64) {
        self.phase = Phase::Completed;
        self.total_score = total_score;
        self.queue.clear();
        self.current_index = 0;
        self.remaining_secs = 0;
    }

    /// Rehydrates from a recovery snapshot, always into `Paused`: a reload
    /// never drops the candidate straight back into a running countdown.
    pub fn restore(&mut self, snapshot: &RecoverySnapshot) {
        *self = Self {
            phase: Phase::Paused,
            active_candidate_id: Some(snapshot.candidate_id.clone()),
            queue: snapshot.queue.clone(),
            current_index: snapshot.current_index,
            remaining_secs: snapshot.remaining_secs,
            total_score: snapshot.total_score,
        };
    }

    pub fn answer_sheet(&self) -> Vec<AnswerEntry> {
        self.queue
            .iter()
            .map(|question| AnswerEntry {
                question_id: question.question_id.clone(),
                answer: question.answer.clone().unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn run_of(n: usize) -> SessionState {
        let mut state = SessionState::new();
        state.bind_candidate("c1".into(), Phase::AwaitingStart);
        let queue: Vec<Question> = (0..n)
            .map(|i| Question::new(format!("q{i}"), format!("Question {i}?"), Difficulty::Easy))
            .collect();
        state.begin_run(queue).unwrap();
        state
    }

    #[test]
    fn test_begin_run_arms_first_question() {
        let state = run_of(3);
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.remaining_secs, 20);
    }

    #[test]
    fn test_begin_run_rejects_empty_queue() {
        let mut state = SessionState::new();
        state.bind_candidate("c1".into(), Phase::AwaitingStart);
        assert!(state.begin_run(Vec::new()).is_none());
        assert_eq!(state.phase, Phase::AwaitingStart);
    }

    #[test]
    fn test_advance_resets_countdown_for_next_question() {
        let mut state = run_of(3);
        state.remaining_secs = 4;
        match state.advance() {
            Advance::Next(question) => assert_eq!(question.question_id, "q1"),
            Advance::Exhausted => panic!("queue should not be exhausted"),
        }
        assert_eq!(state.remaining_secs, 20);
        assert_eq!(state.current_index, 1);
    }

    #[test]
    fn test_advance_past_last_question_enters_evaluating() {
        let mut state = run_of(1);
        assert_eq!(state.advance(), Advance::Exhausted);
        assert_eq!(state.phase, Phase::Evaluating);
        assert_eq!(state.remaining_secs, 0);
    }

    #[test]
    fn test_answer_recorded_exactly_once() {
        let mut state = run_of(2);
        state.record_answer("first");
        state.record_answer("second");
        assert_eq!(state.queue[0].answer.as_deref(), Some("first"));
    }

    #[test]
    fn test_tick_counts_down_and_expires() {
        let mut state = run_of(1);
        for expected in (1..20).rev() {
            assert_eq!(state.tick(0), TickOutcome::Continue(expected));
        }
        assert_eq!(state.tick(0), TickOutcome::Expired);
    }

    #[test]
    fn test_stale_tick_is_ignored() {
        let mut state = run_of(3);
        state.record_answer("done");
        state.advance();

        // Ticks armed for the old index lost the race against the submit.
        assert_eq!(state.tick(0), TickOutcome::Stale);
        assert_eq!(state.tick(0), TickOutcome::Stale);
        assert_eq!(state.current_index, 1);
        assert_eq!(state.remaining_secs, 20);
    }

    #[test]
    fn test_tick_outside_running_is_stale() {
        let mut state = run_of(2);
        state.pause();
        assert_eq!(state.tick(0), TickOutcome::Stale);
    }

    #[test]
    fn test_pause_only_from_running() {
        let mut state = SessionState::new();
        assert!(!state.pause());

        let mut state = run_of(1);
        assert!(state.pause());
        assert_eq!(state.phase, Phase::Paused);
        assert!(!state.pause());
    }

    #[test]
    fn test_resume_resets_to_full_limit() {
        let mut state = run_of(2);
        state.remaining_secs = 3;
        state.pause();

        let restored = state.resume().unwrap();
        assert_eq!(restored, 20);
        assert_eq!(state.remaining_secs, 20);
        assert_eq!(state.phase, Phase::Running);
    }

    #[test]
    fn test_resume_never_exceeds_limit() {
        let mut state = run_of(2);
        state.pause();
        let restored = state.resume().unwrap();
        assert!(restored <= state.queue[0].time_limit_secs);
    }

    #[test]
    fn test_complete_clears_run_data() {
        let mut state = run_of(2);
        state.phase = Phase::Evaluating;
        state.complete(5);
        assert_eq!(state.phase, Phase::Completed);
        assert_eq!(state.total_score, 5);
        assert!(state.queue.is_empty());
        assert_eq!(state.remaining_secs, 0);
    }

    #[test]
    fn test_answer_sheet_covers_whole_queue() {
        let mut state = run_of(3);
        state.record_answer("only the first");
        let sheet = state.answer_sheet();
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet[0].answer, "only the first");
        assert_eq!(sheet[1].answer, "");
        assert_eq!(sheet[2].answer, "");
    }

    #[test]
    fn test_index_is_monotonic_across_run() {
        let mut state = run_of(3);
        let mut last = state.current_index;
        loop {
            state.record_answer("a");
            let done = matches!(state.advance(), Advance::Exhausted);
            assert!(state.current_index > last);
            last = state.current_index;
            if done {
                break;
            }
        }
    }
}
