use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MessageRole {
    Ai,
    Candidate,
    System,
    Interviewer,
    Interviewee,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::Ai => "ai",
            MessageRole::Candidate => "candidate",
            MessageRole::System => "system",
            MessageRole::Interviewer => "interviewer",
            MessageRole::Interviewee => "interviewee",
        }
    }
}

/// One entry in a candidate's transcript. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub candidate_id: String,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub score: Option<i64>,
}

impl ChatMessage {
    pub fn new(candidate_id: &str, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            candidate_id: candidate_id.to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }
}
