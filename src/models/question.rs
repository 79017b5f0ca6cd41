use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Canonical per-question countdown. The mapping is fixed client-side;
    /// whatever the remote service reports is never trusted.
    pub fn time_limit_secs(&self) -> u64 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 60,
            Difficulty::Hard => 120,
        }
    }

    pub fn expected_points(&self) -> i64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub question: String,
    pub difficulty: Difficulty,
    pub time_limit_secs: u64,
    /// Filled exactly once, when the candidate answers or the timer expires.
    pub answer: Option<String>,
}

impl Question {
    pub fn new(question_id: impl Into<String>, question: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            question_id: question_id.into(),
            question: question.into(),
            difficulty,
            time_limit_secs: difficulty.time_limit_secs(),
            answer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_limit_mapping_is_fixed() {
        assert_eq!(Difficulty::Easy.time_limit_secs(), 20);
        assert_eq!(Difficulty::Medium.time_limit_secs(), 60);
        assert_eq!(Difficulty::Hard.time_limit_secs(), 120);
    }

    #[test]
    fn test_expected_points_by_difficulty() {
        assert_eq!(Difficulty::Easy.expected_points(), 1);
        assert_eq!(Difficulty::Medium.expected_points(), 2);
        assert_eq!(Difficulty::Hard.expected_points(), 3);
    }

    #[test]
    fn test_new_question_uses_canonical_limit() {
        let q = Question::new("q1", "What is ownership?", Difficulty::Medium);
        assert_eq!(q.time_limit_secs, 60);
        assert!(q.answer.is_none());
    }

    #[test]
    fn test_difficulty_parse_rejects_unknown() {
        assert_eq!(Difficulty::parse("medium"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("extreme"), None);
    }
}
