use log::warn;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Difficulty, Question};

use super::{prompts, salvage_json_array, LlmClient, LlmError};

const QUESTIONS_PER_TEST: usize = 6;
const QUESTION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    difficulty: String,
}

/// Generates the six-question set for one test attempt. Malformed model
/// output never propagates: the caller always gets a usable queue or a
/// transport error.
#[derive(Clone)]
pub struct QuestionService {
    client: LlmClient,
}

impl QuestionService {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub async fn generate(&self, context: &str) -> Result<Vec<Question>, LlmError> {
        let prompt = prompts::build_question_prompt(context);
        let output = self.client.chat(&prompt, QUESTION_TEMPERATURE).await?;

        Ok(match parse_questions(&output) {
            Some(questions) => questions,
            None => {
                warn!("Question payload unparseable, using built-in fallback set");
                fallback_questions()
            }
        })
    }
}

/// Parses a question array out of model output. The time limit reported by
/// the model (if any) is discarded: the difficulty mapping is canonical.
fn parse_questions(raw: &str) -> Option<Vec<Question>> {
    let value = salvage_json_array(raw)?;
    let raws: Vec<RawQuestion> = serde_json::from_value(value).ok()?;
    if raws.len() != QUESTIONS_PER_TEST {
        return None;
    }

    let batch = Uuid::new_v4().simple().to_string();
    raws.into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let difficulty = Difficulty::parse(raw.difficulty.trim())?;
            Some(Question::new(
                format!("q_{batch}_{idx}"),
                raw.question,
                difficulty,
            ))
        })
        .collect()
}

pub fn fallback_questions() -> Vec<Question> {
    vec![
        Question::new("f1", "What is React?", Difficulty::Easy),
        Question::new("f2", "What is useState in React?", Difficulty::Easy),
        Question::new("f3", "Explain event loop in Node.js.", Difficulty::Medium),
        Question::new("f4", "What is middleware in Express.js?", Difficulty::Medium),
        Question::new(
            "f5",
            "How would you optimize React rendering?",
            Difficulty::Hard,
        ),
        Question::new(
            "f6",
            "Explain scaling WebSocket servers in Node.",
            Difficulty::Hard,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(difficulties: &[&str]) -> String {
        let items: Vec<String> = difficulties
            .iter()
            .enumerate()
            .map(|(i, d)| {
                format!(
                    r#"{{"question": "Question {i}?", "difficulty": "{d}", "expected_points": 1, "timeLimit": 999}}"#
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn test_parse_ignores_model_supplied_time_limits() {
        let raw = payload(&["easy", "easy", "medium", "medium", "hard", "hard"]);
        let questions = parse_questions(&raw).unwrap();
        let limits: Vec<u64> = questions.iter().map(|q| q.time_limit_secs).collect();
        assert_eq!(limits, vec![20, 20, 60, 60, 120, 120]);
    }

    #[test]
    fn test_parse_requires_exactly_six() {
        assert!(parse_questions(&payload(&["easy", "medium", "hard"])).is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_difficulty() {
        let raw = payload(&["easy", "easy", "medium", "medium", "hard", "brutal"]);
        assert!(parse_questions(&raw).is_none());
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_questions("Sorry, I cannot help with that.").is_none());
    }

    #[test]
    fn test_parse_recovers_array_from_wrapped_output() {
        let raw = format!(
            "Sure, here you go:\n{}\nGood luck!",
            payload(&["easy", "easy", "medium", "medium", "hard", "hard"])
        );
        assert!(parse_questions(&raw).is_some());
    }

    #[test]
    fn test_fallback_set_shape() {
        let questions = fallback_questions();
        assert_eq!(questions.len(), 6);
        let limits: Vec<u64> = questions.iter().map(|q| q.time_limit_secs).collect();
        assert_eq!(limits, vec![20, 20, 60, 60, 120, 120]);

        let easy = questions
            .iter()
            .filter(|q| q.difficulty == Difficulty::Easy)
            .count();
        assert_eq!(easy, 2);
    }

    #[test]
    fn test_question_ids_unique_within_batch() {
        let raw = payload(&["easy", "easy", "medium", "medium", "hard", "hard"]);
        let questions = parse_questions(&raw).unwrap();
        let mut ids: Vec<&str> = questions.iter().map(|q| q.question_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }
}
