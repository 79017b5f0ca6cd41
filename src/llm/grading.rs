use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{prompts, salvage_json_array, LlmClient, LlmError};

const GRADING_TEMPERATURE: f32 = 0.0;
const MAX_SCORE: i64 = 3;
const FALLBACK_FEEDBACK: &str = "Fallback: answer accepted";
const FALLBACK_SUMMARY: &str = "Fallback: candidate evaluation summary not available";

// The summary sometimes survives outside the salvageable array; fish it out
// of the raw text before giving up on it.
static SUMMARY_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""finalSummary"\s*:\s*"([^"]+)""#).expect("summary regex"));

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub question_id: String,
    pub score: i64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub scores: Vec<QuestionScore>,
    pub total_score: i64,
    pub summary: String,
}

/// Grades a full answer sheet in one request. Malformed model output is
/// absorbed by a deterministic fallback (one point per answer), so only
/// transport failures reach the caller.
#[derive(Clone)]
pub struct GradingService {
    client: LlmClient,
}

impl GradingService {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub async fn evaluate(
        &self,
        answers: &[AnswerEntry],
        context: &str,
    ) -> Result<Evaluation, LlmError> {
        let answers_json = serde_json::to_string_pretty(answers)?;
        let prompt = prompts::build_grading_prompt(&answers_json, context);
        let output = self.client.chat(&prompt, GRADING_TEMPERATURE).await?;

        Ok(match parse_evaluation(&output) {
            Some(evaluation) => evaluation,
            None => {
                warn!("Evaluation payload unparseable, using fallback scoring");
                fallback_evaluation(answers)
            }
        })
    }
}

fn parse_scores(value: serde_json::Value) -> Option<Vec<QuestionScore>> {
    let mut scores: Vec<QuestionScore> = serde_json::from_value(value).ok()?;
    if scores.is_empty() {
        return None;
    }
    for entry in &mut scores {
        entry.score = entry.score.clamp(0, MAX_SCORE);
    }
    Some(scores)
}

/// Accepts either the documented object shape
/// `{"evaluations": [...], "totalScore": n, "finalSummary": "..."}` or a bare
/// per-question array; anything else falls through to the caller's fallback.
fn parse_evaluation(raw: &str) -> Option<Evaluation> {
    let value = salvage_json_array(raw)?;

    let (scores, reported_total, summary_field) = match value {
        serde_json::Value::Object(mut map) => {
            let scores = parse_scores(map.remove("evaluations")?)?;
            let total = map.get("totalScore").and_then(|v| v.as_i64());
            let summary = ["finalSummary", "summary"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()).map(str::to_string));
            (scores, total, summary)
        }
        array @ serde_json::Value::Array(_) => (parse_scores(array)?, None, None),
        _ => return None,
    };

    let total_score =
        reported_total.unwrap_or_else(|| scores.iter().map(|entry| entry.score).sum());
    let summary = summary_field
        .or_else(|| {
            SUMMARY_FIELD
                .captures(raw)
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());

    Some(Evaluation {
        scores,
        total_score,
        summary,
    })
}

pub fn fallback_evaluation(answers: &[AnswerEntry]) -> Evaluation {
    Evaluation {
        scores: answers
            .iter()
            .map(|entry| QuestionScore {
                question_id: entry.question_id.clone(),
                score: 1,
                feedback: FALLBACK_FEEDBACK.to_string(),
            })
            .collect(),
        total_score: answers.len() as i64,
        summary: FALLBACK_SUMMARY.to_string(),
    }
}
