use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::models::MessageRole;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_role(value: &str) -> Result<MessageRole> {
    match value {
        "ai" => Ok(MessageRole::Ai),
        "candidate" => Ok(MessageRole::Candidate),
        "system" => Ok(MessageRole::System),
        "interviewer" => Ok(MessageRole::Interviewer),
        "interviewee" => Ok(MessageRole::Interviewee),
        other => Err(anyhow!("unknown message role {other}")),
    }
}
