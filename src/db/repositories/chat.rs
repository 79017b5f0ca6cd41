use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_role},
    Database,
};
use crate::models::ChatMessage;

fn row_to_message(row: &Row) -> Result<ChatMessage> {
    let role: String = row.get("role")?;
    let timestamp: String = row.get("timestamp")?;

    Ok(ChatMessage {
        id: row.get("id")?,
        candidate_id: row.get("candidate_id")?,
        role: parse_role(&role)?,
        text: row.get("text")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        score: row.get("score")?,
    })
}

impl Database {
    /// Append-only: messages get a per-candidate sequence number and are
    /// never updated or reordered afterwards.
    pub async fn append_chat_message(&self, message: &ChatMessage) -> Result<()> {
        let record = message.clone();
        self.execute(move |conn| {
            let next_seq: i64 = conn.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM chat_messages WHERE candidate_id = ?1",
                params![record.candidate_id],
                |row| row.get(0),
            )?;

            conn.execute(
                "INSERT INTO chat_messages (id, candidate_id, seq, role, text, timestamp, score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.candidate_id,
                    next_seq,
                    record.role.as_str(),
                    record.text,
                    record.timestamp.to_rfc3339(),
                    record.score,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_chat(&self, candidate_id: &str) -> Result<Vec<ChatMessage>> {
        let candidate_id = candidate_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, candidate_id, role, text, timestamp, score
                 FROM chat_messages
                 WHERE candidate_id = ?1
                 ORDER BY seq ASC",
            )?;

            let mut rows = stmt.query(params![candidate_id])?;
            let mut messages = Vec::new();
            while let Some(row) = rows.next()? {
                messages.push(row_to_message(row)?);
            }
            Ok(messages)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{Candidate, ChatMessage, MessageRole};

    #[tokio::test]
    async fn test_chat_keeps_append_order() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(Some("Jane".into()), None, None, None);
        db.insert_candidate(&candidate).await.unwrap();

        for text in ["first", "second", "third"] {
            db.append_chat_message(&ChatMessage::new(&candidate.id, MessageRole::Candidate, text))
                .await
                .unwrap();
        }

        let chat = db.get_chat(&candidate.id).await.unwrap();
        let texts: Vec<&str> = chat.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_chat_length_is_non_decreasing() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(Some("Jane".into()), None, None, None);
        db.insert_candidate(&candidate).await.unwrap();

        let mut last_len = 0;
        for i in 0..5 {
            db.append_chat_message(&ChatMessage::new(
                &candidate.id,
                MessageRole::Ai,
                format!("message {i}"),
            ))
            .await
            .unwrap();
            let len = db.get_chat(&candidate.id).await.unwrap().len();
            assert!(len > last_len);
            last_len = len;
        }
    }

    #[tokio::test]
    async fn test_message_score_round_trips() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(Some("Jane".into()), None, None, None);
        db.insert_candidate(&candidate).await.unwrap();

        let scored =
            ChatMessage::new(&candidate.id, MessageRole::Ai, "Good answer.").with_score(2);
        db.append_chat_message(&scored).await.unwrap();

        let chat = db.get_chat(&candidate.id).await.unwrap();
        assert_eq!(chat[0].score, Some(2));
    }
}
