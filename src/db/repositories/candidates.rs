use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{helpers::parse_datetime, Database};
use crate::models::{Candidate, ProfileField};

fn row_to_candidate(row: &Row) -> Result<Candidate> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let test_completed: i64 = row.get("test_completed")?;

    Ok(Candidate {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        resume_file_name: row.get("resume_file_name")?,
        score: row.get("score")?,
        summary: row.get("summary")?,
        test_completed: test_completed != 0,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

const CANDIDATE_COLUMNS: &str =
    "id, name, email, phone, resume_file_name, score, summary, test_completed, created_at, updated_at";

impl Database {
    pub async fn insert_candidate(&self, candidate: &Candidate) -> Result<()> {
        let record = candidate.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO candidates (id, name, email, phone, resume_file_name, score, summary, test_completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.name,
                    record.email,
                    record.phone,
                    record.resume_file_name,
                    record.score,
                    record.summary,
                    record.test_completed as i64,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn update_candidate_field(
        &self,
        candidate_id: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<()> {
        let candidate_id = candidate_id.to_string();
        let value = value.to_string();
        let updated_at = Utc::now().to_rfc3339();
        self.execute(move |conn| {
            let sql = match field {
                ProfileField::Name => {
                    "UPDATE candidates SET name = ?1, updated_at = ?2 WHERE id = ?3"
                }
                ProfileField::Email => {
                    "UPDATE candidates SET email = ?1, updated_at = ?2 WHERE id = ?3"
                }
                ProfileField::Phone => {
                    "UPDATE candidates SET phone = ?1, updated_at = ?2 WHERE id = ?3"
                }
            };
            conn.execute(sql, params![value, updated_at, candidate_id])?;
            Ok(())
        })
        .await
    }

    /// Final write of an interview run: score, summary, completion mark.
    pub async fn set_candidate_result(
        &self,
        candidate_id: &str,
        score: i64,
        summary: &str,
    ) -> Result<()> {
        let candidate_id = candidate_id.to_string();
        let summary = summary.to_string();
        let updated_at = Utc::now().to_rfc3339();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE candidates
                 SET score = ?1,
                     summary = ?2,
                     test_completed = 1,
                     updated_at = ?3
                 WHERE id = ?4",
                params![score, summary, updated_at, candidate_id],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_candidate(&self, candidate_id: &str) -> Result<Option<Candidate>> {
        let candidate_id = candidate_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1"
            ))?;

            stmt.query_row(params![candidate_id], |row| {
                Ok(row_to_candidate(row))
            })
            .optional()?
            .transpose()
        })
        .await
    }

    pub async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY created_at ASC, id ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut candidates = Vec::new();
            while let Some(row) = rows.next()? {
                candidates.push(row_to_candidate(row)?);
            }
            Ok(candidates)
        })
        .await
    }

    /// Removes the candidate row; chat messages go with it via cascade.
    pub async fn delete_candidate(&self, candidate_id: &str) -> Result<()> {
        let candidate_id = candidate_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM candidates WHERE id = ?1", params![candidate_id])?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{Candidate, ChatMessage, MessageRole, ProfileField};

    #[tokio::test]
    async fn test_insert_and_get_candidate() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(Some("Jane Doe".into()), None, None, Some("jane.pdf".into()));
        db.insert_candidate(&candidate).await.unwrap();

        let loaded = db.get_candidate(&candidate.id).await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Jane Doe"));
        assert_eq!(loaded.resume_file_name.as_deref(), Some("jane.pdf"));
        assert_eq!(loaded.score, 0);
        assert!(!loaded.test_completed);
    }

    #[tokio::test]
    async fn test_update_profile_fields() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(None, None, None, None);
        db.insert_candidate(&candidate).await.unwrap();

        db.update_candidate_field(&candidate.id, ProfileField::Name, "Jane Doe")
            .await
            .unwrap();
        db.update_candidate_field(&candidate.id, ProfileField::Email, "jane@x.com")
            .await
            .unwrap();

        let loaded = db.get_candidate(&candidate.id).await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Jane Doe"));
        assert_eq!(loaded.email.as_deref(), Some("jane@x.com"));
        assert_eq!(loaded.next_missing_field(), Some(ProfileField::Phone));
    }

    #[tokio::test]
    async fn test_set_result_marks_completed() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(Some("Jane".into()), None, None, None);
        db.insert_candidate(&candidate).await.unwrap();

        db.set_candidate_result(&candidate.id, 9, "Strong on fundamentals.")
            .await
            .unwrap();

        let loaded = db.get_candidate(&candidate.id).await.unwrap().unwrap();
        assert!(loaded.test_completed);
        assert_eq!(loaded.score, 9);
        assert_eq!(loaded.summary.as_deref(), Some("Strong on fundamentals."));
    }

    #[tokio::test]
    async fn test_delete_cascades_chat() {
        let db = Database::new_in_memory().unwrap();
        let candidate = Candidate::new(Some("Jane".into()), None, None, None);
        db.insert_candidate(&candidate).await.unwrap();
        db.append_chat_message(&ChatMessage::new(&candidate.id, MessageRole::Ai, "hello"))
            .await
            .unwrap();

        db.delete_candidate(&candidate.id).await.unwrap();

        assert!(db.get_candidate(&candidate.id).await.unwrap().is_none());
        assert!(db.get_chat(&candidate.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let db = Database::new_in_memory().unwrap();
        let first = Candidate::new(Some("A".into()), None, None, None);
        let second = Candidate::new(Some("B".into()), None, None, None);
        db.insert_candidate(&first).await.unwrap();
        db.insert_candidate(&second).await.unwrap();

        let listed = db.list_candidates().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }
}
