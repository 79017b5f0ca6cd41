use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile fields collected before a test can start, in the fixed order the
/// chat flow asks for them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    Name,
    Email,
    Phone,
}

impl ProfileField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
        }
    }

    pub fn prompt(&self) -> String {
        format!("Please provide your {}.", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_file_name: Option<String>,
    pub score: i64,
    pub summary: Option<String>,
    pub test_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        resume_file_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            resume_file_name,
            score: 0,
            summary: None,
            test_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Next missing profile field in the fixed name -> email -> phone order.
    pub fn next_missing_field(&self) -> Option<ProfileField> {
        if self.name.as_deref().map_or(true, |s| s.trim().is_empty()) {
            Some(ProfileField::Name)
        } else if self.email.as_deref().map_or(true, |s| s.trim().is_empty()) {
            Some(ProfileField::Email)
        } else if self.phone.as_deref().map_or(true, |s| s.trim().is_empty()) {
            Some(ProfileField::Phone)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_follow_fixed_order() {
        let mut c = Candidate::new(None, None, None, None);
        assert_eq!(c.next_missing_field(), Some(ProfileField::Name));

        c.name = Some("Jane Doe".into());
        assert_eq!(c.next_missing_field(), Some(ProfileField::Email));

        c.email = Some("jane@x.com".into());
        assert_eq!(c.next_missing_field(), Some(ProfileField::Phone));

        c.phone = Some("9876543210".into());
        assert_eq!(c.next_missing_field(), None);
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut c = Candidate::new(Some("  ".into()), None, None, None);
        assert_eq!(c.next_missing_field(), Some(ProfileField::Name));

        c.name = Some("Jane".into());
        c.email = Some(String::new());
        assert_eq!(c.next_missing_field(), Some(ProfileField::Email));
    }
}
