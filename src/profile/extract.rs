use once_cell::sync::Lazy;
use regex::Regex;

// Deliberately loose patterns: extraction is best-effort and anything it
// misses gets collected through the chat flow instead.
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex")
});
static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?\d{1,3}[\s-]?)?(\(?\d{2,4}\)?[\s-]?)?\d{6,10}").expect("phone regex")
});

#[derive(Debug, Clone, Default)]
pub struct ExtractedProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Best-effort field extraction from raw resume text. Never fails; absent
/// fields are simply `None`.
pub fn extract_profile(raw_text: &str) -> ExtractedProfile {
    ExtractedProfile {
        name: find_name(raw_text),
        email: find_email(raw_text),
        phone: find_phone(raw_text),
    }
}

/// The line directly above the first contact line usually holds the name;
/// otherwise fall back to the first two words of the document.
fn find_name(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    for (i, line) in lines.iter().enumerate() {
        if EMAIL.is_match(line) || PHONE.is_match(line) {
            if i > 0 {
                return Some(lines[i - 1].to_string());
            }
            break;
        }
    }

    let first = lines.first()?;
    let words: Vec<&str> = first.split_whitespace().take(2).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn find_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_string())
}

fn find_phone(text: &str) -> Option<String> {
    PHONE.find(text).map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_all_fields_from_contact_block() {
        let profile = extract_profile("Jane Doe\njane@x.com\n9876543210");
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.email.as_deref(), Some("jane@x.com"));
        assert_eq!(profile.phone.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_name_is_line_above_contact_line() {
        let text = "Senior Engineer\nRavi Kumar\nravi.kumar@example.org | +91 9812345678";
        let profile = extract_profile(text);
        assert_eq!(profile.name.as_deref(), Some("Ravi Kumar"));
        assert_eq!(profile.email.as_deref(), Some("ravi.kumar@example.org"));
    }

    #[test]
    fn test_name_falls_back_to_first_words() {
        let profile = extract_profile("John Q Public\nTen years of backend experience");
        assert_eq!(profile.name.as_deref(), Some("John Q"));
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_missing_fields_are_none() {
        let profile = extract_profile("A resume without any contact details");
        assert!(profile.email.is_none());
        assert!(profile.phone.is_none());
    }

    #[test]
    fn test_empty_input() {
        let profile = extract_profile("");
        assert!(profile.name.is_none());
        assert!(profile.email.is_none());
        assert!(profile.phone.is_none());
    }
}
