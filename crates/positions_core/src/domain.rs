//! crates/positions_core/src/domain.rs
//!
//! Defines the core data structures for the positions service.
//! These structs are independent of any database; they derive `serde` traits
//! because interview results are stored as JSON and decoded by the core.

use serde::{Deserialize, Serialize};

/// Status code every newly created position starts with.
pub const STATUS_DRAFT: i32 = 0;

/// A job posting, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub public_id: String,
    pub name: String,
    pub status: i32,
    pub skills: Vec<String>,
    pub company: Option<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recruiter_public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The fields a recruiter supplies when creating a position.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub name: String,
    pub description: Option<String>,
    pub status: i32,
    pub skills: Vec<String>,
    pub recruiter_public_id: String,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<i32>,
}

/// The company a recruiter belongs to. Read-only from this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub public_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An interview question attached to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub public_id: String,
    pub position_public_id: String,
    pub name: String,
    /// Seconds the candidate gets to read the question.
    pub read_duration: i32,
    /// Seconds the candidate gets to answer.
    pub answer_duration: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub name: String,
    pub read_duration: i32,
    pub answer_duration: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionUpdate {
    pub name: Option<String>,
    pub read_duration: Option<i32>,
    pub answer_duration: Option<i32>,
}

/// An interview row with its result still in stored (JSON text) form.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInterview {
    pub public_id: String,
    pub candidate_public_id: Option<String>,
    pub result: Option<String>,
}

/// An interview with its result decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interview {
    pub public_id: String,
    pub candidate_public_id: Option<String>,
    pub result: Option<InterviewResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewResult {
    pub questions: Vec<QuestionResult>,
    pub score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionResult {
    pub question: String,
    pub question_type: String,
    pub evaluation: String,
    pub score: i32,
    pub video_link: String,
    pub emotion_results: Vec<EmotionResult>,
    pub answer: String,
    pub emotion: String,
}

/// One emotion-detection sample taken while the candidate answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionResult {
    pub emotion: String,
    pub exact_time: f64,
    pub duration: f64,
}

/// The authenticated caller, as injected by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub public_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Recruiter,
    Candidate,
    #[serde(other)]
    Unknown,
}

/// Largest page a caller may ask for; bigger sizes are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-indexed page request. Both fields are always at least 1 and `size`
/// is at most `MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub num: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(num: u32, size: u32) -> Self {
        Self {
            num: num.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL `OFFSET` for this page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.num) - 1).saturating_mul(i64::from(self.size))
    }

    /// SQL `LIMIT` for this page.
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// One page of results plus the total row count for the same filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: i64,
}

/// Removes repeated skill names, keeping the first occurrence of each.
pub fn dedup_skills(skills: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_zero_based() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
        assert_eq!(PageRequest::new(2, 10).limit(), 10);
    }

    #[test]
    fn page_clamps_to_one() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.num, 1);
        assert_eq!(page.size, 1);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let page = PageRequest::new(u32::MAX, u32::MAX);
        assert_eq!(page.size, MAX_PAGE_SIZE);
        assert_eq!(page.limit(), i64::from(MAX_PAGE_SIZE));
        assert_eq!(page.offset(), (i64::from(u32::MAX) - 1) * i64::from(MAX_PAGE_SIZE));
        assert!(page.offset() > 0);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let skills: Vec<String> = ["SQL", "Go", "SQL", "Go"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(dedup_skills(&skills), vec!["SQL".to_string(), "Go".to_string()]);
    }

    #[test]
    fn result_decodes_with_missing_fields() {
        let json = r#"{"questions":[{"question":"Why Rust?","score":7,
            "emotion_results":[{"emotion":"happy","exact_time":1.5,"duration":0.5}]}],"score":70}"#;
        let result: InterviewResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.score, 70);
        assert_eq!(result.questions[0].question, "Why Rust?");
        assert_eq!(result.questions[0].emotion_results[0].exact_time, 1.5);
        assert!(result.questions[0].video_link.is_empty());
    }

    #[test]
    fn unknown_role_does_not_fail() {
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Unknown);
        let role: Role = serde_json::from_str("\"candidate\"").unwrap();
        assert_eq!(role, Role::Candidate);
    }
}
