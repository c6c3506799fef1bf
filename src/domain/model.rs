use crate::core::normalizer;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{hash_map, HashMap};
use std::fmt;

/// Placeholder for summary fields no review could fill in.
pub const NOT_AVAILABLE: &str = "N/A";

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// The API reports "would take again" as a bool, 1/0, or null.
fn tri_state<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Bool(flag)) => Some(flag),
        Some(serde_json::Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None,
    })
}

/// One student rating as delivered by the review API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    #[serde(rename = "class", default, deserialize_with = "null_as_default")]
    pub course: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub helpful_rating: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clarity_rating: i32,
    #[serde(rename = "difficultyRatingRounded", default, deserialize_with = "null_as_default")]
    pub difficulty_rating: i32,
    #[serde(rename = "iWouldTakeAgain", default, deserialize_with = "tri_state")]
    pub would_take_again: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flag_status: String,
}

impl RawReview {
    pub fn is_flagged(&self) -> bool {
        self.flag_status.eq_ignore_ascii_case("FLAGGED")
    }
}

/// An instructor card from the teacher search, with upstream aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstructor {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_difficulty: f64,
    #[serde(rename = "avgRatingRounded", default, deserialize_with = "null_as_default")]
    pub avg_rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_ratings: u32,
    #[serde(rename = "wouldTakeAgainPercentRounded", default, deserialize_with = "null_as_default")]
    pub would_take_again_percent: f64,
}

impl RawInstructor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Canonical `DEPT-NUMBER` course identifier.
///
/// The only constructor is [`CourseCode::parse`], which normalizes and
/// validates, so every `CourseCode` in the program has the canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CourseCode(String);

impl CourseCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalizer::normalize(raw);
        normalizer::is_valid(&normalized).then_some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessorSummary {
    pub name: String,
    pub num_reviews: u32,
    pub avg_rating: f64,
    pub avg_would_take_again: f64,
    pub avg_difficulty: f64,
    pub top_review: String,
    pub avg_grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub code: CourseCode,
    pub num_professors: u32,
    pub num_reviews: u32,
    pub professors: Vec<ProfessorSummary>,
}

impl Course {
    pub fn professor(&self, name: &str) -> Option<&ProfessorSummary> {
        self.professors.iter().find(|p| p.name == name)
    }
}

/// Result of one aggregation run. Iteration order is unspecified; use
/// [`CourseMap::sorted`] when a stable order matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseMap {
    courses: HashMap<CourseCode, Course>,
}

impl CourseMap {
    pub(crate) fn from_map(courses: HashMap<CourseCode, Course>) -> Self {
        Self { courses }
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        CourseCode::parse(code).and_then(|code| self.courses.get(&code))
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn iter(&self) -> hash_map::Values<'_, CourseCode, Course> {
        self.courses.values()
    }

    pub fn sorted(&self) -> Vec<&Course> {
        let mut courses: Vec<&Course> = self.courses.values().collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        courses
    }
}

/// Extract output: an instructor and every review fetched for it.
#[derive(Debug, Clone)]
pub struct InstructorReviews {
    pub instructor: RawInstructor,
    pub reviews: Vec<RawReview>,
}

/// Per-run counters, logged at the end of transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub instructors: usize,
    pub reviews_seen: usize,
    pub accepted: usize,
    pub stale: usize,
    pub invalid_course: usize,
    pub malformed_date: usize,
}

impl RunStats {
    pub fn absorb(&mut self, other: &RunStats) {
        self.instructors += other.instructors;
        self.reviews_seen += other.reviews_seen;
        self.accepted += other.accepted;
        self.stale += other.stale;
        self.invalid_course += other.invalid_course;
        self.malformed_date += other.malformed_date;
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub courses: CourseMap,
    pub stats: RunStats,
    pub json_output: Option<String>,
    pub csv_output: Option<String>,
}
