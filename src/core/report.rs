//! Machine-readable renderings of a [`CourseMap`]. Courses are emitted in
//! code order so outputs are reproducible.

use crate::domain::model::{Course, CourseMap, RunStats};
use crate::utils::error::{CompareError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    cutoff_months: u32,
    stats: &'a RunStats,
    courses: Vec<&'a Course>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    course: &'a str,
    num_professors: u32,
    course_reviews: u32,
    professor: &'a str,
    professor_reviews: u32,
    avg_rating: f64,
    avg_would_take_again: f64,
    avg_difficulty: f64,
    avg_grade: &'a str,
    top_review: &'a str,
}

pub fn to_json(
    courses: &CourseMap,
    stats: &RunStats,
    cutoff_months: u32,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let report = JsonReport {
        generated_at,
        cutoff_months,
        stats,
        courses: courses.sorted(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// One row per (course, professor) pair, professors in first-seen order.
pub fn to_csv(courses: &CourseMap) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for course in courses.sorted() {
        for professor in &course.professors {
            writer.serialize(CsvRow {
                course: course.code.as_str(),
                num_professors: course.num_professors,
                course_reviews: course.num_reviews,
                professor: &professor.name,
                professor_reviews: professor.num_reviews,
                avg_rating: professor.avg_rating,
                avg_would_take_again: professor.avg_would_take_again,
                avg_difficulty: professor.avg_difficulty,
                avg_grade: &professor.avg_grade,
                top_review: &professor.top_review,
            })?;
        }
    }

    let data = writer
        .into_inner()
        .map_err(|e| CompareError::IoError(e.into_error()))?;
    String::from_utf8(data).map_err(|e| CompareError::IoError(std::io::Error::other(e)))
}
