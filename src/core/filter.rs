use crate::domain::model::{CourseCode, RawReview};
use crate::utils::error::{CompareError, Result};
use chrono::{DateTime, Months, NaiveDateTime, Utc};

/// Window used when nothing else is configured.
pub const DEFAULT_CUTOFF_MONTHS: u32 = 24;

/// Layout the review API uses for `date`, e.g. `2019-05-14 21:56:33 +0000 UTC`.
const API_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z UTC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(CourseCode),
    Stale,
    InvalidCourse,
}

/// `now` minus `cutoff_months` calendar months. Day-of-month is clamped, so
/// 2024-03-31 minus one month is 2024-02-29.
pub fn cutoff_limit(cutoff_months: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(cutoff_months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// True iff `review_date` is on or after the cutoff limit.
pub fn is_recent_enough(review_date: DateTime<Utc>, cutoff_months: u32, now: DateTime<Utc>) -> bool {
    review_date >= cutoff_limit(cutoff_months, now)
}

pub fn parse_review_date(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    match DateTime::parse_from_str(trimmed, API_DATE_FORMAT) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(api_err) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(parsed.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
                return Ok(naive.and_utc());
            }
            Err(CompareError::MalformedDate {
                value: value.to_string(),
                reason: api_err.to_string(),
            })
        }
    }
}

/// Decides whether a review takes part in aggregation.
#[derive(Debug, Clone, Copy)]
pub struct ReviewValidityFilter {
    cutoff_months: u32,
    now: DateTime<Utc>,
}

impl ReviewValidityFilter {
    pub fn new(cutoff_months: u32, now: DateTime<Utc>) -> Self {
        Self { cutoff_months, now }
    }

    /// Errors only when the review's date cannot be parsed. Recency is
    /// checked before the course code.
    pub fn evaluate(&self, review: &RawReview) -> Result<Verdict> {
        let date = parse_review_date(&review.date)?;
        if !is_recent_enough(date, self.cutoff_months, self.now) {
            return Ok(Verdict::Stale);
        }

        Ok(match CourseCode::parse(&review.course) {
            Some(code) => Verdict::Accepted(code),
            None => Verdict::InvalidCourse,
        })
    }
}
