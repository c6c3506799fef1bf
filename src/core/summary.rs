use crate::core::filter::{ReviewValidityFilter, Verdict};
use crate::domain::model::{
    CourseCode, ProfessorSummary, RawInstructor, RawReview, RunStats, NOT_AVAILABLE,
};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// What to do with a review whose date cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedDatePolicy {
    #[default]
    Skip,
    Abort,
}

/// A professor's summary together with the course code of every accepted
/// review, in review order. This is what the aggregator folds.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub summary: ProfessorSummary,
    pub courses: Vec<CourseCode>,
    pub stats: RunStats,
}

// Letter grades the API reports, with grade points. Anything else
// ("Not sure yet", "Audit/No Grade", "Pass", ...) is not averaged.
const GRADE_POINTS: &[(&str, f64)] = &[
    ("A+", 4.0),
    ("A", 4.0),
    ("A-", 3.7),
    ("B+", 3.3),
    ("B", 3.0),
    ("B-", 2.7),
    ("C+", 2.3),
    ("C", 2.0),
    ("C-", 1.7),
    ("D+", 1.3),
    ("D", 1.0),
    ("D-", 0.7),
    ("F", 0.0),
];

fn grade_points(grade: &str) -> Option<f64> {
    let grade = grade.trim();
    GRADE_POINTS
        .iter()
        .find(|(letter, _)| letter.eq_ignore_ascii_case(grade))
        .map(|(_, points)| *points)
}

/// Nearest letter to an average; on a tie the higher letter wins.
fn letter_for(points: f64) -> &'static str {
    let mut best = GRADE_POINTS[1];
    for candidate in GRADE_POINTS.iter().skip(1) {
        if (candidate.1 - points).abs() < (best.1 - points).abs() {
            best = *candidate;
        }
    }
    best.0
}

#[derive(Default)]
struct ReviewAccumulator<'a> {
    accepted: u32,
    grade_total: f64,
    graded: u32,
    top: Option<(&'a RawReview, i32)>,
}

impl<'a> ReviewAccumulator<'a> {
    fn accept(&mut self, review: &'a RawReview) {
        self.accepted += 1;

        if let Some(points) = review.grade.as_deref().and_then(grade_points) {
            self.grade_total += points;
            self.graded += 1;
        }

        if review.comment.trim().is_empty() || review.is_flagged() {
            return;
        }
        let score = review.helpful_rating + review.clarity_rating;
        match self.top {
            Some((_, best)) if best >= score => {}
            _ => self.top = Some((review, score)),
        }
    }

    fn avg_grade(&self) -> String {
        if self.graded == 0 {
            return NOT_AVAILABLE.to_string();
        }
        letter_for(self.grade_total / self.graded as f64).to_string()
    }

    fn top_review(&self) -> String {
        self.top
            .map(|(review, _)| review.comment.trim().to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

pub struct ProfessorSummaryBuilder {
    filter: ReviewValidityFilter,
    on_malformed_date: MalformedDatePolicy,
}

impl ProfessorSummaryBuilder {
    pub fn new(filter: ReviewValidityFilter, on_malformed_date: MalformedDatePolicy) -> Self {
        Self {
            filter,
            on_malformed_date,
        }
    }

    pub fn build(&self, instructor: &RawInstructor, reviews: &[RawReview]) -> Result<ProfessorSummary> {
        self.build_contribution(instructor, reviews)
            .map(|contribution| contribution.summary)
    }

    /// Rating, would-take-again and difficulty averages come from the
    /// instructor record; review-derived fields count accepted reviews only.
    pub fn build_contribution(
        &self,
        instructor: &RawInstructor,
        reviews: &[RawReview],
    ) -> Result<Contribution> {
        let name = instructor.display_name();
        let mut acc = ReviewAccumulator::default();
        let mut courses = Vec::new();
        let mut stats = RunStats {
            instructors: 1,
            reviews_seen: reviews.len(),
            ..RunStats::default()
        };

        for review in reviews {
            let verdict = match self.filter.evaluate(review) {
                Ok(verdict) => verdict,
                Err(e) => match self.on_malformed_date {
                    MalformedDatePolicy::Abort => return Err(e),
                    MalformedDatePolicy::Skip => {
                        tracing::warn!("Skipping review for {}: {}", name, e);
                        stats.malformed_date += 1;
                        continue;
                    }
                },
            };

            match verdict {
                Verdict::Accepted(code) => {
                    acc.accept(review);
                    courses.push(code);
                    stats.accepted += 1;
                }
                Verdict::Stale => stats.stale += 1,
                Verdict::InvalidCourse => {
                    tracing::debug!("Ignoring review with course {:?} for {}", review.course, name);
                    stats.invalid_course += 1;
                }
            }
        }

        let summary = ProfessorSummary {
            name,
            num_reviews: acc.accepted,
            avg_rating: instructor.avg_rating,
            avg_would_take_again: instructor.would_take_again_percent,
            avg_difficulty: instructor.avg_difficulty,
            top_review: acc.top_review(),
            avg_grade: acc.avg_grade(),
        };

        Ok(Contribution {
            summary,
            courses,
            stats,
        })
    }
}
