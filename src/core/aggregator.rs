//! Folds professor summaries into per-course aggregates.
//!
//! Lifecycle: construct, ingest once per accepted review, then
//! [`CourseAggregator::finalize`] into an immutable [`CourseMap`].

use crate::core::summary::Contribution;
use crate::domain::model::{Course, CourseCode, CourseMap, ProfessorSummary};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct CourseEntry {
    course: Course,
    names: HashSet<String>,
}

impl CourseEntry {
    fn new(code: CourseCode, professor: &ProfessorSummary) -> Self {
        Self {
            course: Course {
                code,
                num_professors: 1,
                num_reviews: 1,
                professors: vec![professor.clone()],
            },
            names: HashSet::from([professor.name.clone()]),
        }
    }

    fn add_review(&mut self, professor: &ProfessorSummary) {
        self.course.num_reviews += 1;
        if self.names.insert(professor.name.clone()) {
            self.course.professors.push(professor.clone());
            self.course.num_professors += 1;
        }
    }
}

/// Owns the course mapping for one aggregation run. Mutation goes through
/// `&mut self`, so concurrent callers must funnel through a single owner.
#[derive(Debug, Default)]
pub struct CourseAggregator {
    courses: HashMap<CourseCode, CourseEntry>,
}

impl CourseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One call per accepted review. Review counts always grow; the
    /// professor list only grows for a display name not seen on this course.
    pub fn ingest(&mut self, code: CourseCode, professor: &ProfessorSummary) {
        match self.courses.get_mut(&code) {
            Some(entry) => entry.add_review(professor),
            None => {
                let entry = CourseEntry::new(code.clone(), professor);
                self.courses.insert(code, entry);
            }
        }
    }

    pub fn ingest_contribution(&mut self, contribution: &Contribution) {
        for code in &contribution.courses {
            self.ingest(code.clone(), &contribution.summary);
        }
    }

    /// Reduce step for partial aggregators. `other`'s professors are
    /// appended after this aggregator's, in `other`'s order.
    pub fn merge(&mut self, other: CourseAggregator) {
        for (code, incoming) in other.courses {
            match self.courses.get_mut(&code) {
                Some(entry) => {
                    entry.course.num_reviews += incoming.course.num_reviews;
                    for professor in incoming.course.professors {
                        if entry.names.insert(professor.name.clone()) {
                            entry.course.professors.push(professor);
                            entry.course.num_professors += 1;
                        }
                    }
                }
                None => {
                    self.courses.insert(code, incoming);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn finalize(self) -> CourseMap {
        CourseMap::from_map(
            self.courses
                .into_iter()
                .map(|(code, entry)| (code, entry.course))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NOT_AVAILABLE;

    fn professor(name: &str) -> ProfessorSummary {
        ProfessorSummary {
            name: name.to_string(),
            num_reviews: 0,
            avg_rating: 4.0,
            avg_would_take_again: 75.0,
            avg_difficulty: 3.0,
            top_review: NOT_AVAILABLE.to_string(),
            avg_grade: NOT_AVAILABLE.to_string(),
        }
    }

    fn code(raw: &str) -> CourseCode {
        CourseCode::parse(raw).unwrap()
    }

    #[test]
    fn test_first_ingest_creates_course() {
        let mut aggregator = CourseAggregator::new();
        aggregator.ingest(code("CS101"), &professor("Jane Doe"));

        let courses = aggregator.finalize();
        let course = courses.get("CS-101").unwrap();
        assert_eq!(course.num_professors, 1);
        assert_eq!(course.num_reviews, 1);
        assert_eq!(course.professors[0].name, "Jane Doe");
    }

    #[test]
    fn test_professors_deduplicated_by_name() {
        let mut aggregator = CourseAggregator::new();
        let a = professor("Ada Lovelace");
        let b = professor("Alan Turing");
        aggregator.ingest(code("CS-101"), &a);
        aggregator.ingest(code("CS-101"), &b);
        aggregator.ingest(code("CS-101"), &a);
        aggregator.ingest(code("CS-101"), &a);

        let courses = aggregator.finalize();
        let course = courses.get("CS-101").unwrap();
        assert_eq!(course.num_professors, 2);
        assert_eq!(course.num_reviews, 4);
        let names: Vec<&str> = course.professors.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_empty_aggregator_finalizes_empty() {
        let aggregator = CourseAggregator::new();
        assert!(aggregator.is_empty());
        assert!(aggregator.finalize().is_empty());
    }

    #[test]
    fn test_merge_matches_sequential_ingest() {
        let a = professor("Ada Lovelace");
        let b = professor("Alan Turing");

        let mut sequential = CourseAggregator::new();
        sequential.ingest(code("MATH123"), &a);
        sequential.ingest(code("MATH123"), &b);
        sequential.ingest(code("CS-7"), &b);
        sequential.ingest(code("MATH123"), &a);

        let mut left = CourseAggregator::new();
        left.ingest(code("MATH123"), &a);
        let mut right = CourseAggregator::new();
        right.ingest(code("MATH123"), &b);
        right.ingest(code("CS-7"), &b);
        right.ingest(code("MATH123"), &a);
        left.merge(right);

        assert_eq!(left.len(), 2);
        assert_eq!(left.finalize(), sequential.finalize());
    }
}
