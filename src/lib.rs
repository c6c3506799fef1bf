pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;
pub use crate::config::CompareConfig;

pub use crate::adapters::{graphql::GraphQlClient, storage::LocalStorage};
pub use crate::core::{
    aggregator::CourseAggregator,
    etl::EtlEngine,
    filter::{ReviewValidityFilter, Verdict},
    pipeline::CoursePipeline,
    summary::{MalformedDatePolicy, ProfessorSummaryBuilder},
};
pub use crate::domain::model::{
    Course, CourseCode, CourseMap, ProfessorSummary, RawInstructor, RawReview,
};
pub use crate::utils::error::{CompareError, Result};
