pub mod aggregator;
pub mod etl;
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod summary;

pub use crate::domain::model::TransformResult;
pub use crate::domain::ports::{Pipeline, ReviewSource, Storage, TeacherSource};
pub use crate::utils::error::Result;
