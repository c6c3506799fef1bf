use crate::domain::model::{InstructorReviews, RawInstructor, RawReview, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Supplies the instructors of one department. Pagination is exhausted
/// before returning.
#[async_trait]
pub trait TeacherSource: Send + Sync {
    async fn list_instructors(&self, department_id: &str) -> Result<Vec<RawInstructor>>;
}

/// Supplies the reviews of one instructor, in API order.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn list_reviews(&self, instructor_id: &str, page_size: usize) -> Result<Vec<RawReview>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<InstructorReviews>>;
    async fn transform(&self, data: Vec<InstructorReviews>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
