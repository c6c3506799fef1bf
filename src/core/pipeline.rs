use crate::config::CompareConfig;
use crate::core::aggregator::CourseAggregator;
use crate::core::filter::ReviewValidityFilter;
use crate::core::report;
use crate::core::summary::ProfessorSummaryBuilder;
use crate::domain::model::{
    CourseMap, InstructorReviews, RawInstructor, RunStats, TransformResult,
};
use crate::domain::ports::{Pipeline, ReviewSource, Storage, TeacherSource};
use crate::utils::error::{CompareError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zip::write::{FileOptions, ZipWriter};

const JSON_FILENAME: &str = "courses.json";
const CSV_FILENAME: &str = "courses.csv";

/// Runs the aggregation over already-fetched data. Batches are folded in
/// order, so professor lists follow instructor order, then review order.
pub fn aggregate(
    builder: &ProfessorSummaryBuilder,
    data: &[InstructorReviews],
) -> Result<(CourseMap, RunStats)> {
    let mut aggregator = CourseAggregator::new();
    let mut stats = RunStats::default();

    for batch in data {
        let contribution = builder.build_contribution(&batch.instructor, &batch.reviews)?;
        tracing::debug!(
            "{}: {} of {} reviews accepted",
            contribution.summary.name,
            contribution.stats.accepted,
            contribution.stats.reviews_seen
        );
        stats.absorb(&contribution.stats);
        aggregator.ingest_contribution(&contribution);
    }

    Ok((aggregator.finalize(), stats))
}

pub struct CoursePipeline<T: TeacherSource, R: ReviewSource, S: Storage> {
    teachers: Arc<T>,
    reviews: Arc<R>,
    storage: S,
    config: CompareConfig,
    now: DateTime<Utc>,
}

impl<T, R, S> CoursePipeline<T, R, S>
where
    T: TeacherSource,
    R: ReviewSource + 'static,
    S: Storage,
{
    pub fn new(teachers: Arc<T>, reviews: Arc<R>, storage: S, config: CompareConfig) -> Self {
        Self {
            teachers,
            reviews,
            storage,
            config,
            now: Utc::now(),
        }
    }

    /// Pins the clock the recency window is measured from.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    fn summary_builder(&self) -> ProfessorSummaryBuilder {
        ProfessorSummaryBuilder::new(
            ReviewValidityFilter::new(self.config.cutoff_months(), self.now),
            self.config.malformed_date_policy(),
        )
    }

    async fn fetch_instructors(&self) -> Result<Vec<RawInstructor>> {
        let mut instructors = Vec::new();
        let mut seen = HashSet::new();

        for department in self.config.departments() {
            let found = self.teachers.list_instructors(department).await?;
            tracing::info!("👩‍🏫 Department {}: {} instructors", department, found.len());
            // 同一位老師可能出現在多個系所
            instructors.extend(found.into_iter().filter(|i| seen.insert(i.id.clone())));
        }

        Ok(instructors)
    }
}

#[async_trait::async_trait]
impl<T, R, S> Pipeline for CoursePipeline<T, R, S>
where
    T: TeacherSource,
    R: ReviewSource + 'static,
    S: Storage,
{
    async fn extract(&self) -> Result<Vec<InstructorReviews>> {
        tracing::info!(
            "🚀 Fetching instructors for {} department(s) from {}",
            self.config.departments().len(),
            self.config.endpoint()
        );
        let instructors = self.fetch_instructors().await?;

        // 並發抓取評論，數量受 concurrent_requests 限制
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests()));
        let page_size = self.config.page_size();
        let mut tasks = JoinSet::new();

        for (index, instructor) in instructors.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&self.reviews);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| CompareError::TaskError {
                        message: e.to_string(),
                    })?;
                let reviews = source.list_reviews(&instructor.id, page_size).await?;
                Ok::<_, CompareError>((index, InstructorReviews { instructor, reviews }))
            });
        }

        let mut batches = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let batch = joined.map_err(|e| CompareError::TaskError {
                message: e.to_string(),
            })??;
            batches.push(batch);
        }

        // 還原老師順序，讓彙總結果與逐一處理時相同
        batches.sort_by_key(|(index, _)| *index);
        let batches: Vec<InstructorReviews> = batches.into_iter().map(|(_, batch)| batch).collect();

        tracing::info!(
            "📊 Extracted {} reviews across {} instructors",
            batches.iter().map(|b| b.reviews.len()).sum::<usize>(),
            batches.len()
        );
        Ok(batches)
    }

    async fn transform(&self, data: Vec<InstructorReviews>) -> Result<TransformResult> {
        tracing::info!("🔧 Aggregating reviews of {} instructors", data.len());

        let (courses, stats) = aggregate(&self.summary_builder(), &data)?;

        tracing::info!(
            "✅ {} courses from {} accepted reviews ({} stale, {} invalid course, {} unreadable date)",
            courses.len(),
            stats.accepted,
            stats.stale,
            stats.invalid_course,
            stats.malformed_date
        );

        let json_output = if self.config.wants_format("json") {
            Some(report::to_json(
                &courses,
                &stats,
                self.config.cutoff_months(),
                self.now,
            )?)
        } else {
            None
        };
        let csv_output = if self.config.wants_format("csv") {
            Some(report::to_csv(&courses)?)
        } else {
            None
        };

        Ok(TransformResult {
            courses,
            stats,
            json_output,
            csv_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let outputs: Vec<(&str, &String)> = [
            (JSON_FILENAME, result.json_output.as_ref()),
            (CSV_FILENAME, result.csv_output.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, data)| data.map(|data| (name, data)))
        .collect();

        if let Some(archive) = self.config.archive_name() {
            tracing::debug!("Creating ZIP file with {} files", outputs.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &outputs {
                    zip.start_file::<_, ()>(*name, FileOptions::default())?;
                    zip.write_all(data.as_bytes())?;
                }
                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(archive, &zip_data).await?;

            let output_path = format!("{}/{}", self.config.output_path(), archive);
            tracing::info!("📦 Report saved: {}", output_path);
            return Ok(output_path);
        }

        for (name, data) in &outputs {
            self.storage.write_file(name, data.as_bytes()).await?;
            tracing::info!("💾 Wrote {}/{}", self.config.output_path(), name);
        }

        Ok(self.config.output_path().to_string())
    }
}
