use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting aggregation run...");

        // Extract
        let batches = self.pipeline.extract().await?;
        tracing::info!("Extracted {} instructors in {:?}", batches.len(), started.elapsed());

        // Transform
        let result = self.pipeline.transform(batches).await?;
        tracing::info!(
            "Aggregated {} courses ({} accepted reviews)",
            result.courses.len(),
            result.stats.accepted
        );

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {} ({:?} total)", output_path, started.elapsed());

        Ok(output_path)
    }
}
