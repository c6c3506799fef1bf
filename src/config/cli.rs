use crate::config::CompareConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "course-compare")]
#[command(about = "Regroup instructor reviews by course to compare who teaches what")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "course-compare.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Replace the configured departments (repeatable)
    #[arg(long = "department")]
    pub departments: Vec<String>,

    /// Override filter.cutoff_months
    #[arg(long)]
    pub cutoff_months: Option<u32>,

    /// Override load.output_path
    #[arg(long)]
    pub output_path: Option<String>,

    /// Validate the configuration and show what would be fetched
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 應用命令列覆蓋設定
    pub fn apply_overrides(&self, config: &mut CompareConfig) {
        if !self.departments.is_empty() {
            config.school.departments = self.departments.clone();
            tracing::info!("🔧 Departments overridden to: {:?}", self.departments);
        }
        if let Some(months) = self.cutoff_months {
            config.filter.cutoff_months = Some(months);
            tracing::info!("🔧 Review cutoff overridden to {} months", months);
        }
        if let Some(path) = &self.output_path {
            config.load.output_path = path.clone();
        }
    }
}
