use anyhow::Context;
use clap::Parser;
use course_compare::utils::error::ErrorSeverity;
use course_compare::utils::{logger, validation::Validate};
use course_compare::{CliArgs, CompareConfig, CoursePipeline, EtlEngine, GraphQlClient, LocalStorage};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入 TOML 配置
    let mut config = CompareConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    tracing::info!("Starting course-compare");
    tracing::info!("📁 Loaded configuration from: {}", args.config);
    args.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be sent");
        tracing::info!("  School: {}", config.school.id);
        for department in config.departments() {
            tracing::info!("  Department: {}", department);
        }
        tracing::info!(
            "  Endpoint: {} (page size {}, {} concurrent requests)",
            config.endpoint(),
            config.page_size(),
            config.concurrent_requests()
        );
        tracing::info!(
            "  Reviews older than {} months are ignored; output goes to {} as {:?}",
            config.cutoff_months(),
            config.output_path(),
            config.load.output_formats
        );
        return Ok(());
    }

    // 建立資料來源、存儲與管道
    let client = Arc::new(GraphQlClient::from_config(&config));
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = CoursePipeline::new(Arc::clone(&client), client, storage, config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Aggregation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Aggregation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}
