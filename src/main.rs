use clap::Parser;
use svg_qr_batch::core::ConfigProvider;
use svg_qr_batch::utils::error::ErrorSeverity;
use svg_qr_batch::utils::{logger, validation::Validate};
use svg_qr_batch::{BatchEngine, CliConfig, LocalStorage, QrBatchPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting svg-qr-batch CLI");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }
    let concurrency = config.concurrency();

    // 模板在任何記錄處理前載入並檢查
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = match QrBatchPipeline::from_config(storage, config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ Template check failed: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(e.severity()));
        }
    };

    let engine = BatchEngine::new_with_monitoring(pipeline, monitor_enabled).with_concurrency(concurrency);

    match engine.run().await {
        Ok(summary) => {
            println!(
                "✅ Processing complete: {} written, {} failed",
                summary.succeeded(),
                summary.failed()
            );
            for failure in &summary.failures {
                eprintln!(
                    "  ❌ row {} ({}): {}",
                    failure.row,
                    failure.identifier.as_deref().unwrap_or("-"),
                    failure.reason
                );
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(e.severity()));
        }
    }

    Ok(())
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
