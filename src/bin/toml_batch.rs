use anyhow::Context;
use clap::Parser;
use std::collections::HashMap;
use svg_qr_batch::core::{ConfigProvider, Pipeline};
use svg_qr_batch::utils::error::ErrorSeverity;
use svg_qr_batch::utils::{logger, validation::Validate};
use svg_qr_batch::{BatchEngine, LocalStorage, QrBatchPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-batch")]
#[command(about = "QR batch stamping driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "qr-batch.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override batch.concurrency from config
    #[arg(long)]
    concurrency: Option<usize>,

    /// Check template and CSV without writing any file
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("🚀 Starting TOML-based QR batch");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(concurrency) = args.concurrency {
        config.batch.concurrency = Some(concurrency);
        tracing::info!("🔧 Concurrency overridden to: {}", concurrency);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let concurrency = config.concurrency();
    let storage = LocalStorage::new(config.output_path().to_string());

    let pipeline = match QrBatchPipeline::from_config(storage, config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ Template check failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        return perform_dry_run(&pipeline).await;
    }

    let engine = BatchEngine::new_with_monitoring(pipeline, monitor_enabled).with_concurrency(concurrency);

    match engine.run().await {
        Ok(summary) => {
            println!("✅ Batch completed: {} of {} records written", summary.succeeded(), summary.total);
            if summary.failed() > 0 {
                println!("⚠️ {} records failed:", summary.failed());
                for failure in &summary.failures {
                    println!(
                        "  row {} ({}): {}",
                        failure.row,
                        failure.identifier.as_deref().unwrap_or("-"),
                        failure.reason
                    );
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Batch: {}", config.batch.name);
    if let Some(description) = &config.batch.description {
        println!("  Description: {}", description);
    }
    println!("  CSV: {}", config.csv_path());
    println!("  Template: {} (group '{}')", config.template_path(), config.group_id());
    println!("  Output: {}", config.output_path());
    println!(
        "  Fields: payload={} fallback={} id={}",
        config.payload_field(),
        config.fallback_payload_field(),
        config.identifier_field()
    );
    println!("  Concurrency: {}", config.concurrency());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run<P: Pipeline>(pipeline: &P) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");

    let records = pipeline.extract().await.context("Failed to read CSV input")?;
    let mut per_identifier: HashMap<String, usize> = HashMap::new();
    let mut unnamed = 0;
    for record in &records {
        match pipeline.record_label(record) {
            Some(identifier) => *per_identifier.entry(identifier).or_default() += 1,
            None => unnamed += 1,
        }
    }

    println!("  📊 Records: {}", records.len());
    println!("  📄 Distinct output files: {}", per_identifier.len());
    if unnamed > 0 {
        println!("  ⚠️ Records without identifier (will fail): {}", unnamed);
    }

    let mut duplicates: Vec<(&String, &usize)> = per_identifier.iter().filter(|(_, n)| **n > 1).collect();
    duplicates.sort();
    for (identifier, count) in duplicates {
        println!("  ⚠️ {}.svg is produced {} times; the last row wins", identifier, count);
    }

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
