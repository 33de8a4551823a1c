//! Tsuyaku - batch document translation
//!
//! Entry point for the command line tool that translates subtitle, document
//! and PDF files and packages the results into one archive.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use tsuyaku::batch::BatchReport;
use tsuyaku::cli::{Args, Commands};
use tsuyaku::config::{Config, TranslationProvider};
use tsuyaku::error::TsuyakuError;
use tsuyaku::language::{resolve_code, SUPPORTED_LANGUAGES, AUTO_DETECT};
use tsuyaku::progress::ConsoleProgress;
use tsuyaku::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Languages => {
            println!("\nSupported Languages:");
            println!("{:<15} {:<10}", "Name", "Code");
            println!("{}", "-".repeat(25));
            println!("{:<15} {:<10}", "Auto-detect", AUTO_DETECT);
            for (name, code) in SUPPORTED_LANGUAGES {
                println!("{:<15} {:<10}", name, code);
            }
        }
        Commands::InitConfig { path } => {
            Config::default().save_to_file(&path)?;
            println!("Default configuration written to {}", path.display());
        }
        Commands::Translate { paths, source, target, output_dir, provider, jobs, no_archive } => {
            if let Some(source) = source {
                config.translate.source_language = normalize_language(&source);
            }
            if let Some(target) = target {
                config.translate.target_language = normalize_language(&target);
            }
            if let Some(provider) = provider {
                config.translate.provider = parse_provider(&provider)?;
            }
            if let Some(jobs) = jobs {
                config.batch.max_concurrent_files = jobs.max(1);
            }

            let workflow = Workflow::new(config)?;
            let inputs = workflow.collect_inputs(&paths[..]).await?;
            if inputs.is_empty() {
                return Err(anyhow::anyhow!("No supported files found"));
            }

            let progress = ConsoleProgress::new(inputs.len());
            let outcome = workflow.run(&inputs, &output_dir, !no_archive, &progress).await?;

            print_summary(&outcome.report);
            for path in &outcome.written {
                println!("Written: {}", path.display());
            }

            if outcome.report.successes().is_empty() {
                return Err(anyhow::anyhow!("All {} files failed to translate", outcome.report.len()));
            }
        }
    }

    info!("Tsuyaku completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".tsuyaku").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "tsuyaku.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("tsuyaku.log").display());

    Ok(())
}

/// Accept a language code or English name, keeping unknown input for validation later
fn normalize_language(input: &str) -> String {
    resolve_code(input)
        .map(str::to_string)
        .unwrap_or_else(|| input.trim().to_string())
}

/// Parse translation provider from string
fn parse_provider(provider: &str) -> Result<TranslationProvider> {
    match provider.to_lowercase().as_str() {
        "google" => Ok(TranslationProvider::Google),
        "ollama" => Ok(TranslationProvider::Ollama),
        _ => Err(TsuyakuError::Config(format!(
            "Invalid provider '{}'. Valid providers: google, ollama",
            provider
        )).into()),
    }
}

fn print_summary(report: &BatchReport) {
    println!("\nTranslation Summary:");
    println!("Translated: {}", report.successes().len());
    println!("Failed: {}", report.failures().len());

    for (category, lines) in report.error_summary() {
        println!("\n{}:", category);
        for line in lines {
            println!("  {}", line);
        }
    }
}
