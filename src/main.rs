use clap::Parser;
use tracing_subscriber::EnvFilter;

use onchain_baseline::cli::Cli;
use onchain_baseline::config::{LogFormat, LoggingConfig, TargetConfig};
use onchain_baseline::ingest::load_transactions;
use onchain_baseline::pipeline::AnalysisPipeline;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let config = Cli::parse().into_config()?;
    init_tracing(&config.logging);

    tracing::info!(
        targets = config.targets.len(),
        window_hours = config.analysis.window_hours,
        step_hours = config.analysis.step_hours,
        baseline_days = config.analysis.baseline_days,
        std_dev_multiplier = config.analysis.std_dev_multiplier,
        "On-chain baseline analyzer starting"
    );

    let pipeline = AnalysisPipeline::new(config.analysis.clone())?;

    let mut failed = 0usize;
    for target in &config.targets {
        if let Err(e) = run_target(&pipeline, target) {
            tracing::error!(address = %target.address, error = %e, "Target analysis failed");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(eyre::eyre!(
            "{} of {} targets failed",
            failed,
            config.targets.len()
        ));
    }

    tracing::info!("All targets analyzed");
    Ok(())
}

fn run_target(pipeline: &AnalysisPipeline, target: &TargetConfig) -> eyre::Result<()> {
    let transactions = load_transactions(&target.input)?;
    let report = pipeline.run(&target.address, &transactions)?;
    report.write_json(&target.output)?;

    tracing::info!(
        address = %target.address,
        windows = report.analysis_windows.len(),
        flagged_windows = report.flagged_windows(),
        flags = report.flag_count(),
        output = %target.output.display(),
        "Analysis report written"
    );
    Ok(())
}

/// Structured logging; `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
