use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, LogFormat, TargetConfig};
use crate::features::TailPolicy;

/// Flag statistically anomalous activity of an address against its own history.
#[derive(Debug, Parser)]
#[command(name = "onchain-baseline", version, about)]
pub struct Cli {
    /// TOML config file with analysis settings and [[targets]]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Transaction file (JSON or CSV) for a single target
    #[arg(short, long, requires_all = ["output", "address"])]
    pub input: Option<PathBuf>,

    /// Where to write the JSON report for the single target
    #[arg(short, long, requires = "input")]
    pub output: Option<PathBuf>,

    /// Address the transactions were fetched for (case-insensitive)
    #[arg(short, long, requires = "input")]
    pub address: Option<String>,

    /// Duration of each window in hours
    #[arg(long)]
    pub window_hours: Option<u32>,

    /// Hours between consecutive window starts
    #[arg(long)]
    pub step_hours: Option<u32>,

    /// Initial days of history used to build the baseline
    #[arg(long)]
    pub baseline_days: Option<u32>,

    /// Standard deviations from the mean that count as anomalous
    #[arg(long)]
    pub std_dev_multiplier: Option<f64>,

    /// Final window handling: "snap" or "uniform"
    #[arg(long)]
    pub tail_policy: Option<TailPolicy>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Merge the optional config file with command-line overrides and check the
    /// result.
    pub fn into_config(self) -> eyre::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let analysis = &mut config.analysis;
        if let Some(hours) = self.window_hours {
            analysis.window_hours = hours;
        }
        if let Some(hours) = self.step_hours {
            analysis.step_hours = hours;
        }
        if let Some(days) = self.baseline_days {
            analysis.baseline_days = days;
        }
        if let Some(k) = self.std_dev_multiplier {
            analysis.std_dev_multiplier = k;
        }
        if let Some(tail) = self.tail_policy {
            analysis.tail_policy = tail;
        }
        if self.log_json {
            config.logging.format = LogFormat::Json;
        }

        if let (Some(input), Some(output), Some(address)) = (self.input, self.output, self.address) {
            config.targets.push(TargetConfig {
                address,
                input,
                output,
            });
        }

        if config.targets.is_empty() {
            return Err(eyre::eyre!(
                "No targets configured: pass --input, --output and --address, or add [[targets]] to the config file"
            ));
        }

        config.validate()?;
        Ok(config)
    }
}
