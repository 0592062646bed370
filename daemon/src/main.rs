//! accrue simulator: replays scripted pool operations and prints what the
//! ledger did.

mod config;
mod error;
mod script;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use accrue_utils::{init_logging, LogFormat};

use crate::config::SimConfig;
pub use crate::error::SimError;
use crate::script::{Script, Simulation};

#[derive(Parser)]
#[command(name = "accrue-sim", about = "Proportional reward-accrual ledger simulator")]
struct Cli {
    /// Reward units issued per second (defaults to the config file's value).
    #[arg(long, env = "ACCRUE_REWARD_RATE")]
    reward_rate: Option<u64>,

    /// Reward currency the vault starts with.
    #[arg(long, env = "ACCRUE_FUNDING")]
    funding: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ACCRUE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ACCRUE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ACCRUE_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON script of deposits, withdrawals, claims and clock moves.
    Run {
        /// Path to the script.
        #[arg(long)]
        script: PathBuf,

        /// Stop at the first rejected step with a non-zero exit.
        #[arg(long)]
        fail_fast: bool,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_toml_file(&path.to_string_lossy())
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SimConfig::default(),
        };
        if let Some(rate) = self.reward_rate {
            config.reward_rate = rate;
        }
        if let Some(funding) = self.funding {
            config.funding = funding;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_logging(config.log_format, &config.log_level).context("initialising logging")?;

    match &cli.command {
        Command::Run {
            script,
            fail_fast,
            pretty,
        } => {
            let script = Script::from_json_file(&script.to_string_lossy())
                .with_context(|| format!("reading script {}", script.display()))?;
            tracing::info!(
                steps = script.steps.len(),
                reward_rate = config.reward_rate,
                "replaying script"
            );

            let mut sim = Simulation::new(&config, &script.holders)?;
            let report = sim.replay(&script, *fail_fast)?;
            if report.rejected() > 0 {
                tracing::warn!(
                    rejected = report.rejected(),
                    total_weight = sim.pool().total_weight(),
                    "some steps were rejected"
                );
            }

            let out = if *pretty {
                serde_json::to_string_pretty(&report)
            } else {
                serde_json::to_string(&report)
            }
            .context("serializing report")?;
            println!("{out}");
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
