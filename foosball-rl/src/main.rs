use anyhow::Result;
use clap::{Parser, Subcommand};
use foosball_rl::{evaluate_model, train_loop, RunConfig};
use foosball_rl_env::EnvId;
use log::info;
use std::path::PathBuf;

/// Train and evaluate agents on foosball tables
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Train an agent for each seed of the configuration
    Train(ModeArgs),

    /// Evaluate a saved agent
    Evaluate(ModeArgs),
}

#[derive(clap::Args, Debug)]
struct ModeArgs {
    /// Run configuration in YAML
    #[arg(short, long)]
    config: PathBuf,

    /// Overrides the environment of the configuration
    #[arg(long)]
    env_id: Option<EnvId>,

    /// Overrides the algorithm of the configuration
    #[arg(long)]
    algo: Option<String>,
}

impl ModeArgs {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::load(&self.config)?;
        if let Some(env_id) = self.env_id {
            config.environment.env_id = env_id;
        }
        if let Some(algo) = &self.algo {
            config.common.algorithm = algo.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match &args.mode {
        Mode::Train(mode_args) => {
            let config = mode_args.run_config()?;
            info!("Training {}", config.common.experiment_name);
            train_loop(&config)?;
        }
        Mode::Evaluate(mode_args) => {
            let config = mode_args.run_config()?;
            info!("Evaluating {}", config.common.experiment_name);
            evaluate_model(&config)?;
        }
    }

    Ok(())
}
