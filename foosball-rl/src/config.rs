//! Run configuration.
use anyhow::Result;
use foosball_rl_env::{TableEnvConfig, WrapperConfig};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

fn default_algorithm() -> String {
    "random".to_string()
}

fn default_experiments_dir() -> PathBuf {
    PathBuf::from("experiments")
}

/// Settings shared by training and evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommonConfig {
    /// Name of the experiment, the directory of its outputs.
    pub experiment_name: String,

    /// Learning algorithm.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Directory under which experiments are stored.
    #[serde(default = "default_experiments_dir")]
    pub experiments_dir: PathBuf,
}

impl CommonConfig {
    /// Directory of the outputs of training.
    pub fn training_path(&self) -> PathBuf {
        self.experiments_dir.join(&self.experiment_name).join("training")
    }

    /// Directory of the outputs of evaluation.
    pub fn evaluation_path(&self) -> PathBuf {
        self.experiments_dir.join(&self.experiment_name).join("testing")
    }
}

fn default_seeds() -> Vec<u64> {
    vec![0]
}

fn default_n_envs() -> usize {
    1
}

fn default_one() -> usize {
    1
}

fn default_flush_record_interval() -> usize {
    100
}

/// Settings of the training mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// A training run is done for each seed.
    #[serde(default = "default_seeds")]
    pub seeds: Vec<u64>,

    /// Number of environments stepped together.
    #[serde(default = "default_n_envs")]
    pub n_envs: usize,

    /// Number of environment steps of a run, summed over the environments.
    pub total_timesteps: usize,

    /// Discount factor shared by the agent, reward shaping and normalization.
    pub gamma: f64,

    /// Interval of optimization steps in batched environment steps.
    #[serde(default = "default_one")]
    pub opt_interval: usize,

    /// Interval of writing aggregated metrics in batched environment steps.
    #[serde(default = "default_flush_record_interval")]
    pub flush_record_interval: usize,

    /// Normalization statistics to resume from.
    #[serde(default)]
    pub vec_normalize_load_path: Option<PathBuf>,
}

/// Settings of [`EvalCallback`](crate::EvalCallback).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalCallbackConfig {
    /// Number of evaluation environments.
    pub n_eval_envs: usize,

    /// Number of episodes of an evaluation.
    pub n_eval_episodes: usize,

    /// Interval of evaluations in environment steps.
    pub eval_freq: usize,

    /// Seed of the evaluation environments.
    pub eval_seed: u64,
}

impl Default for EvalCallbackConfig {
    fn default() -> Self {
        Self {
            n_eval_envs: 1,
            n_eval_episodes: 10,
            eval_freq: 10_000,
            eval_seed: 42,
        }
    }
}

/// Settings of [`CheckpointCallback`](crate::CheckpointCallback).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointCallbackConfig {
    /// Interval of checkpoints in environment steps.
    pub save_freq: usize,

    /// Prefix of the names of checkpoints.
    pub name_prefix: String,

    /// Also save normalization statistics.
    pub save_vecnormalize: bool,
}

impl Default for CheckpointCallbackConfig {
    fn default() -> Self {
        Self {
            save_freq: 50_000,
            name_prefix: "rl_model".to_string(),
            save_vecnormalize: true,
        }
    }
}

/// Selection of callbacks and their settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbacksConfig {
    /// Write metrics to Tensorboard.
    pub use_tensorboard: bool,

    /// Evaluate periodically.
    pub use_eval_callback: bool,

    /// Settings of the evaluation.
    pub eval_callback: EvalCallbackConfig,

    /// Save checkpoints periodically.
    pub use_checkpoint_callback: bool,

    /// Settings of the checkpoints.
    pub checkpoint_callback: CheckpointCallbackConfig,
}

impl Default for CallbacksConfig {
    fn default() -> Self {
        Self {
            use_tensorboard: true,
            use_eval_callback: true,
            eval_callback: EvalCallbackConfig::default(),
            use_checkpoint_callback: true,
            checkpoint_callback: CheckpointCallbackConfig::default(),
        }
    }
}

/// Settings of the evaluation mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Directory of the parameters of the agent.
    pub model_path: Option<PathBuf>,

    /// Normalization statistics of the evaluation environments.
    pub vec_normalize_load_path: Option<PathBuf>,

    /// Seed of the evaluation environments.
    pub eval_seed: u64,

    /// Number of evaluated episodes.
    pub n_eval_episodes: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            vec_normalize_load_path: None,
            eval_seed: 42,
            n_eval_episodes: 10,
        }
    }
}

/// Configuration of a run, read from a single YAML file.
///
/// ```yaml
/// common:
///   experiment_name: goalkeeper
/// environment:
///   env_id: Goalkeeper-v0
/// training:
///   total_timesteps: 100000
///   gamma: 0.99
/// ```
///
/// Only `common.experiment_name`, `environment.env_id`, `training.total_timesteps`
/// and `training.gamma` are required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Settings shared by training and evaluation.
    pub common: CommonConfig,

    /// The environment.
    pub environment: TableEnvConfig,

    /// Wrappers of the environment.
    #[serde(default)]
    pub wrapper: WrapperConfig,

    /// Training mode.
    pub training: TrainingConfig,

    /// Callbacks during training.
    #[serde(default)]
    pub callbacks: CallbacksConfig,

    /// Evaluation mode.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl RunConfig {
    /// Constructs [`RunConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foosball_rl_env::EnvId;
    use tempdir::TempDir;

    const MINIMAL: &str = r#"
common:
  experiment_name: test
environment:
  env_id: Foosball-v0
training:
  total_timesteps: 1000
  gamma: 0.95
"#;

    #[test]
    fn test_minimal_config() -> Result<()> {
        let config: RunConfig = serde_yaml::from_str(MINIMAL)?;
        assert_eq!(config.common.algorithm, "random");
        assert_eq!(config.environment.env_id, EnvId::Foosball);
        assert_eq!(config.training.seeds, vec![0]);
        assert_eq!(config.training.gamma, 0.95);
        assert!(config.callbacks.use_eval_callback);
        assert_eq!(config.evaluation, EvaluationConfig::default());
        assert_eq!(
            config.common.training_path(),
            PathBuf::from("experiments/test/training")
        );
        Ok(())
    }

    #[test]
    fn test_gamma_is_required() {
        let yaml = MINIMAL.replace("  gamma: 0.95\n", "");
        let err = serde_yaml::from_str::<RunConfig>(&yaml).unwrap_err();
        assert!(err.to_string().contains("gamma"));
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let tmp = TempDir::new("run_config")?;
        let path = tmp.path().join("run_config.yaml");
        let config: RunConfig = serde_yaml::from_str(MINIMAL)?;
        config.save(&path)?;
        assert_eq!(RunConfig::load(&path)?, config);
        Ok(())
    }
}
