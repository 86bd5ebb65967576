//! Callbacks of the training loop.
use crate::config::{CheckpointCallbackConfig, EvalCallbackConfig};
use anyhow::Result;
use foosball_rl_core::{
    record::{Record, RecordValue},
    Agent, DefaultEvaluator, Evaluator, TrainerCallback, VecEnv,
};
use foosball_rl_env::VecPipeline;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// File name of normalization statistics saved next to the agent.
pub const VEC_NORMALIZE_FILE: &str = "vec_normalize.bin";

fn save_vec_normalize(env: &VecPipeline, path: &Path) {
    if let Some(normalize) = env.get_normalize() {
        if let Err(e) = normalize.save(path) {
            warn!("Failed to save normalization stats in {:?}: {}", path, e);
        }
    }
}

/// Saves the agent every `save_freq` environment steps.
///
/// Checkpoints are written to `<dir>/<name_prefix>_<steps>_steps`, normalization
/// statistics to `<dir>/<name_prefix>_vecnormalize_<steps>_steps.bin`.
pub struct CheckpointCallback {
    dir: PathBuf,
    config: CheckpointCallbackConfig,
    last_save: usize,
}

impl CheckpointCallback {
    /// Builds the callback saving checkpoints in `dir`.
    pub fn new(dir: impl AsRef<Path>, config: CheckpointCallbackConfig) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            config,
            last_save: 0,
        }
    }

    fn save(&self, env_steps: usize, env: &VecPipeline, agent: &dyn Agent) -> Result<()> {
        let prefix = &self.config.name_prefix;
        let path = self.dir.join(format!("{}_{}_steps", prefix, env_steps));
        agent.save_params(&path)?;
        if self.config.save_vecnormalize {
            let path = self
                .dir
                .join(format!("{}_vecnormalize_{}_steps.bin", prefix, env_steps));
            save_vec_normalize(env, &path);
        }
        Ok(())
    }
}

impl TrainerCallback<VecPipeline> for CheckpointCallback {
    fn on_step(
        &mut self,
        env_steps: usize,
        env: &mut VecPipeline,
        agent: &mut dyn Agent,
    ) -> Result<Record> {
        if self.config.save_freq > 0 && env_steps >= self.last_save + self.config.save_freq {
            self.save(env_steps, env, agent)?;
            self.last_save = env_steps;
        }
        Ok(Record::empty())
    }
}

/// Evaluates the agent every `eval_freq` environment steps.
///
/// The normalization statistics of the training environments are copied to the
/// evaluation environments before each evaluation. When the mean reward improves,
/// the agent and the statistics are saved in the directory of the best model.
pub struct EvalCallback {
    evaluator: DefaultEvaluator<VecPipeline>,
    best_dir: PathBuf,
    eval_freq: usize,
    eval_seed: u64,
    last_eval: usize,
    best_mean_reward: f32,
}

impl EvalCallback {
    /// Builds the callback on the given evaluation environments.
    pub fn new(
        eval_env: VecPipeline,
        best_dir: impl AsRef<Path>,
        config: &EvalCallbackConfig,
    ) -> Result<Self> {
        Ok(Self {
            evaluator: DefaultEvaluator::new(eval_env, config.n_eval_episodes)?,
            best_dir: best_dir.as_ref().to_path_buf(),
            eval_freq: config.eval_freq,
            eval_seed: config.eval_seed,
            last_eval: 0,
            best_mean_reward: f32::NEG_INFINITY,
        })
    }

    /// The best mean reward so far.
    pub fn best_mean_reward(&self) -> f32 {
        self.best_mean_reward
    }

    fn evaluate(&mut self, env: &VecPipeline, agent: &mut dyn Agent) -> Result<Record> {
        let eval_env = self.evaluator.env_mut();
        if let (Some(train), Some(eval)) = (env.get_normalize(), eval_env.get_normalize_mut()) {
            eval.sync_from(&train.stats())?;
        }
        eval_env.seed(self.eval_seed);

        agent.eval();
        let result = self.evaluator.evaluate(agent);
        agent.train();
        let mut record = result?;

        let mean_reward = record.get_scalar("eval/mean_reward")?;
        if mean_reward > self.best_mean_reward {
            info!("New best mean reward: {}", mean_reward);
            self.best_mean_reward = mean_reward;
            agent.save_params(&self.best_dir)?;
            save_vec_normalize(env, &self.best_dir.join(VEC_NORMALIZE_FILE));
        }
        record.insert("eval/best_mean_reward", RecordValue::Scalar(self.best_mean_reward));
        Ok(record)
    }
}

impl TrainerCallback<VecPipeline> for EvalCallback {
    fn on_step(
        &mut self,
        env_steps: usize,
        env: &mut VecPipeline,
        agent: &mut dyn Agent,
    ) -> Result<Record> {
        if self.eval_freq > 0 && env_steps >= self.last_eval + self.eval_freq {
            self.last_eval = env_steps;
            self.evaluate(env, agent)
        } else {
            Ok(Record::empty())
        }
    }

    fn on_training_end(&mut self, _env: &mut VecPipeline, _agent: &mut dyn Agent) -> Result<()> {
        self.evaluator.env_mut().close();
        Ok(())
    }
}
