//! Evaluation mode.
use crate::{agent::build_agent, config::RunConfig};
use anyhow::Result;
use chrono::Local;
use foosball_rl_core::{Agent, DefaultEvaluator, Evaluator, VecEnv};
use foosball_rl_env::create_eval_envs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Result of the evaluation mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Name of the experiment.
    pub experiment_name: String,

    /// Seed of the evaluation environments.
    pub eval_seed: u64,

    /// Directory of the evaluated agent.
    pub model_path: Option<PathBuf>,

    /// Number of evaluated episodes.
    pub n_eval_episodes: usize,

    /// Mean of the episode returns.
    pub mean_reward: f32,

    /// Standard deviation of the episode returns.
    pub std_reward: f32,

    /// Mean of the episode lengths.
    pub mean_ep_length: f32,
}

impl EvaluationResult {
    /// Saves the result as `evaluation_result_<experiment_name>_<millis>.yaml` in `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "evaluation_result_{}_{}.yaml",
            self.experiment_name,
            Local::now().timestamp_millis()
        ));
        let mut file = File::create(&path)?;
        file.write_all(serde_yaml::to_string(self)?.as_bytes())?;
        Ok(path)
    }
}

/// Evaluates the agent of `evaluation.model_path` on frozen evaluation environments.
///
/// Each of the `n_eval_episodes` environments runs one episode. Returns the result
/// and the path of the file it was saved in.
pub fn evaluate_model(config: &RunConfig) -> Result<(EvaluationResult, PathBuf)> {
    let eval = &config.evaluation;
    let eval_path = config.common.evaluation_path();
    info!(
        "Evaluating {} loaded from {:?} on {}",
        config.common.algorithm, eval.model_path, config.environment.env_id
    );

    let env = create_eval_envs(
        &config.environment,
        &config.wrapper,
        eval.n_eval_episodes,
        eval.eval_seed,
        config.training.gamma,
        eval.vec_normalize_load_path.as_deref(),
        Some(eval_path.as_path()),
    )?;
    let mut agent = build_agent(&config.common.algorithm, env.action_space(), eval.eval_seed)?;
    match &eval.model_path {
        Some(path) => agent.load_params(path)?,
        None => warn!("No model path is given, evaluating an untrained agent"),
    }
    agent.eval();

    let mut evaluator = DefaultEvaluator::new(env, eval.n_eval_episodes)?;
    let record = evaluator.evaluate(&mut agent)?;
    evaluator.env_mut().close();

    let result = EvaluationResult {
        experiment_name: config.common.experiment_name.clone(),
        eval_seed: eval.eval_seed,
        model_path: eval.model_path.clone(),
        n_eval_episodes: eval.n_eval_episodes,
        mean_reward: record.get_scalar("eval/mean_reward")?,
        std_reward: record.get_scalar("eval/std_reward")?,
        mean_ep_length: record.get_scalar("eval/mean_ep_length")?,
    };
    info!(
        "Mean reward: {}, mean episode length: {}",
        result.mean_reward, result.mean_ep_length
    );
    let path = result.save(&eval_path)?;
    info!("Saved the evaluation result in {:?}", path);
    Ok((result, path))
}
