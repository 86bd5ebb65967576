//! Composition of environment pipelines.
use crate::{
    config::TableEnvConfig,
    vec::{
        DummyVecEnv, Potential, VecCheckNan, VecNormalize, VecNormalizeConfig, VecPbrs,
        VecPipeline, VecVideoRecorder, VideoConfig,
    },
    wrapper::{
        action_space_wrapper, ActionSpaceConfig, AddActionToObservation, GoalEnvWrapper, Monitor,
        WrappedEnv,
    },
    TableEnv,
};
use anyhow::Result;
use foosball_rl_core::{Env, VecEnv};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Wrappers applied to each environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvWrapperConfig {
    /// Apply [`AddActionToObservation`].
    pub use_add_actions_to_observation_wrapper: bool,

    /// Apply [`GoalEnvWrapper`].
    pub use_goal_env_wrapper: bool,

    /// Apply the action space adapter.
    pub use_action_space_wrapper: bool,

    /// Configuration of the action space adapter.
    pub action_space_wrapper: ActionSpaceConfig,
}

impl Default for EnvWrapperConfig {
    fn default() -> Self {
        Self {
            use_add_actions_to_observation_wrapper: true,
            use_goal_env_wrapper: false,
            use_action_space_wrapper: false,
            action_space_wrapper: ActionSpaceConfig::default(),
        }
    }
}

/// Wrappers applied to the vectorized environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VecEnvWrapperConfig {
    /// Apply [`VecPbrs`].
    pub use_vec_pbrs_wrapper: bool,

    /// Potential function of [`VecPbrs`].
    pub potential: Potential,

    /// Apply [`VecNormalize`].
    pub use_vec_normalize_wrapper: bool,

    /// Configuration of [`VecNormalize`].
    pub vec_normalize_wrapper: VecNormalizeConfig,

    /// Apply [`VecVideoRecorder`].
    pub use_video_recording_wrapper: bool,

    /// Configuration of [`VecVideoRecorder`].
    pub vec_video_recorder_wrapper: VideoConfig,
}

impl Default for VecEnvWrapperConfig {
    fn default() -> Self {
        Self {
            use_vec_pbrs_wrapper: true,
            potential: Potential::default(),
            use_vec_normalize_wrapper: true,
            vec_normalize_wrapper: VecNormalizeConfig::default(),
            use_video_recording_wrapper: false,
            vec_video_recorder_wrapper: VideoConfig::default(),
        }
    }
}

/// Configuration of all wrappers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    /// Wrappers of each environment.
    pub env_wrapper: EnvWrapperConfig,

    /// Wrappers of the vectorized environment.
    pub vec_env_wrapper: VecEnvWrapperConfig,
}

/// Applies the wrappers of each environment in the fixed order
/// augment, goal, action adapter, monitor.
pub fn apply_env_wrappers(env: Box<dyn Env>, config: &EnvWrapperConfig) -> Result<WrappedEnv> {
    let mut env = WrappedEnv::new(env);
    if config.use_add_actions_to_observation_wrapper {
        let w = AddActionToObservation::new(env.observation_space(), env.action_space())?;
        env = env.wrap(w);
    }
    if config.use_goal_env_wrapper {
        let w = GoalEnvWrapper::new(env.observation_space(), env.action_space())?;
        env = env.wrap(w);
    }
    if config.use_action_space_wrapper {
        env = action_space_wrapper(env, &config.action_space_wrapper)?;
    }
    let w = Monitor::new(env.observation_space(), env.action_space());
    Ok(env.wrap(w))
}

/// Vectorized environment of `n_envs` environments built by `make_env`.
///
/// `make_env` is given the index of the environment. The environments are seeded
/// with `seed + i` at the first reset. If `vec_normalize_path` is given, the
/// normalization statistics are loaded from it. Videos are written under
/// `<video_path>/seed-<seed>/<video_log_path_suffix>`.
pub fn create_envs_with<F>(
    make_env: F,
    wrapper: &WrapperConfig,
    n_envs: usize,
    seed: u64,
    gamma: f64,
    vec_normalize_path: Option<&Path>,
    video_path: Option<&Path>,
) -> Result<VecPipeline>
where
    F: Fn(usize) -> Result<Box<dyn Env>>,
{
    let envs = (0..n_envs)
        .map(|i| apply_env_wrappers(make_env(i)?, &wrapper.env_wrapper))
        .collect::<Result<Vec<_>>>()?;
    let venv = DummyVecEnv::new(envs)?;
    let obs_space = venv.observation_space().clone();
    let mut pipeline = VecPipeline::new(venv);
    let config = &wrapper.vec_env_wrapper;

    if config.use_vec_pbrs_wrapper {
        let pbrs = VecPbrs::new(&obs_space, n_envs, gamma as f32, config.potential.function())?;
        pipeline = pipeline.pbrs(pbrs);
    }

    if config.use_vec_normalize_wrapper {
        let normalize = match vec_normalize_path {
            Some(path) => {
                info!("Loading normalized environment from {:?}", path);
                VecNormalize::load(&obs_space, n_envs, config.vec_normalize_wrapper.clone(), path)?
            }
            None => {
                info!("Creating new normalization statistics");
                VecNormalize::new(&obs_space, n_envs, gamma, config.vec_normalize_wrapper.clone())?
            }
        };
        pipeline = pipeline.normalize(normalize);
    }

    pipeline = pipeline.check_nan(VecCheckNan::new());

    if config.use_video_recording_wrapper {
        match video_path {
            Some(path) => {
                let video = &config.vec_video_recorder_wrapper;
                let folder: PathBuf = path
                    .join(format!("seed-{}", seed))
                    .join(&video.video_log_path_suffix);
                info!(
                    "Recording video of length {} every {} steps, saving to {:?}",
                    video.video_length, video.video_interval, folder
                );
                pipeline = pipeline.video(VecVideoRecorder::new(folder, video.clone()));
            }
            None => warn!("Video recording is enabled but no video path is given"),
        }
    }

    pipeline.seed(seed);
    info!("Environment wrappers: {:?}", pipeline.env_stage_names());
    info!("Vectorized environment wrappers: {:?}", pipeline.vec_stage_names());
    Ok(pipeline)
}

/// Vectorized table environments for training.
pub fn create_envs(
    env_config: &TableEnvConfig,
    wrapper: &WrapperConfig,
    n_envs: usize,
    seed: u64,
    gamma: f64,
    vec_normalize_path: Option<&Path>,
    video_path: Option<&Path>,
) -> Result<VecPipeline> {
    let make_env = |_: usize| -> Result<Box<dyn Env>> { Ok(Box::new(TableEnv::build(env_config)?)) };
    create_envs_with(
        make_env,
        wrapper,
        n_envs,
        seed,
        gamma,
        vec_normalize_path,
        video_path,
    )
}

/// Vectorized table environments for evaluation.
///
/// Normalization statistics are neither updated nor applied to rewards.
pub fn create_eval_envs(
    env_config: &TableEnvConfig,
    wrapper: &WrapperConfig,
    n_envs: usize,
    seed: u64,
    gamma: f64,
    vec_normalize_path: Option<&Path>,
    video_path: Option<&Path>,
) -> Result<VecPipeline> {
    let mut wrapper = wrapper.clone();
    wrapper.vec_env_wrapper.vec_normalize_wrapper = wrapper
        .vec_env_wrapper
        .vec_normalize_wrapper
        .training(false)
        .norm_reward(false);
    let mut pipeline = create_envs(
        env_config,
        &wrapper,
        n_envs,
        seed,
        gamma,
        vec_normalize_path,
        video_path,
    )?;
    if let Some(normalize) = pipeline.get_normalize_mut() {
        normalize.freeze();
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_config_from_yaml() {
        let yaml = r#"
env_wrapper:
  use_goal_env_wrapper: true
  use_action_space_wrapper: true
  action_space_wrapper:
    action_space: multi-discrete
    lateral_bins: 5
vec_env_wrapper:
  potential: weighted-stepwise
  use_vec_normalize_wrapper: false
"#;
        let config: WrapperConfig = serde_yaml::from_str(yaml).unwrap();
        let env = &config.env_wrapper;
        assert!(env.use_add_actions_to_observation_wrapper);
        assert!(env.use_goal_env_wrapper);
        assert_eq!(env.action_space_wrapper.lateral_bins, 5);
        assert_eq!(env.action_space_wrapper.angular_bins, 3);
        assert_eq!(config.vec_env_wrapper.potential, Potential::WeightedStepwise);
        assert!(config.vec_env_wrapper.use_vec_pbrs_wrapper);
        assert!(!config.vec_env_wrapper.use_vec_normalize_wrapper);
    }
}
