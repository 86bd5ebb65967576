use super::EnvWrapper;
use anyhow::Result;
use foosball_rl_core::{record::RecordValue, Action, EnvStep, Observation, Space};
use log::debug;

/// Tracks the return and the length of episodes.
///
/// When an episode ends, the info of the step gets `episode_return` and
/// `episode_length`. As the monitor is the outermost stage of an environment,
/// the return is not affected by reward shaping or normalization applied
/// to the vectorized environment.
pub struct Monitor {
    episode_return: f32,
    episode_length: usize,
    observation_space: Space,
    action_space: Space,
}

impl Monitor {
    /// Builds the monitor.
    pub fn new(obs_space: &Space, act_space: &Space) -> Self {
        Self {
            episode_return: 0.0,
            episode_length: 0,
            observation_space: obs_space.clone(),
            action_space: act_space.clone(),
        }
    }
}

impl EnvWrapper for Monitor {
    fn name(&self) -> &'static str {
        "Monitor"
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, obs: Observation) -> Result<Observation> {
        self.episode_return = 0.0;
        self.episode_length = 0;
        Ok(obs)
    }

    fn step(&mut self, _act: &Action, mut step: EnvStep) -> Result<EnvStep> {
        self.episode_return += step.reward;
        self.episode_length += 1;
        if step.is_done() {
            debug!(
                "Episode finished: return = {}, length = {}",
                self.episode_return, self.episode_length
            );
            step.info
                .insert("episode_return", RecordValue::Scalar(self.episode_return));
            step.info.insert(
                "episode_length",
                RecordValue::Scalar(self.episode_length as f32),
            );
        }
        Ok(step)
    }
}
