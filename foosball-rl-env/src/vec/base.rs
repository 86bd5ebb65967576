use crate::wrapper::WrappedEnv;
use anyhow::Result;
use foosball_rl_core::{
    error::FrlError,
    record::{Record, RecordValue},
    Action, Env, Observation, Space, Step, VecEnv,
};
use log::trace;
use ndarray::Array3;

/// Environments stepped one after another in the current thread.
///
/// All environments must have the same spaces. An environment in which an episode
/// ended is reset immediately; the last observation of the episode is kept in
/// the info of the step under `terminal_observation`, flattened.
pub struct DummyVecEnv {
    envs: Vec<WrappedEnv>,
    seed: Option<u64>,
}

impl DummyVecEnv {
    /// Creates a batch of the given environments.
    pub fn new(envs: Vec<WrappedEnv>) -> Result<Self> {
        let first = envs
            .first()
            .ok_or_else(|| FrlError::InvalidConfig("no environment to vectorize".to_string()))?;
        let consistent = envs.iter().all(|env| {
            env.observation_space() == first.observation_space()
                && env.action_space() == first.action_space()
        });
        if !consistent {
            return Err(FrlError::InvalidConfig(
                "vectorized environments must have the same spaces".to_string(),
            )
            .into());
        }
        Ok(Self { envs, seed: None })
    }

    /// Names of the wrappers of each environment, innermost first.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.envs[0].stage_names()
    }
}

impl VecEnv for DummyVecEnv {
    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn observation_space(&self) -> &Space {
        self.envs[0].observation_space()
    }

    fn action_space(&self) -> &Space {
        self.envs[0].action_space()
    }

    fn seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    fn reset(&mut self) -> Result<Vec<Observation>> {
        let seed = self.seed.take();
        self.envs
            .iter_mut()
            .enumerate()
            .map(|(i, env)| env.reset(seed.map(|s| s + i as u64)))
            .collect()
    }

    fn step(&mut self, acts: &[Action]) -> Result<Step> {
        let n = self.envs.len();
        if acts.len() != n {
            return Err(FrlError::InvalidConfig(format!(
                "expected {} actions, got {}",
                n,
                acts.len()
            ))
            .into());
        }

        let mut obs = Vec::with_capacity(n);
        let mut reward = Vec::with_capacity(n);
        let mut is_terminated = Vec::with_capacity(n);
        let mut is_truncated = Vec::with_capacity(n);
        let mut info: Vec<Record> = Vec::with_capacity(n);

        for (i, (env, act)) in self.envs.iter_mut().zip(acts.iter()).enumerate() {
            let mut step = env.step(act)?;
            let o = if step.is_done() {
                trace!("Environment {} is done, resetting", i);
                step.info.insert(
                    "terminal_observation",
                    RecordValue::Array1(step.obs.to_vec()),
                );
                env.reset(None)?
            } else {
                step.obs
            };
            obs.push(o);
            reward.push(step.reward);
            is_terminated.push(step.is_terminated as i8);
            is_truncated.push(step.is_truncated as i8);
            info.push(step.info);
        }

        Ok(Step::new(
            obs,
            acts.to_vec(),
            reward,
            is_terminated,
            is_truncated,
            info,
        ))
    }

    fn render(&mut self) -> Option<Array3<u8>> {
        self.envs[0].render()
    }
}
