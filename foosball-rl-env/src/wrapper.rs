//! Wrappers of a single environment.
//!
//! A [`WrappedEnv`] holds an environment and an ordered list of [`EnvWrapper`]s,
//! innermost first. An action passes the wrappers from the outermost to the
//! innermost before it is applied to the environment, and the result of a step
//! passes them in the opposite direction.
mod act_space;
mod goal;
mod monitor;
mod obs_action;
use anyhow::Result;
use foosball_rl_core::{Action, Env, EnvStep, Observation, Space};
use log::info;
use ndarray::Array3;

pub use act_space::{
    action_space_wrapper, ActionSpaceConfig, ActionSpaceMode, DiscreteActionWrapper,
    MultiDiscreteActionWrapper,
};
pub use goal::{compute_reward, GoalEnvWrapper};
pub use monitor::Monitor;
pub use obs_action::AddActionToObservation;

/// A stage transforming the interface of an environment.
///
/// A wrapper is constructed with the spaces of the stage it wraps and
/// exposes the spaces seen from outside.
pub trait EnvWrapper {
    /// Name of the stage.
    fn name(&self) -> &'static str;

    /// Observation space seen from outside.
    fn observation_space(&self) -> &Space;

    /// Action space seen from outside.
    fn action_space(&self) -> &Space;

    /// Transforms the initial observation of an episode.
    fn reset(&mut self, obs: Observation) -> Result<Observation> {
        Ok(obs)
    }

    /// Maps an action given from outside to the action of the wrapped stage.
    fn action(&mut self, act: &Action) -> Result<Action> {
        Ok(act.clone())
    }

    /// Transforms the result of a step.
    ///
    /// `act` is the action that was passed to the wrapped stage.
    fn step(&mut self, act: &Action, step: EnvStep) -> Result<EnvStep> {
        let _ = act;
        Ok(step)
    }
}

/// An environment with an ordered list of wrappers.
pub struct WrappedEnv {
    env: Box<dyn Env>,
    wrappers: Vec<Box<dyn EnvWrapper>>,
}

impl WrappedEnv {
    /// Wraps nothing yet.
    pub fn new(env: Box<dyn Env>) -> Self {
        Self {
            env,
            wrappers: vec![],
        }
    }

    /// Adds a wrapper as the outermost stage.
    ///
    /// The wrapper should be built from the current [`Env::observation_space`] and
    /// [`Env::action_space`] of `self`.
    pub fn wrap(mut self, wrapper: impl EnvWrapper + 'static) -> Self {
        info!(
            "Wrapped with {}: observation space {}, action space {}",
            wrapper.name(),
            wrapper.observation_space(),
            wrapper.action_space()
        );
        self.wrappers.push(Box::new(wrapper));
        self
    }

    /// Names of the wrappers, innermost first.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.wrappers.iter().map(|w| w.name()).collect()
    }
}

impl Env for WrappedEnv {
    fn observation_space(&self) -> &Space {
        match self.wrappers.last() {
            Some(w) => w.observation_space(),
            None => self.env.observation_space(),
        }
    }

    fn action_space(&self) -> &Space {
        match self.wrappers.last() {
            Some(w) => w.action_space(),
            None => self.env.action_space(),
        }
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<Observation> {
        let mut obs = self.env.reset(seed)?;
        for w in self.wrappers.iter_mut() {
            obs = w.reset(obs)?;
        }
        Ok(obs)
    }

    fn step(&mut self, act: &Action) -> Result<EnvStep> {
        // acts[i] is the action passed to the stage wrapped by wrappers[i]
        let mut acts = Vec::with_capacity(self.wrappers.len());
        let mut a = act.clone();
        for w in self.wrappers.iter_mut().rev() {
            a = w.action(&a)?;
            acts.push(a.clone());
        }
        acts.reverse();

        let mut step = self.env.step(&a)?;
        for (w, a) in self.wrappers.iter_mut().zip(acts.iter()) {
            step = w.step(a, step)?;
        }
        Ok(step)
    }

    fn render(&mut self) -> Option<Array3<u8>> {
        self.env.render()
    }
}
