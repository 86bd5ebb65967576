//! Environment.
use super::{EnvStep, Step};
use crate::{Action, Observation, Space};
use anyhow::Result;
use ndarray::Array3;

/// Represents an environment, typically an MDP.
///
/// Unlike [`VecEnv`], an [`Env`] is not reset automatically at the end of an episode.
pub trait Env {
    /// Observation space of the environment.
    fn observation_space(&self) -> &Space;

    /// Action space of the environment.
    fn action_space(&self) -> &Space;

    /// Resets the environment and returns the initial observation.
    ///
    /// If `seed` is given, the random number generator of the environment is reseeded
    /// before the episode is initialized.
    fn reset(&mut self, seed: Option<u64>) -> Result<Observation>;

    /// Performes an environment step.
    fn step(&mut self, act: &Action) -> Result<EnvStep>;

    /// Renders the current state as an RGB image of shape `[height, width, 3]`.
    ///
    /// Returns `None` if the environment does not support rendering.
    fn render(&mut self) -> Option<Array3<u8>> {
        None
    }
}

impl<E: Env + ?Sized> Env for Box<E> {
    fn observation_space(&self) -> &Space {
        (**self).observation_space()
    }

    fn action_space(&self) -> &Space {
        (**self).action_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<Observation> {
        (**self).reset(seed)
    }

    fn step(&mut self, act: &Action) -> Result<EnvStep> {
        (**self).step(act)
    }

    fn render(&mut self) -> Option<Array3<u8>> {
        (**self).render()
    }
}

/// A batch of independent environments stepped together synchronously.
///
/// Environments in which an episode ended are reset within [`VecEnv::step`];
/// the returned observation of such an environment is the initial observation
/// of the next episode.
pub trait VecEnv {
    /// The number of environments in the batch.
    fn num_envs(&self) -> usize;

    /// Observation space of each environment.
    fn observation_space(&self) -> &Space;

    /// Action space of each environment.
    fn action_space(&self) -> &Space;

    /// Sets the seed used at the next call of [`VecEnv::reset`].
    ///
    /// The `i`-th environment is seeded with `seed + i`.
    fn seed(&mut self, seed: u64);

    /// Resets all environments.
    fn reset(&mut self) -> Result<Vec<Observation>>;

    /// Steps all environments with the given actions, one for each environment.
    fn step(&mut self, acts: &[Action]) -> Result<Step>;

    /// Renders the first environment.
    fn render(&mut self) -> Option<Array3<u8>> {
        None
    }

    /// Releases resources held by the environments.
    fn close(&mut self) {}
}
