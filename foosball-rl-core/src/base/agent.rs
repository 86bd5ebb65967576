//! Agent.
use super::{Policy, Step};
use crate::{record::Record, Observation};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// Learning algorithms live outside of this workspace; they are plugged into
/// [`Trainer`](crate::Trainer) through this trait.
pub trait Agent: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Takes the transitions `(prev_obs, step)` collected in an environment step.
    fn observe(&mut self, _prev_obs: &[Observation], _step: &Step) {}

    /// Performs an optimization step.
    fn opt(&mut self) {
        let _ = self.opt_with_record();
    }

    /// Performs an optimization step and returns some information.
    fn opt_with_record(&mut self) -> Record;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
