//! Policy.
use crate::{Action, Observation};

/// A policy on a vectorized environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy {
    /// Sample actions given observations, one for each environment.
    fn sample(&mut self, obs: &[Observation]) -> Vec<Action>;
}
