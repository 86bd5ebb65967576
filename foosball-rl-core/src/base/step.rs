//! Environment step.
use crate::{record::Record, Action, Observation};

/// Output of [`Env::step`](crate::Env::step).
#[derive(Debug, Clone)]
pub struct EnvStep {
    /// Observation after the step.
    pub obs: Observation,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if the episode is truncated.
    pub is_truncated: bool,

    /// Additional information.
    pub info: Record,
}

impl EnvStep {
    /// Terminated or truncated.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// of all environments in a [`VecEnv`](crate::VecEnv), with some additional information.
///
/// If an episode ended in the `i`-th environment, `obs[i]` is the initial observation
/// of the next episode and `info[i]` holds the last observation of the episode
/// under the key `terminal_observation`.
#[derive(Debug, Clone)]
pub struct Step {
    /// Action.
    pub act: Vec<Action>,

    /// Observation.
    pub obs: Vec<Observation>,

    /// Reward.
    pub reward: Vec<f32>,

    /// Flag denoting if episode is terminated.
    pub is_terminated: Vec<i8>,

    /// Flag denoting if episode is truncated.
    pub is_truncated: Vec<i8>,

    /// Information of each environment.
    pub info: Vec<Record>,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: Vec<Observation>,
        act: Vec<Action>,
        reward: Vec<f32>,
        is_terminated: Vec<i8>,
        is_truncated: Vec<i8>,
        info: Vec<Record>,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    /// The number of environments.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the step has no environment.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    #[inline]
    /// Terminated or truncated in the `ix`-th environment.
    pub fn is_done(&self, ix: usize) -> bool {
        self.is_terminated[ix] == 1 || self.is_truncated[ix] == 1
    }
}
