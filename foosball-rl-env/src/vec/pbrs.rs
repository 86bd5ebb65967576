//! Potential-based reward shaping.
use super::{DummyVecEnv, VecEnvWrapper};
use crate::constants::WHITE_GOAL_X_POSITION;
use anyhow::Result;
use foosball_rl_core::{error::FrlError, Observation, Space, Step};
use log::info;
use serde::{Deserialize, Serialize};

/// A potential function over the features of an observation.
pub type PotentialFn = Box<dyn Fn(&[f32]) -> f32>;

/// Negative distance from the ball `(x, y)` to the center of the white goal.
pub fn euclidean_distance(obs: &[f32]) -> f32 {
    let dx = obs[0] - WHITE_GOAL_X_POSITION as f32;
    let dy = obs[1];
    -dx.hypot(dy)
}

/// Weighted sum of a progress term along the table and a centering term across it.
///
/// Both terms are clipped to `[0, 1]` and weighted `0.8` and `0.2`.
pub fn weighted_stepwise(obs: &[f32]) -> f32 {
    let x_term = (obs[0] * 0.8217 + 0.5).max(0.0).min(1.0);
    let y_term = (obs[1].abs() * -2.08 + 0.71).max(0.0).min(1.0);
    0.8 * x_term + 0.2 * y_term
}

/// Built-in potential functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Potential {
    /// [`euclidean_distance`].
    EuclideanDistance,

    /// [`weighted_stepwise`].
    WeightedStepwise,
}

impl Default for Potential {
    fn default() -> Self {
        Self::EuclideanDistance
    }
}

impl Potential {
    /// Returns the potential function.
    pub fn function(&self) -> PotentialFn {
        match self {
            Self::EuclideanDistance => Box::new(euclidean_distance),
            Self::WeightedStepwise => Box::new(weighted_stepwise),
        }
    }
}

/// Adds `gamma * Φ(s') - Φ(s)` to the reward of each environment.
///
/// The potential of the previous state is kept per environment and zeroed when
/// all environments are reset. Goal-conditioned observations are evaluated on
/// their `observation` field.
pub struct VecPbrs {
    gamma: f32,
    potential: PotentialFn,
    last_potentials: Vec<f32>,
}

impl VecPbrs {
    /// Builds the stage for `n_envs` environments.
    pub fn new(
        obs_space: &Space,
        n_envs: usize,
        gamma: f32,
        potential: PotentialFn,
    ) -> Result<Self, FrlError> {
        let dim = match obs_space {
            Space::Box { low, .. } => low.len(),
            Space::Dict(_) => obs_space.get("observation").map_or(0, |s| s.flat_dim()),
            _ => 0,
        };
        if dim < 2 {
            return Err(FrlError::UnsupportedSpace {
                wrapper: "VecPbrs".to_string(),
                space: obs_space.to_string(),
            });
        }
        info!("Reward shaping with gamma = {}", gamma);

        Ok(Self {
            gamma,
            potential,
            last_potentials: vec![0.0; n_envs],
        })
    }

    /// Potentials of the last observations.
    pub fn last_potentials(&self) -> &[f32] {
        &self.last_potentials
    }

    fn potential_of(&self, obs: &Observation) -> Result<f32> {
        match obs.features() {
            Some(f) => Ok((self.potential)(&f.to_vec())),
            None => Err(FrlError::UnsupportedSpace {
                wrapper: "VecPbrs".to_string(),
                space: "Image".to_string(),
            }
            .into()),
        }
    }
}

impl VecEnvWrapper for VecPbrs {
    fn name(&self) -> &'static str {
        "VecPbrs"
    }

    fn reset(&mut self, obs: Vec<Observation>, _venv: &mut DummyVecEnv) -> Result<Vec<Observation>> {
        self.last_potentials.iter_mut().for_each(|p| *p = 0.0);
        Ok(obs)
    }

    fn step(&mut self, mut step: Step, _venv: &mut DummyVecEnv) -> Result<Step> {
        for i in 0..step.len() {
            let current = self.potential_of(&step.obs[i])?;
            step.reward[i] += self.gamma * current - self.last_potentials[i];
            self.last_potentials[i] = current;
        }
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_at_goal_is_zero() {
        let obs = [WHITE_GOAL_X_POSITION as f32, 0.0, 0.0175];
        assert_eq!(euclidean_distance(&obs), 0.0);
        assert!(euclidean_distance(&[0.0, 0.0]) < 0.0);
    }

    #[test]
    fn test_weighted_stepwise_is_clipped() {
        assert!((weighted_stepwise(&[10.0, 0.0]) - (0.8 + 0.2 * 0.71)).abs() < 1e-6);
        assert_eq!(weighted_stepwise(&[-10.0, 10.0]), 0.0);
        assert!(weighted_stepwise(&[0.3, 0.0]) > weighted_stepwise(&[0.0, 0.0]));
    }

    #[test]
    fn test_rejects_image_space() {
        let space = Space::Image { shape: [4, 4, 3] };
        let pot = Potential::default().function();
        assert!(VecPbrs::new(&space, 2, 0.99, pot).is_err());
    }

    #[test]
    fn test_potential_names() {
        let p: Potential = serde_yaml::from_str("weighted-stepwise").unwrap();
        assert_eq!(p, Potential::WeightedStepwise);
    }
}
