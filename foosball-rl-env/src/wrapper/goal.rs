use super::EnvWrapper;
use crate::constants::WHITE_GOAL_X_POSITION;
use anyhow::Result;
use foosball_rl_core::{error::FrlError, Action, EnvStep, GoalObs, Observation, Space};
use ndarray::Array1;

/// Negative distance between the ball positions `[0..2]` of two goals.
///
/// Used as the reward term of [`GoalEnvWrapper`] and for relabeling goals in hindsight.
pub fn compute_reward(achieved_goal: &[f32], desired_goal: &[f32]) -> f32 {
    let dx = achieved_goal[0] - desired_goal[0];
    let dy = achieved_goal[1] - desired_goal[1];
    -dx.hypot(dy)
}

/// Turns feature observations into goal-conditioned observations.
///
/// The achieved goal is a copy of the observation. The desired goal has the
/// length of the observation and is zero except the ball position `[0..2]`,
/// which is the target of the black team, by default the center of the white goal.
/// The reward of each step is increased by [`compute_reward`].
pub struct GoalEnvWrapper {
    desired_goal: Array1<f32>,
    observation_space: Space,
    action_space: Space,
}

impl GoalEnvWrapper {
    /// Builds the wrapper aiming at the center of the white goal.
    pub fn new(obs_space: &Space, act_space: &Space) -> Result<Self, FrlError> {
        Self::with_target(obs_space, act_space, [WHITE_GOAL_X_POSITION as f32, 0.0])
    }

    /// Builds the wrapper aiming at the given ball position `(x, y)`.
    pub fn with_target(
        obs_space: &Space,
        act_space: &Space,
        target: [f32; 2],
    ) -> Result<Self, FrlError> {
        let dim = match obs_space.as_box() {
            Some((low, _)) if low.len() >= 2 => low.len(),
            _ => {
                return Err(FrlError::UnsupportedSpace {
                    wrapper: "GoalEnvWrapper".to_string(),
                    space: obs_space.to_string(),
                })
            }
        };
        let mut desired_goal = Array1::zeros(dim);
        desired_goal[0] = target[0];
        desired_goal[1] = target[1];

        Ok(Self {
            desired_goal,
            observation_space: Space::Dict(vec![
                ("observation".to_string(), obs_space.clone()),
                ("achieved_goal".to_string(), obs_space.clone()),
                ("desired_goal".to_string(), obs_space.clone()),
            ]),
            action_space: act_space.clone(),
        })
    }

    /// The fixed desired goal.
    pub fn desired_goal(&self) -> &Array1<f32> {
        &self.desired_goal
    }

    fn goal_obs(&self, obs: Observation) -> Result<GoalObs> {
        match obs {
            Observation::Array(o) => Ok(GoalObs {
                achieved_goal: o.clone(),
                observation: o,
                desired_goal: self.desired_goal.clone(),
            }),
            _ => Err(FrlError::UnsupportedSpace {
                wrapper: "GoalEnvWrapper".to_string(),
                space: "non-array observation".to_string(),
            }
            .into()),
        }
    }
}

impl EnvWrapper for GoalEnvWrapper {
    fn name(&self) -> &'static str {
        "GoalEnvWrapper"
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, obs: Observation) -> Result<Observation> {
        Ok(Observation::Goal(self.goal_obs(obs)?))
    }

    fn step(&mut self, _act: &Action, mut step: EnvStep) -> Result<EnvStep> {
        let obs = self.goal_obs(step.obs)?;
        let achieved = [obs.achieved_goal[0], obs.achieved_goal[1]];
        let desired = [obs.desired_goal[0], obs.desired_goal[1]];
        step.reward += compute_reward(&achieved, &desired);
        step.obs = Observation::Goal(obs);
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foosball_rl_core::record::Record;
    use ndarray::arr1;

    #[test]
    fn test_goal_observation_and_reward() -> Result<()> {
        let obs_space = Space::unbounded(4);
        let act_space = Space::bounded(vec![-1.0; 2], vec![1.0; 2]);
        let mut w = GoalEnvWrapper::with_target(&obs_space, &act_space, [0.6, 0.0])?;
        assert_eq!(w.observation_space().flat_dim(), 12);
        assert_eq!(w.desired_goal(), &arr1(&[0.6, 0.0, 0.0, 0.0]));

        let obs = w.reset(Observation::Array(arr1(&[0.0, 0.0, 0.1, 0.2])))?;
        assert!(w.observation_space().matches_obs(&obs));

        let step = EnvStep {
            obs: Observation::Array(arr1(&[0.6, 0.8, 0.5, 0.5])),
            reward: 1.0,
            is_terminated: false,
            is_truncated: false,
            info: Record::empty(),
        };
        let step = w.step(&Action::Discrete(0), step)?;
        assert!((step.reward - 0.2).abs() < 1e-6);
        match step.obs {
            Observation::Goal(g) => {
                assert_eq!(g.observation, g.achieved_goal);
                assert_eq!(g.desired_goal, arr1(&[0.6, 0.0, 0.0, 0.0]));
            }
            _ => panic!("expected a goal observation"),
        }
        Ok(())
    }

    #[test]
    fn test_compute_reward() {
        assert_eq!(compute_reward(&[0.3, 0.4, 9.0], &[0.0, 0.0, -9.0]), -0.5);
        assert_eq!(compute_reward(&[0.6, 0.0], &[0.6, 0.0]), 0.0);
    }

    #[test]
    fn test_rejects_non_box_observations() {
        let act_space = Space::Discrete(3);
        let image = Space::Image { shape: [8, 8, 3] };
        assert!(GoalEnvWrapper::new(&image, &act_space).is_err());
    }
}
