use super::EnvWrapper;
use anyhow::Result;
use foosball_rl_core::{error::FrlError, Action, EnvStep, Observation, Space};
use ndarray::{concatenate, Array1, Axis};

/// Appends the action applied to the environment to the observation.
///
/// The observation space must be a [`Space::Box`]; it is extended by one unbounded
/// element per action element. The initial observation of an episode is extended
/// with zeros.
pub struct AddActionToObservation {
    action_dim: usize,
    observation_space: Space,
    action_space: Space,
}

impl AddActionToObservation {
    /// Builds the wrapper for the given spaces of the wrapped stage.
    pub fn new(obs_space: &Space, act_space: &Space) -> Result<Self, FrlError> {
        let (low, high) = obs_space
            .as_box()
            .ok_or_else(|| FrlError::UnsupportedSpace {
                wrapper: "AddActionToObservation".to_string(),
                space: obs_space.to_string(),
            })?;
        let action_dim = match act_space {
            Space::Box { low, .. } => low.len(),
            Space::Discrete(_) => 1,
            Space::MultiDiscrete(nvec) => nvec.len(),
            _ => {
                return Err(FrlError::UnsupportedSpace {
                    wrapper: "AddActionToObservation".to_string(),
                    space: act_space.to_string(),
                })
            }
        };

        let low = low
            .iter()
            .cloned()
            .chain(std::iter::repeat(f32::NEG_INFINITY).take(action_dim))
            .collect();
        let high = high
            .iter()
            .cloned()
            .chain(std::iter::repeat(f32::INFINITY).take(action_dim))
            .collect();

        Ok(Self {
            action_dim,
            observation_space: Space::bounded(low, high),
            action_space: act_space.clone(),
        })
    }

    fn extend(&self, obs: Observation, act: Array1<f32>) -> Result<Observation> {
        match obs {
            Observation::Array(o) => Ok(Observation::Array(concatenate![Axis(0), o, act])),
            _ => Err(FrlError::UnsupportedSpace {
                wrapper: "AddActionToObservation".to_string(),
                space: "non-array observation".to_string(),
            }
            .into()),
        }
    }
}

impl EnvWrapper for AddActionToObservation {
    fn name(&self) -> &'static str {
        "AddActionToObservation"
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, obs: Observation) -> Result<Observation> {
        self.extend(obs, Array1::zeros(self.action_dim))
    }

    fn step(&mut self, act: &Action, mut step: EnvStep) -> Result<EnvStep> {
        let act = Array1::from(act.to_vec());
        step.obs = self.extend(step.obs, act)?;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foosball_rl_core::record::Record;
    use ndarray::arr1;

    #[test]
    fn test_extends_space_and_observations() -> Result<()> {
        let obs_space = Space::bounded(vec![-1.0, -2.0], vec![1.0, 2.0]);
        let act_space = Space::bounded(vec![-1.0; 2], vec![1.0; 2]);
        let mut w = AddActionToObservation::new(&obs_space, &act_space)?;
        assert_eq!(
            w.observation_space(),
            &Space::bounded(
                vec![-1.0, -2.0, f32::NEG_INFINITY, f32::NEG_INFINITY],
                vec![1.0, 2.0, f32::INFINITY, f32::INFINITY]
            )
        );

        let obs = w.reset(Observation::Array(arr1(&[0.5, 0.5])))?;
        assert_eq!(obs, Observation::Array(arr1(&[0.5, 0.5, 0.0, 0.0])));

        let step = EnvStep {
            obs: Observation::Array(arr1(&[0.1, 0.2])),
            reward: 0.0,
            is_terminated: false,
            is_truncated: false,
            info: Record::empty(),
        };
        let act = Action::Continuous(arr1(&[0.3, -0.4]));
        let step = w.step(&act, step)?;
        assert_eq!(step.obs, Observation::Array(arr1(&[0.1, 0.2, 0.3, -0.4])));
        Ok(())
    }

    #[test]
    fn test_scalar_action() -> Result<()> {
        let w = AddActionToObservation::new(&Space::unbounded(3), &Space::Discrete(6))?;
        assert_eq!(w.observation_space().flat_dim(), 4);
        Ok(())
    }

    #[test]
    fn test_rejects_non_box_observations() {
        let act_space = Space::bounded(vec![-1.0; 2], vec![1.0; 2]);
        let image = Space::Image { shape: [8, 8, 3] };
        assert!(AddActionToObservation::new(&image, &act_space).is_err());
        let dict = Space::Dict(vec![("observation".to_string(), Space::unbounded(2))]);
        assert!(AddActionToObservation::new(&dict, &act_space).is_err());
    }
}
