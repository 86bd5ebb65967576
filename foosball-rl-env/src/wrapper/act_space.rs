//! Discretization of the 2D continuous control of a rod.
use super::{EnvWrapper, WrappedEnv};
use anyhow::Result;
use foosball_rl_core::{error::FrlError, Action, Env, Observation, Space};
use ndarray::arr1;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Action space exposed to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionSpaceMode {
    /// The continuous control of the environment, unchanged.
    Continuous,

    /// One index either moving the rod laterally or rotating it, see [`DiscreteActionWrapper`].
    Discrete,

    /// One index per axis, see [`MultiDiscreteActionWrapper`].
    MultiDiscrete,
}

impl ActionSpaceMode {
    const ALL: [ActionSpaceMode; 3] = [Self::Continuous, Self::Discrete, Self::MultiDiscrete];

    /// Identifier used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
            Self::MultiDiscrete => "multi-discrete",
        }
    }
}

impl fmt::Display for ActionSpaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionSpaceMode {
    type Err = FrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| {
                FrlError::InvalidConfig(format!(
                    "unknown action space {}, only 'continuous', 'discrete' and 'multi-discrete' are supported",
                    s
                ))
            })
    }
}

fn default_bins() -> usize {
    3
}

/// Configuration of the action space adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpaceConfig {
    /// Action space exposed to the agent.
    pub action_space: ActionSpaceMode,

    /// Number of lateral positions.
    #[serde(default = "default_bins")]
    pub lateral_bins: usize,

    /// Number of angles.
    #[serde(default = "default_bins")]
    pub angular_bins: usize,
}

impl Default for ActionSpaceConfig {
    fn default() -> Self {
        Self {
            action_space: ActionSpaceMode::Continuous,
            lateral_bins: default_bins(),
            angular_bins: default_bins(),
        }
    }
}

/// Wraps `env` with the adapter selected by `config`.
///
/// The continuous mode adds no stage.
pub fn action_space_wrapper(env: WrappedEnv, config: &ActionSpaceConfig) -> Result<WrappedEnv> {
    let (obs_space, act_space) = (env.observation_space(), env.action_space());
    Ok(match config.action_space {
        ActionSpaceMode::Continuous => env,
        ActionSpaceMode::Discrete => {
            let w = DiscreteActionWrapper::new(
                obs_space,
                act_space,
                config.lateral_bins,
                config.angular_bins,
            )?;
            env.wrap(w)
        }
        ActionSpaceMode::MultiDiscrete => {
            let w = MultiDiscreteActionWrapper::new(
                obs_space,
                act_space,
                config.lateral_bins,
                config.angular_bins,
            )?;
            env.wrap(w)
        }
    })
}

/// Evenly spaced values of one axis of the control.
#[derive(Clone, Debug)]
struct Axis {
    low: f32,
    increment: f32,
    bins: usize,
}

impl Axis {
    fn value(&self, ix: usize) -> f32 {
        self.low + ix as f32 * self.increment
    }
}

fn axes(
    wrapper: &str,
    act_space: &Space,
    lateral_bins: usize,
    angular_bins: usize,
) -> Result<(Axis, Axis), FrlError> {
    let (low, high) = match act_space.as_box() {
        Some((low, high)) if low.len() == 2 => (low, high),
        _ => {
            return Err(FrlError::UnsupportedSpace {
                wrapper: wrapper.to_string(),
                space: act_space.to_string(),
            })
        }
    };
    if lateral_bins < 2 || angular_bins < 2 {
        return Err(FrlError::InvalidConfig(format!(
            "{} requires at least 2 bins per axis, got lateral_bins = {}, angular_bins = {}",
            wrapper, lateral_bins, angular_bins
        )));
    }
    let axis = |i: usize, bins: usize| Axis {
        low: low[i],
        increment: (high[i] - low[i]) / (bins - 1) as f32,
        bins,
    };
    Ok((axis(0, lateral_bins), axis(1, angular_bins)))
}

fn invalid_action(act: &Action, space: &Space) -> FrlError {
    FrlError::InvalidAction {
        act: act.to_string(),
        space: space.to_string(),
    }
}

/// Exposes `lateral_bins + angular_bins` discrete actions.
///
/// Index `i < lateral_bins` moves the rod to the `i`-th lateral position and keeps
/// the last angle. Any other index rotates the rod to the `(i - lateral_bins)`-th
/// angle and keeps the last lateral position. The last action is `[0, 0]` at the
/// start of an episode.
pub struct DiscreteActionWrapper {
    lateral: Axis,
    angular: Axis,
    last_action: [f32; 2],
    observation_space: Space,
    action_space: Space,
}

impl DiscreteActionWrapper {
    /// Builds the adapter of a 2D continuous action space.
    pub fn new(
        obs_space: &Space,
        act_space: &Space,
        lateral_bins: usize,
        angular_bins: usize,
    ) -> Result<Self, FrlError> {
        let (lateral, angular) = axes(
            "DiscreteActionWrapper",
            act_space,
            lateral_bins,
            angular_bins,
        )?;
        Ok(Self {
            lateral,
            angular,
            last_action: [0.0, 0.0],
            observation_space: obs_space.clone(),
            action_space: Space::Discrete(lateral_bins + angular_bins),
        })
    }

    /// The continuous action applied last.
    pub fn last_action(&self) -> [f32; 2] {
        self.last_action
    }
}

impl EnvWrapper for DiscreteActionWrapper {
    fn name(&self) -> &'static str {
        "DiscreteActionWrapper"
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, obs: Observation) -> Result<Observation> {
        self.last_action = [0.0, 0.0];
        Ok(obs)
    }

    fn action(&mut self, act: &Action) -> Result<Action> {
        let ix = match act {
            Action::Discrete(ix) if *ix < self.lateral.bins + self.angular.bins => *ix,
            _ => return Err(invalid_action(act, &self.action_space).into()),
        };
        let current = if ix < self.lateral.bins {
            [self.lateral.value(ix), self.last_action[1]]
        } else {
            [
                self.last_action[0],
                self.angular.value(ix - self.lateral.bins),
            ]
        };
        self.last_action = current;
        Ok(Action::Continuous(arr1(&current)))
    }
}

/// Exposes a pair of indices `[l, a]` selecting the lateral position and the
/// angle independently.
pub struct MultiDiscreteActionWrapper {
    lateral: Axis,
    angular: Axis,
    observation_space: Space,
    action_space: Space,
}

impl MultiDiscreteActionWrapper {
    /// Builds the adapter of a 2D continuous action space.
    pub fn new(
        obs_space: &Space,
        act_space: &Space,
        lateral_bins: usize,
        angular_bins: usize,
    ) -> Result<Self, FrlError> {
        let (lateral, angular) = axes(
            "MultiDiscreteActionWrapper",
            act_space,
            lateral_bins,
            angular_bins,
        )?;
        Ok(Self {
            lateral,
            angular,
            observation_space: obs_space.clone(),
            action_space: Space::MultiDiscrete(vec![lateral_bins, angular_bins]),
        })
    }
}

impl EnvWrapper for MultiDiscreteActionWrapper {
    fn name(&self) -> &'static str {
        "MultiDiscreteActionWrapper"
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn action(&mut self, act: &Action) -> Result<Action> {
        if !self.action_space.contains_act(act) {
            return Err(invalid_action(act, &self.action_space).into());
        }
        match act {
            Action::MultiDiscrete(ix) => Ok(Action::Continuous(arr1(&[
                self.lateral.value(ix[0]),
                self.angular.value(ix[1]),
            ]))),
            _ => Err(invalid_action(act, &self.action_space).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaces() -> (Space, Space) {
        (
            Space::unbounded(4),
            Space::bounded(vec![-1.0, -1.0], vec![1.0, 1.0]),
        )
    }

    fn continuous(act: Action) -> Vec<f32> {
        match act {
            Action::Continuous(a) => a.to_vec(),
            _ => panic!("expected a continuous action"),
        }
    }

    #[test]
    fn test_discrete_holds_other_axis() -> Result<()> {
        let (obs_space, act_space) = spaces();
        let mut w = DiscreteActionWrapper::new(&obs_space, &act_space, 3, 3)?;
        assert_eq!(w.action_space(), &Space::Discrete(6));

        // Lateral index, angle kept at the initial 0
        assert_eq!(continuous(w.action(&Action::Discrete(2))?), vec![1.0, 0.0]);
        // Angular index, lateral position kept
        assert_eq!(continuous(w.action(&Action::Discrete(3))?), vec![1.0, -1.0]);
        assert_eq!(continuous(w.action(&Action::Discrete(0))?), vec![-1.0, -1.0]);
        assert_eq!(continuous(w.action(&Action::Discrete(4))?), vec![-1.0, 0.0]);
        assert_eq!(w.last_action(), [-1.0, 0.0]);

        w.reset(Observation::Array(ndarray::Array1::zeros(4)))?;
        assert_eq!(w.last_action(), [0.0, 0.0]);
        assert_eq!(continuous(w.action(&Action::Discrete(5))?), vec![0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_discrete_asymmetric_range() -> Result<()> {
        let obs_space = Space::unbounded(1);
        let act_space = Space::bounded(vec![-0.5, -2.0], vec![1.5, 2.0]);
        let mut w = DiscreteActionWrapper::new(&obs_space, &act_space, 5, 2)?;
        assert_eq!(continuous(w.action(&Action::Discrete(1))?), vec![0.0, 0.0]);
        assert_eq!(continuous(w.action(&Action::Discrete(6))?), vec![0.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_discrete_range_without_zero() -> Result<()> {
        let obs_space = Space::unbounded(1);
        let act_space = Space::bounded(vec![0.5, -3.0], vec![1.5, -1.0]);
        let mut w = MultiDiscreteActionWrapper::new(&obs_space, &act_space, 3, 5)?;
        let act = continuous(w.action(&Action::MultiDiscrete(vec![2, 4]))?);
        assert_eq!(act, vec![1.5, -1.0]);
        let act = continuous(w.action(&Action::MultiDiscrete(vec![1, 1]))?);
        assert_eq!(act, vec![1.0, -2.5]);
        Ok(())
    }

    #[test]
    fn test_multi_discrete() -> Result<()> {
        let (obs_space, act_space) = spaces();
        let mut w = MultiDiscreteActionWrapper::new(&obs_space, &act_space, 3, 3)?;
        assert_eq!(w.action_space(), &Space::MultiDiscrete(vec![3, 3]));
        assert_eq!(
            continuous(w.action(&Action::MultiDiscrete(vec![0, 0]))?),
            vec![-1.0, -1.0]
        );
        assert_eq!(
            continuous(w.action(&Action::MultiDiscrete(vec![1, 2]))?),
            vec![0.0, 1.0]
        );
        Ok(())
    }

    #[test]
    fn test_out_of_range_index() -> Result<()> {
        let (obs_space, act_space) = spaces();
        let mut w = DiscreteActionWrapper::new(&obs_space, &act_space, 3, 3)?;
        assert!(w.action(&Action::Discrete(6)).is_err());
        assert!(w.action(&Action::MultiDiscrete(vec![0, 0])).is_err());

        let mut w = MultiDiscreteActionWrapper::new(&obs_space, &act_space, 3, 3)?;
        assert!(w.action(&Action::MultiDiscrete(vec![3, 0])).is_err());
        assert!(w.action(&Action::MultiDiscrete(vec![0])).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_construction() {
        let (obs_space, act_space) = spaces();
        for bins in [(1, 3), (3, 1), (0, 0)].iter() {
            let err = DiscreteActionWrapper::new(&obs_space, &act_space, bins.0, bins.1);
            assert!(matches!(err, Err(FrlError::InvalidConfig(_))));
            let err = MultiDiscreteActionWrapper::new(&obs_space, &act_space, bins.0, bins.1);
            assert!(matches!(err, Err(FrlError::InvalidConfig(_))));
        }

        let act_space_3d = Space::bounded(vec![-1.0; 3], vec![1.0; 3]);
        let err = DiscreteActionWrapper::new(&obs_space, &act_space_3d, 3, 3);
        assert!(matches!(err, Err(FrlError::UnsupportedSpace { .. })));
        let err = MultiDiscreteActionWrapper::new(&obs_space, &Space::Discrete(4), 3, 3);
        assert!(matches!(err, Err(FrlError::UnsupportedSpace { .. })));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            "multi-discrete".parse::<ActionSpaceMode>().unwrap(),
            ActionSpaceMode::MultiDiscrete
        );
        let err = "box".parse::<ActionSpaceMode>().unwrap_err().to_string();
        assert!(err.contains("'continuous', 'discrete' and 'multi-discrete'"));
    }
}
