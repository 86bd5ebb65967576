//! Spaces, observations and actions.
use crate::error::FrlError;
use ndarray::{Array1, Array3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Set of valid observations or actions of an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Space {
    /// Real-valued vector bounded elementwise by `low` and `high`.
    ///
    /// Bounds may be infinite.
    Box {
        /// Lower bounds.
        low: Vec<f32>,
        /// Upper bounds.
        high: Vec<f32>,
    },

    /// Integers in `0..n`.
    Discrete(usize),

    /// Vector of integers, the `i`-th element in `0..nvec[i]`.
    MultiDiscrete(Vec<usize>),

    /// Named sub-spaces, in a fixed order.
    Dict(Vec<(String, Space)>),

    /// RGB image of shape `[height, width, channels]` with values in `0..=255`.
    Image {
        /// Shape of the image.
        shape: [usize; 3],
    },
}

impl Space {
    /// Creates a [`Space::Box`] with the given bounds.
    pub fn bounded(low: Vec<f32>, high: Vec<f32>) -> Self {
        debug_assert_eq!(low.len(), high.len());
        Self::Box { low, high }
    }

    /// Creates a [`Space::Box`] of `dim` unbounded elements.
    pub fn unbounded(dim: usize) -> Self {
        Self::Box {
            low: vec![f32::NEG_INFINITY; dim],
            high: vec![f32::INFINITY; dim],
        }
    }

    /// Returns the bounds if the space is a [`Space::Box`].
    pub fn as_box(&self) -> Option<(&[f32], &[f32])> {
        match self {
            Self::Box { low, high } => Some((low.as_slice(), high.as_slice())),
            _ => None,
        }
    }

    /// Returns `true` if the space is an image space.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    /// Returns the number of scalar elements of a flattened member of the space.
    ///
    /// A [`Space::Discrete`] member is a scalar, hence `1`.
    pub fn flat_dim(&self) -> usize {
        match self {
            Self::Box { low, .. } => low.len(),
            Self::Discrete(_) => 1,
            Self::MultiDiscrete(nvec) => nvec.len(),
            Self::Dict(spaces) => spaces.iter().map(|(_, s)| s.flat_dim()).sum(),
            Self::Image { shape } => shape.iter().product(),
        }
    }

    /// Returns `true` if the action is a member of the space.
    pub fn contains_act(&self, act: &Action) -> bool {
        match (self, act) {
            (Self::Box { low, high }, Action::Continuous(a)) => {
                a.len() == low.len()
                    && a
                        .iter()
                        .zip(low.iter().zip(high.iter()))
                        .all(|(v, (l, h))| *v >= *l && *v <= *h)
            }
            (Self::Discrete(n), Action::Discrete(a)) => a < n,
            (Self::MultiDiscrete(nvec), Action::MultiDiscrete(a)) => {
                a.len() == nvec.len() && a.iter().zip(nvec.iter()).all(|(v, n)| v < n)
            }
            _ => false,
        }
    }

    /// Returns `true` if the observation has the shape declared by the space.
    ///
    /// Bounds are not checked, only the structure and dimensionality.
    pub fn matches_obs(&self, obs: &Observation) -> bool {
        match (self, obs) {
            (Self::Box { low, .. }, Observation::Array(o)) => o.len() == low.len(),
            (Self::Dict(_), Observation::Goal(g)) => {
                let dim = |key: &str| self.get(key).map(|s| s.flat_dim());
                dim("observation") == Some(g.observation.len())
                    && dim("achieved_goal") == Some(g.achieved_goal.len())
                    && dim("desired_goal") == Some(g.desired_goal.len())
            }
            (Self::Image { shape }, Observation::Image(img)) => img.shape() == &shape[..],
            _ => false,
        }
    }

    /// Returns the sub-space with the given key of a [`Space::Dict`].
    pub fn get(&self, key: &str) -> Option<&Space> {
        match self {
            Self::Dict(spaces) => spaces.iter().find(|(k, _)| k == key).map(|(_, s)| s),
            _ => None,
        }
    }

    /// Samples an action uniformly from the space.
    ///
    /// Unbounded elements of a [`Space::Box`] are sampled from `[-1, 1]`.
    pub fn sample_act<R: Rng>(&self, rng: &mut R) -> Result<Action, FrlError> {
        match self {
            Self::Box { low, high } => {
                let a = low
                    .iter()
                    .zip(high.iter())
                    .map(|(l, h)| {
                        let l = if l.is_finite() { *l } else { -1.0 };
                        let h = if h.is_finite() { *h } else { 1.0 };
                        if l < h {
                            rng.gen_range(l..=h)
                        } else {
                            l
                        }
                    })
                    .collect::<Array1<f32>>();
                Ok(Action::Continuous(a))
            }
            Self::Discrete(n) if *n > 0 => Ok(Action::Discrete(rng.gen_range(0..*n))),
            Self::MultiDiscrete(nvec) if nvec.iter().all(|n| *n > 0) => Ok(Action::MultiDiscrete(
                nvec.iter().map(|n| rng.gen_range(0..*n)).collect(),
            )),
            _ => Err(FrlError::UnsupportedSpace {
                wrapper: "Space::sample_act".to_string(),
                space: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box { low, high } => write!(f, "Box(low={:?}, high={:?})", low, high),
            Self::Discrete(n) => write!(f, "Discrete({})", n),
            Self::MultiDiscrete(nvec) => write!(f, "MultiDiscrete({:?})", nvec),
            Self::Dict(spaces) => {
                write!(f, "Dict(")?;
                for (i, (k, s)) in spaces.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, s)?;
                }
                write!(f, ")")
            }
            Self::Image { shape } => write!(f, "Image({:?})", shape),
        }
    }
}

/// Goal-conditioned observation.
///
/// Algorithms relabeling goals in hindsight read `achieved_goal` and
/// `desired_goal` of stored observations.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalObs {
    /// Observation of the wrapped environment.
    pub observation: Array1<f32>,

    /// Goal achieved in the current state.
    pub achieved_goal: Array1<f32>,

    /// Goal to be achieved.
    pub desired_goal: Array1<f32>,
}

/// Observation of an environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Feature vector.
    Array(Array1<f32>),

    /// Goal-conditioned observation.
    Goal(GoalObs),

    /// RGB image of shape `[height, width, 3]`.
    Image(Array3<u8>),
}

impl Observation {
    /// Returns the feature vector.
    ///
    /// For a goal-conditioned observation, this is the `observation` field.
    /// Images have no feature vector.
    pub fn features(&self) -> Option<&Array1<f32>> {
        match self {
            Self::Array(o) => Some(o),
            Self::Goal(g) => Some(&g.observation),
            Self::Image(_) => None,
        }
    }

    /// Returns `"NaN"` or `"inf"` if the observation contains such a value.
    pub fn non_finite(&self) -> Option<&'static str> {
        match self {
            Self::Array(o) => non_finite(o.iter()),
            Self::Goal(g) => non_finite(
                g.observation
                    .iter()
                    .chain(g.achieved_goal.iter())
                    .chain(g.desired_goal.iter()),
            ),
            Self::Image(_) => None,
        }
    }

    /// Flattens the observation into a vector, mainly for recording.
    pub fn to_vec(&self) -> Vec<f32> {
        match self {
            Self::Array(o) => o.to_vec(),
            Self::Goal(g) => g
                .observation
                .iter()
                .chain(g.achieved_goal.iter())
                .chain(g.desired_goal.iter())
                .cloned()
                .collect(),
            Self::Image(img) => img.iter().map(|v| *v as f32).collect(),
        }
    }
}

impl From<Array1<f32>> for Observation {
    fn from(obs: Array1<f32>) -> Self {
        Self::Array(obs)
    }
}

/// Action applied to an environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Continuous control vector.
    Continuous(Array1<f32>),

    /// Index of a discrete action.
    Discrete(usize),

    /// Indices of a multi-discrete action.
    MultiDiscrete(Vec<usize>),
}

impl Action {
    /// Flattens the action into a vector of floats.
    pub fn to_vec(&self) -> Vec<f32> {
        match self {
            Self::Continuous(a) => a.to_vec(),
            Self::Discrete(a) => vec![*a as f32],
            Self::MultiDiscrete(a) => a.iter().map(|v| *v as f32).collect(),
        }
    }

    /// Returns `"NaN"` or `"inf"` if the action contains such a value.
    pub fn non_finite(&self) -> Option<&'static str> {
        match self {
            Self::Continuous(a) => non_finite(a.iter()),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous(a) => write!(f, "Continuous({:?})", a.to_vec()),
            Self::Discrete(a) => write!(f, "Discrete({})", a),
            Self::MultiDiscrete(a) => write!(f, "MultiDiscrete({:?})", a),
        }
    }
}

fn non_finite<'a>(mut values: impl Iterator<Item = &'a f32>) -> Option<&'static str> {
    values.find(|v| !v.is_finite()).map(|v| if v.is_nan() { "NaN" } else { "inf" })
}
