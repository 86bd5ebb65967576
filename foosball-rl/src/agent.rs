//! Agents available from the command line.
use anyhow::Result;
use foosball_rl_core::{
    error::FrlError,
    record::{Record, RecordValue},
    Action, Agent, Observation, Policy, Space,
};
use log::info;
use ndarray::Array1;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};

/// Names of the algorithms accepted by [`build_agent`].
pub const ALGORITHMS: [&str; 1] = ["random"];

const PARAMS_FILE: &str = "random_agent.yaml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct RandomAgentParams {
    n_opts: usize,
    n_transitions: usize,
}

/// Uniform distribution over an action space.
#[derive(Debug, Clone, PartialEq)]
enum Uniform {
    /// Bounds of each element, infinite bounds replaced by `-1` or `1`.
    Continuous(Vec<(f32, f32)>),
    Discrete(usize),
    MultiDiscrete(Vec<usize>),
}

impl Uniform {
    fn new(space: &Space) -> Result<Self, FrlError> {
        match space {
            Space::Box { low, high } => Ok(Self::Continuous(
                low.iter()
                    .zip(high.iter())
                    .map(|(l, h)| {
                        let l = if l.is_finite() { *l } else { -1.0 };
                        let h = if h.is_finite() { *h } else { 1.0 };
                        (l, h.max(l))
                    })
                    .collect(),
            )),
            Space::Discrete(n) if *n > 0 => Ok(Self::Discrete(*n)),
            Space::MultiDiscrete(nvec) if nvec.iter().all(|n| *n > 0) => {
                Ok(Self::MultiDiscrete(nvec.clone()))
            }
            _ => Err(FrlError::UnsupportedSpace {
                wrapper: "RandomAgent".to_string(),
                space: space.to_string(),
            }),
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Action {
        match self {
            Self::Continuous(bounds) => Action::Continuous(
                bounds
                    .iter()
                    .map(|(l, h)| if l < h { rng.gen_range(*l..=*h) } else { *l })
                    .collect::<Array1<f32>>(),
            ),
            Self::Discrete(n) => Action::Discrete(rng.gen_range(0..*n)),
            Self::MultiDiscrete(nvec) => {
                Action::MultiDiscrete(nvec.iter().map(|n| rng.gen_range(0..*n)).collect())
            }
        }
    }
}

/// Samples actions uniformly from the action space.
///
/// Stands in for a learning algorithm: it only counts the transitions it observes
/// and its optimization steps, and saves these counts as its parameters.
pub struct RandomAgent {
    uniform: Uniform,
    rng: SmallRng,
    train: bool,
    params: RandomAgentParams,
}

impl RandomAgent {
    /// Builds the agent for the given action space.
    pub fn new(action_space: &Space, seed: u64) -> Result<Self, FrlError> {
        Ok(Self {
            uniform: Uniform::new(action_space)?,
            rng: SmallRng::seed_from_u64(seed),
            train: true,
            params: RandomAgentParams::default(),
        })
    }

    /// Number of optimization steps so far.
    pub fn n_opts(&self) -> usize {
        self.params.n_opts
    }

    /// Number of observed transitions so far.
    pub fn n_transitions(&self) -> usize {
        self.params.n_transitions
    }
}

impl Policy for RandomAgent {
    fn sample(&mut self, obs: &[Observation]) -> Vec<Action> {
        let uniform = &self.uniform;
        let rng = &mut self.rng;
        obs.iter().map(|_| uniform.sample(rng)).collect()
    }
}

impl Agent for RandomAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, _prev_obs: &[Observation], step: &foosball_rl_core::Step) {
        self.params.n_transitions += step.len();
    }

    fn opt_with_record(&mut self) -> Record {
        self.params.n_opts += 1;
        Record::from_slice(&[(
            "train/n_transitions",
            RecordValue::Scalar(self.params.n_transitions as f32),
        )])
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let mut file = File::create(path.join(PARAMS_FILE))?;
        file.write_all(serde_yaml::to_string(&self.params)?.as_bytes())?;
        info!("Saved the agent in {:?}", path);
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path.join(PARAMS_FILE))?;
        self.params = serde_yaml::from_reader(BufReader::new(file))?;
        info!("Loaded the agent from {:?}", path);
        Ok(())
    }
}

/// Builds the agent of the named algorithm.
pub fn build_agent(algorithm: &str, action_space: &Space, seed: u64) -> Result<RandomAgent> {
    match algorithm {
        "random" => Ok(RandomAgent::new(action_space, seed)?),
        _ => Err(FrlError::InvalidConfig(format!(
            "unknown algorithm {}, expected one of {}",
            algorithm,
            ALGORITHMS.join(", ")
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_samples_valid_actions() -> Result<()> {
        let space = Space::MultiDiscrete(vec![3, 3]);
        let mut agent = RandomAgent::new(&space, 0)?;
        let obs = vec![Observation::from(Array1::<f32>::zeros(3)); 4];
        let acts = agent.sample(&obs);
        assert_eq!(acts.len(), 4);
        assert!(acts.iter().all(|a| space.contains_act(a)));
        Ok(())
    }

    #[test]
    fn test_samples_within_bounds() -> Result<()> {
        let space = Space::Box {
            low: vec![0.5, f32::NEG_INFINITY],
            high: vec![1.5, f32::INFINITY],
        };
        let mut agent = RandomAgent::new(&space, 3)?;
        let obs = vec![Observation::from(Array1::<f32>::zeros(3)); 100];
        for act in agent.sample(&obs) {
            assert!(space.contains_act(&act));
            let a = act.to_vec();
            assert!((0.5..=1.5).contains(&a[0]));
            assert!((-1.0..=1.0).contains(&a[1]));
        }
        Ok(())
    }

    #[test]
    fn test_rejects_image_space() {
        let space = Space::Image { shape: [4, 4, 3] };
        assert!(RandomAgent::new(&space, 0).is_err());
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let tmp = TempDir::new("random_agent")?;
        let space = Space::Discrete(6);
        let mut agent = RandomAgent::new(&space, 0)?;
        agent.opt();
        agent.opt();
        agent.save_params(tmp.path())?;

        let mut loaded = RandomAgent::new(&space, 1)?;
        loaded.load_params(tmp.path())?;
        assert_eq!(loaded.n_opts(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = build_agent("ppo", &Space::Discrete(2), 0).err().unwrap();
        assert!(err.to_string().contains("random"));
    }
}
