//! Foosball table environment.
use crate::{
    config::{EnvId, TableEnvConfig},
    constants::RODS,
    constraints::{ball_in_black_goal_bounds, ball_in_white_goal_bounds},
    episode::EpisodeDefinition,
    sim::{
        KinematicTable, Simulator, TableLayout, BLACK_GOAL_SENSOR, FIRST_NON_GOAL_SENSOR,
        WHITE_GOAL_SENSOR,
    },
};
use anyhow::Result;
use foosball_rl_core::{
    error::FrlError,
    record::{Record, RecordValue},
    Action, Env, EnvStep, Observation, Space,
};
use log::{info, trace};
use ndarray::{Array1, Array3};
use rand::{rngs::SmallRng, SeedableRng};

/// A foosball table environment from the perspective of the black team.
///
/// The action is the continuous control of the actuators of the black rods,
/// two for each rod: the lateral position and the angle.
/// Actuators of the white rods, if any, are held at zero.
///
/// The feature observation starts with the ball position `(x, y, z)` followed by
/// all sensor readings except the goal sensors, see [`sim`](crate::sim).
/// Alternatively, the observation is the rendered image of the table.
///
/// The reward is `-1` when the ball enters the black goal, `1` when it enters
/// the white goal and `0` otherwise. The info of a step contains the flags
/// `black_conceded` and `white_conceded`.
pub struct TableEnv<S: Simulator> {
    env_id: EnvId,
    sim: S,
    episode: EpisodeDefinition,
    rng: SmallRng,
    observation_space: Space,
    action_space: Space,
    n_actuators: usize,
    step_frequency: usize,
    use_image_obs: bool,
    max_episode_steps: Option<usize>,
    count_steps: usize,
}

impl TableEnv<KinematicTable> {
    /// Builds the environment on a [`KinematicTable`].
    pub fn build(config: &TableEnvConfig) -> Result<Self> {
        let layout = match config.env_id {
            EnvId::Goalkeeper => TableLayout::Goalkeeper,
            EnvId::Foosball => TableLayout::Full,
        };
        let (height, width) = config.render_size;
        Self::new(KinematicTable::new(layout).render_size(height, width), config)
    }
}

impl<S: Simulator> TableEnv<S> {
    /// Creates the environment on the given simulator.
    pub fn new(mut sim: S, config: &TableEnvConfig) -> Result<Self> {
        let n_actuators = match config.env_id {
            EnvId::Goalkeeper => 2,
            EnvId::Foosball => 2 * RODS.iter().filter(|rod| rod.direction > 0.0).count(),
        };
        if sim.ctrl_range().len() < n_actuators {
            return Err(FrlError::InvalidConfig(format!(
                "{} requires {} actuators, the simulator has {}",
                config.env_id,
                n_actuators,
                sim.ctrl_range().len()
            ))
            .into());
        }
        if config.step_frequency == 0 {
            return Err(FrlError::InvalidConfig("step_frequency must be positive".into()).into());
        }

        let (low, high) = sim.ctrl_range()[..n_actuators].iter().cloned().unzip();
        let action_space = Space::bounded(low, high);

        sim.forward();
        let observation_space = if config.use_image_obs {
            match sim.render() {
                Some(img) => {
                    let s = img.shape();
                    Space::Image {
                        shape: [s[0], s[1], s[2]],
                    }
                }
                None => {
                    return Err(FrlError::InvalidConfig(
                        "image observations require a simulator supporting rendering".into(),
                    )
                    .into())
                }
            }
        } else {
            Space::unbounded(3 + sim.data().sensordata.len() - FIRST_NON_GOAL_SENSOR)
        };

        let episode = config
            .episode
            .clone()
            .unwrap_or_else(|| config.env_id.default_episode());
        info!("Initialized {} with episode definition {:?}", config.env_id, episode);
        info!("Using observation space {}", observation_space);
        info!("Using action space {}", action_space);

        Ok(Self {
            env_id: config.env_id,
            sim,
            episode,
            rng: SmallRng::seed_from_u64(0),
            observation_space,
            action_space,
            n_actuators,
            step_frequency: config.step_frequency,
            use_image_obs: config.use_image_obs,
            max_episode_steps: config.max_episode_steps,
            count_steps: 0,
        })
    }

    /// The environment identifier.
    pub fn env_id(&self) -> EnvId {
        self.env_id
    }

    /// The underlying simulator.
    pub fn sim(&self) -> &S {
        &self.sim
    }

    /// Mutable access to the underlying simulator.
    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    /// The episode definition.
    pub fn episode(&self) -> &EpisodeDefinition {
        &self.episode
    }

    /// Simulated time of an environment step in seconds.
    pub fn dt(&self) -> f64 {
        self.sim.timestep() * self.step_frequency as f64
    }

    fn feature_obs(&self) -> Array1<f32> {
        let data = self.sim.data();
        data.ball_pos()
            .iter()
            .chain(data.sensordata[FIRST_NON_GOAL_SENSOR..].iter())
            .map(|v| *v as f32)
            .collect()
    }

    fn observation(&mut self) -> Result<Observation> {
        if self.use_image_obs {
            let img: Array3<u8> = self.sim.render().ok_or_else(|| {
                FrlError::InvalidConfig("the simulator stopped rendering".to_string())
            })?;
            Ok(Observation::Image(img))
        } else {
            Ok(Observation::Array(self.feature_obs()))
        }
    }
}

impl<S: Simulator> Env for TableEnv<S> {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<Observation> {
        if let Some(seed) = seed {
            info!("Setting seed of {} to {}", self.env_id, seed);
            self.rng = SmallRng::seed_from_u64(seed);
        }
        self.episode
            .initialize_episode(self.sim.data_mut(), &mut self.rng);
        self.sim.data_mut().ctrl.iter_mut().for_each(|c| *c = 0.0);
        self.sim.forward();
        self.count_steps = 0;
        self.observation()
    }

    fn step(&mut self, act: &Action) -> Result<EnvStep> {
        let ctrl = match act {
            Action::Continuous(a) if a.len() == self.n_actuators => a,
            _ => {
                return Err(FrlError::InvalidAction {
                    act: act.to_string(),
                    space: self.action_space.to_string(),
                }
                .into())
            }
        };
        trace!("{}::step({})", self.env_id, act);

        for (c, a) in self.sim.data_mut().ctrl.iter_mut().zip(ctrl.iter()) {
            *c = *a as f64;
        }
        for _ in 0..self.step_frequency {
            self.sim.step();
        }
        self.count_steps += 1;

        let data = self.sim.data();
        let black_conceded =
            data.sensordata[BLACK_GOAL_SENSOR] > 0.0 || ball_in_black_goal_bounds(data.ball_pos());
        let white_conceded =
            data.sensordata[WHITE_GOAL_SENSOR] > 0.0 || ball_in_white_goal_bounds(data.ball_pos());
        debug_assert!(!(black_conceded && white_conceded));
        let reward = if black_conceded {
            -1.0
        } else if white_conceded {
            1.0
        } else {
            0.0
        };

        let is_terminated = self.episode.is_terminated(data);
        let mut is_truncated = self.episode.is_truncated(data);
        if let Some(max_steps) = self.max_episode_steps {
            is_truncated |= self.count_steps >= max_steps;
        }

        let mut info = Record::empty();
        info.insert("black_conceded", RecordValue::Scalar(black_conceded as i32 as f32));
        info.insert("white_conceded", RecordValue::Scalar(white_conceded as i32 as f32));

        Ok(EnvStep {
            obs: self.observation()?,
            reward,
            is_terminated,
            is_truncated,
            info,
        })
    }

    fn render(&mut self) -> Option<Array3<u8>> {
        self.sim.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_spaces() -> Result<()> {
        let env = TableEnv::build(&TableEnvConfig::new(EnvId::Goalkeeper))?;
        assert_eq!(env.observation_space(), &Space::unbounded(13));
        assert_eq!(env.action_space().flat_dim(), 2);

        let env = TableEnv::build(&TableEnvConfig::new(EnvId::Foosball))?;
        assert_eq!(env.observation_space(), &Space::unbounded(41));
        assert_eq!(env.action_space().flat_dim(), 8);

        let config = TableEnvConfig::new(EnvId::Goalkeeper)
            .use_image_obs(true)
            .render_size(30, 56);
        let env = TableEnv::build(&config)?;
        assert_eq!(env.observation_space(), &Space::Image { shape: [30, 56, 3] });
        Ok(())
    }

    #[test]
    fn test_observation_starts_with_ball_position() -> Result<()> {
        let mut env = TableEnv::build(&TableEnvConfig::new(EnvId::Goalkeeper))?;
        let obs = env.reset(Some(7))?;
        let data = env.sim().data();
        let features = obs.features().unwrap();
        assert_eq!(features[0], data.qpos[0] as f32);
        assert_eq!(features[1], data.qpos[1] as f32);
        assert_eq!(features[2], data.qpos[2] as f32);
        Ok(())
    }

    #[test]
    fn test_reset_with_seed_is_reproducible() -> Result<()> {
        let mut env = TableEnv::build(&TableEnvConfig::new(EnvId::Goalkeeper))?;
        let obs1 = env.reset(Some(3))?;
        let _ = env.reset(None)?;
        let obs2 = env.reset(Some(3))?;
        assert_eq!(obs1, obs2);
        Ok(())
    }

    #[test]
    fn test_step_rejects_invalid_action() -> Result<()> {
        let mut env = TableEnv::build(&TableEnvConfig::new(EnvId::Goalkeeper))?;
        env.reset(Some(0))?;
        assert!(env.step(&Action::Discrete(1)).is_err());
        assert!(env.step(&Action::Continuous(arr1(&[0.0, 0.0, 0.0]))).is_err());
        assert!(env.step(&Action::Continuous(arr1(&[0.0, 0.0]))).is_ok());
        Ok(())
    }

    #[test]
    fn test_episode_ends() -> Result<()> {
        let config = TableEnvConfig::new(EnvId::Goalkeeper).max_episode_steps(Some(500));
        let mut env = TableEnv::build(&config)?;
        env.reset(Some(0))?;
        let act = Action::Continuous(arr1(&[0.0, 0.0]));
        let mut done = false;
        for _ in 0..500 {
            let step = env.step(&act)?;
            assert!(step.info.contains_key("black_conceded"));
            if step.is_done() {
                done = true;
                break;
            }
        }
        assert!(done);
        Ok(())
    }

    #[test]
    fn test_resting_ball_truncates_by_default() -> Result<()> {
        let mut env = TableEnv::build(&TableEnvConfig::new(EnvId::Foosball))?;
        env.reset(Some(0))?;
        let data = env.sim_mut().data_mut();
        data.qpos[0] = 0.0;
        data.qpos[1] = 0.0;
        data.qvel[0] = 0.0;
        data.qvel[1] = 0.0;

        let act = Action::Continuous(Array1::zeros(env.action_space().flat_dim()));
        for t in 1..=1000 {
            let step = env.step(&act)?;
            assert!(!step.is_terminated);
            if t < 1000 {
                assert!(!step.is_truncated, "truncated at step {}", t);
            } else {
                assert!(step.is_truncated);
            }
        }
        Ok(())
    }
}
