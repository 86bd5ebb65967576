use anyhow::Result;
use foosball_rl_core::{record::Record, Action, Env, EnvStep, Observation, Space};
use ndarray::arr1;

/// The ball rolls along the x-axis by `0.1` per step, `(x, y, z) = (0.1 t, 0, 0)`.
///
/// Episodes terminate after `len` steps with reward `1`; other rewards are zero.
pub struct Walk {
    t: usize,
    len: usize,
    obs_space: Space,
    act_space: Space,
}

impl Walk {
    pub fn new(len: usize) -> Self {
        Self {
            t: 0,
            len,
            obs_space: Space::unbounded(3),
            act_space: Space::bounded(vec![-1.0, -1.0], vec![1.0, 1.0]),
        }
    }

    fn obs(&self) -> Observation {
        Observation::Array(arr1(&[0.1 * self.t as f32, 0.0, 0.0]))
    }
}

impl Env for Walk {
    fn observation_space(&self) -> &Space {
        &self.obs_space
    }

    fn action_space(&self) -> &Space {
        &self.act_space
    }

    fn reset(&mut self, _seed: Option<u64>) -> Result<Observation> {
        self.t = 0;
        Ok(self.obs())
    }

    fn step(&mut self, _act: &Action) -> Result<EnvStep> {
        self.t += 1;
        let is_terminated = self.t >= self.len;
        Ok(EnvStep {
            obs: self.obs(),
            reward: if is_terminated { 1.0 } else { 0.0 },
            is_terminated,
            is_truncated: false,
            info: Record::empty(),
        })
    }
}

/// Like [`Walk`] but observes NaN after `len` steps.
pub struct Diverging(pub Walk);

impl Env for Diverging {
    fn observation_space(&self) -> &Space {
        self.0.observation_space()
    }

    fn action_space(&self) -> &Space {
        self.0.action_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<Observation> {
        self.0.reset(seed)
    }

    fn step(&mut self, act: &Action) -> Result<EnvStep> {
        let mut step = self.0.step(act)?;
        if step.is_terminated {
            step.obs = Observation::Array(arr1(&[f32::NAN, 0.0, 0.0]));
            step.is_terminated = false;
        }
        Ok(step)
    }
}

pub fn zero_actions(n: usize) -> Vec<Action> {
    vec![Action::Continuous(arr1(&[0.0, 0.0])); n]
}
