//! Vectorized environments.
//!
//! [`DummyVecEnv`] steps a batch of [`WrappedEnv`](crate::wrapper::WrappedEnv)s
//! synchronously in the current thread. A [`VecPipeline`] adds batch-level stages
//! on top of it, applied in a fixed order from the inside out:
//!
//! 1. [`VecPbrs`]: potential-based reward shaping.
//! 2. [`VecNormalize`]: running normalization of observations and rewards.
//! 3. [`VecCheckNan`]: rejects NaN and infinite values.
//! 4. [`VecVideoRecorder`]: dumps rendered frames.
mod base;
mod check_nan;
mod normalize;
mod pbrs;
mod video;
use anyhow::Result;
use foosball_rl_core::{Action, Observation, Space, Step, VecEnv};
use ndarray::Array3;

pub use base::DummyVecEnv;
pub use check_nan::VecCheckNan;
pub use normalize::{RunningMeanStd, VecNormalize, VecNormalizeConfig, VecNormalizeStats};
pub use pbrs::{euclidean_distance, weighted_stepwise, Potential, PotentialFn, VecPbrs};
pub use video::{VecVideoRecorder, VideoConfig};

/// A stage of a [`VecPipeline`].
pub trait VecEnvWrapper {
    /// Name of the stage.
    fn name(&self) -> &'static str;

    /// Inspects the actions before they are applied.
    fn action(&mut self, _acts: &[Action]) -> Result<()> {
        Ok(())
    }

    /// Transforms the initial observations after a reset of all environments.
    fn reset(&mut self, obs: Vec<Observation>, _venv: &mut DummyVecEnv) -> Result<Vec<Observation>> {
        Ok(obs)
    }

    /// Transforms the result of a batched step.
    fn step(&mut self, step: Step, venv: &mut DummyVecEnv) -> Result<Step>;

    /// Releases resources of the stage.
    fn close(&mut self) {}
}

/// A [`DummyVecEnv`] with optional stages in a fixed order.
pub struct VecPipeline {
    venv: DummyVecEnv,
    pbrs: Option<VecPbrs>,
    normalize: Option<VecNormalize>,
    check_nan: Option<VecCheckNan>,
    video: Option<VecVideoRecorder>,
}

impl VecPipeline {
    /// A pipeline without stages.
    pub fn new(venv: DummyVecEnv) -> Self {
        Self {
            venv,
            pbrs: None,
            normalize: None,
            check_nan: None,
            video: None,
        }
    }

    /// Sets the reward shaping stage.
    pub fn pbrs(mut self, v: VecPbrs) -> Self {
        self.pbrs = Some(v);
        self
    }

    /// Sets the normalization stage.
    pub fn normalize(mut self, v: VecNormalize) -> Self {
        self.normalize = Some(v);
        self
    }

    /// Sets the NaN check stage.
    pub fn check_nan(mut self, v: VecCheckNan) -> Self {
        self.check_nan = Some(v);
        self
    }

    /// Sets the video recording stage.
    pub fn video(mut self, v: VecVideoRecorder) -> Self {
        self.video = Some(v);
        self
    }

    /// The batch of environments.
    pub fn venv(&self) -> &DummyVecEnv {
        &self.venv
    }

    /// The reward shaping stage.
    pub fn get_pbrs(&self) -> Option<&VecPbrs> {
        self.pbrs.as_ref()
    }

    /// The normalization stage.
    pub fn get_normalize(&self) -> Option<&VecNormalize> {
        self.normalize.as_ref()
    }

    /// Mutable access to the normalization stage.
    pub fn get_normalize_mut(&mut self) -> Option<&mut VecNormalize> {
        self.normalize.as_mut()
    }

    /// Names of the wrappers of each environment, innermost first.
    pub fn env_stage_names(&self) -> Vec<&'static str> {
        self.venv.stage_names()
    }

    /// Names of the batch-level stages, innermost first.
    pub fn vec_stage_names(&self) -> Vec<&'static str> {
        let mut names = vec![];
        if let Some(w) = &self.pbrs {
            names.push(w.name());
        }
        if let Some(w) = &self.normalize {
            names.push(w.name());
        }
        if let Some(w) = &self.check_nan {
            names.push(w.name());
        }
        if let Some(w) = &self.video {
            names.push(w.name());
        }
        names
    }

    fn split(&mut self) -> (Vec<&mut dyn VecEnvWrapper>, &mut DummyVecEnv) {
        let Self {
            venv,
            pbrs,
            normalize,
            check_nan,
            video,
        } = self;
        let mut stages: Vec<&mut dyn VecEnvWrapper> = vec![];
        if let Some(w) = pbrs {
            stages.push(w);
        }
        if let Some(w) = normalize {
            stages.push(w);
        }
        if let Some(w) = check_nan {
            stages.push(w);
        }
        if let Some(w) = video {
            stages.push(w);
        }
        (stages, venv)
    }
}

impl VecEnv for VecPipeline {
    fn num_envs(&self) -> usize {
        self.venv.num_envs()
    }

    fn observation_space(&self) -> &Space {
        self.venv.observation_space()
    }

    fn action_space(&self) -> &Space {
        self.venv.action_space()
    }

    fn seed(&mut self, seed: u64) {
        self.venv.seed(seed);
    }

    fn reset(&mut self) -> Result<Vec<Observation>> {
        let (mut stages, venv) = self.split();
        let mut obs = venv.reset()?;
        for stage in stages.iter_mut() {
            obs = stage.reset(obs, venv)?;
        }
        Ok(obs)
    }

    fn step(&mut self, acts: &[Action]) -> Result<Step> {
        let (mut stages, venv) = self.split();
        for stage in stages.iter_mut().rev() {
            stage.action(acts)?;
        }
        let mut step = venv.step(acts)?;
        for stage in stages.iter_mut() {
            step = stage.step(step, venv)?;
        }
        Ok(step)
    }

    fn render(&mut self) -> Option<Array3<u8>> {
        self.venv.render()
    }

    fn close(&mut self) {
        let (mut stages, venv) = self.split();
        for stage in stages.iter_mut().rev() {
            stage.close();
        }
        venv.close();
    }
}
