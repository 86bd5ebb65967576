//! Running normalization of observations and rewards.
use super::{
    check_nan::{check_obs, check_rewards},
    DummyVecEnv, VecEnvWrapper,
};
use anyhow::{Context, Result};
use foosball_rl_core::{
    error::FrlError,
    record::{Record, RecordValue},
    Observation, Space, Step,
};
use log::{info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Running mean and variance of a stream of vectors.
///
/// Batches are merged with the parallel variance algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningMeanStd {
    /// Mean.
    pub mean: Vec<f64>,

    /// Variance.
    pub var: Vec<f64>,

    /// Number of samples, starting from a small positive value.
    pub count: f64,
}

impl RunningMeanStd {
    /// Statistics of dimension `dim` with zero mean and unit variance.
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            var: vec![1.0; dim],
            count: 1e-4,
        }
    }

    /// Dimension of the statistics.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Merges a batch of samples.
    pub fn update(&mut self, batch: &[Vec<f64>]) {
        if batch.is_empty() {
            return;
        }
        let n = batch.len() as f64;
        for d in 0..self.dim() {
            let batch_mean = batch.iter().map(|x| x[d]).sum::<f64>() / n;
            let batch_var = batch
                .iter()
                .map(|x| (x[d] - batch_mean).powi(2))
                .sum::<f64>()
                / n;
            let delta = batch_mean - self.mean[d];
            let total = self.count + n;
            let m2 = self.var[d] * self.count
                + batch_var * n
                + delta.powi(2) * self.count * n / total;
            self.mean[d] += delta * n / total;
            self.var[d] = m2 / total;
        }
        self.count += n;
    }
}

/// Configuration of [`VecNormalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VecNormalizeConfig {
    /// Update the statistics while stepping.
    pub training: bool,

    /// Normalize observations.
    pub norm_obs: bool,

    /// Normalize rewards by the running standard deviation of discounted returns.
    pub norm_reward: bool,

    /// Absolute bound of normalized observations.
    pub clip_obs: f64,

    /// Absolute bound of normalized rewards.
    pub clip_reward: f64,

    /// Added to the variance to avoid division by zero.
    pub epsilon: f64,
}

impl Default for VecNormalizeConfig {
    fn default() -> Self {
        Self {
            training: true,
            norm_obs: true,
            norm_reward: true,
            clip_obs: 10.0,
            clip_reward: 10.0,
            epsilon: 1e-8,
        }
    }
}

impl VecNormalizeConfig {
    /// Sets `training`.
    pub fn training(mut self, v: bool) -> Self {
        self.training = v;
        self
    }

    /// Sets `norm_obs`.
    pub fn norm_obs(mut self, v: bool) -> Self {
        self.norm_obs = v;
        self
    }

    /// Sets `norm_reward`.
    pub fn norm_reward(mut self, v: bool) -> Self {
        self.norm_reward = v;
        self
    }

    /// Sets `clip_obs`.
    pub fn clip_obs(mut self, v: f64) -> Self {
        self.clip_obs = v;
        self
    }

    /// Sets `clip_reward`.
    pub fn clip_reward(mut self, v: f64) -> Self {
        self.clip_reward = v;
        self
    }
}

/// Snapshot of the statistics of a [`VecNormalize`], stored with bincode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VecNormalizeStats {
    /// Observation statistics per field: `obs` for feature vectors, the dictionary keys
    /// for goal-conditioned observations.
    pub obs_rms: Vec<(String, RunningMeanStd)>,

    /// Statistics of discounted returns.
    pub ret_rms: RunningMeanStd,

    /// Absolute bound of normalized observations.
    pub clip_obs: f64,

    /// Absolute bound of normalized rewards.
    pub clip_reward: f64,

    /// Discount factor of the returns.
    pub gamma: f64,

    /// Added to the variance to avoid division by zero.
    pub epsilon: f64,
}

impl VecNormalizeStats {
    /// Loads statistics saved with [`VecNormalizeStats::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buf = fs::read(path)
            .with_context(|| format!("Failed to read normalization stats {:?}", path))?;
        let stats = bincode::deserialize(&buf[..])?;
        info!("Loaded normalization stats from {:?}", path);
        Ok(stats)
    }

    /// Saves the statistics.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, bincode::serialize(self)?)?;
        info!("Saved normalization stats in {:?}", path);
        Ok(())
    }
}

/// Normalizes observations and rewards with running statistics.
///
/// Original observations and rewards of the last step are kept and can be read with
/// [`VecNormalize::original_obs`] and [`VecNormalize::original_reward`].
pub struct VecNormalize {
    config: VecNormalizeConfig,
    gamma: f64,
    obs_rms: Vec<(String, RunningMeanStd)>,
    ret_rms: RunningMeanStd,
    returns: Vec<f64>,
    original_obs: Vec<Observation>,
    original_reward: Vec<f32>,
}

fn obs_fields(obs_space: &Space) -> Result<Vec<(String, usize)>, FrlError> {
    match obs_space {
        Space::Box { low, .. } => Ok(vec![("obs".to_string(), low.len())]),
        Space::Dict(spaces) => Ok(spaces
            .iter()
            .map(|(k, s)| (k.clone(), s.flat_dim()))
            .collect()),
        _ => Err(FrlError::UnsupportedSpace {
            wrapper: "VecNormalize".to_string(),
            space: obs_space.to_string(),
        }),
    }
}

impl VecNormalize {
    /// Builds the stage with fresh statistics.
    ///
    /// Observations of an image space can only be passed through, i.e., `norm_obs` must be `false`.
    pub fn new(
        obs_space: &Space,
        n_envs: usize,
        gamma: f64,
        config: VecNormalizeConfig,
    ) -> Result<Self, FrlError> {
        let obs_rms = if config.norm_obs {
            obs_fields(obs_space)?
                .into_iter()
                .map(|(k, dim)| (k, RunningMeanStd::new(dim)))
                .collect()
        } else {
            vec![]
        };
        Ok(Self {
            config,
            gamma,
            obs_rms,
            ret_rms: RunningMeanStd::new(1),
            returns: vec![0.0; n_envs],
            original_obs: vec![],
            original_reward: vec![],
        })
    }

    /// Builds the stage with statistics saved in a file.
    ///
    /// `clip_obs`, `clip_reward` and `epsilon` are taken from the file.
    pub fn load(
        obs_space: &Space,
        n_envs: usize,
        config: VecNormalizeConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let stats = VecNormalizeStats::load(path)?;
        let mut venv = Self::new(obs_space, n_envs, stats.gamma, config)?;
        venv.sync_from(&stats)?;
        Ok(venv)
    }

    /// Takes over the statistics of a snapshot.
    ///
    /// Fails if the fields of the observations do not match.
    pub fn sync_from(&mut self, stats: &VecNormalizeStats) -> Result<(), FrlError> {
        if self.config.norm_obs {
            let expected = self
                .obs_rms
                .iter()
                .map(|(k, rms)| (k.as_str(), rms.dim()));
            let given = stats.obs_rms.iter().map(|(k, rms)| (k.as_str(), rms.dim()));
            if !expected.eq(given) {
                return Err(FrlError::InvalidConfig(format!(
                    "normalization stats of {:?} do not match the observations {:?}",
                    stats.obs_rms.iter().map(|(k, r)| (k, r.dim())).collect::<Vec<_>>(),
                    self.obs_rms.iter().map(|(k, r)| (k, r.dim())).collect::<Vec<_>>(),
                )));
            }
            self.obs_rms = stats.obs_rms.clone();
        }
        self.ret_rms = stats.ret_rms.clone();
        self.gamma = stats.gamma;
        self.config.clip_obs = stats.clip_obs;
        self.config.clip_reward = stats.clip_reward;
        self.config.epsilon = stats.epsilon;
        Ok(())
    }

    /// Snapshot of the current statistics.
    pub fn stats(&self) -> VecNormalizeStats {
        VecNormalizeStats {
            obs_rms: self.obs_rms.clone(),
            ret_rms: self.ret_rms.clone(),
            clip_obs: self.config.clip_obs,
            clip_reward: self.config.clip_reward,
            gamma: self.gamma,
            epsilon: self.config.epsilon,
        }
    }

    /// Saves the current statistics.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.stats().save(path)
    }

    /// Stops updating the statistics and normalizing rewards, for evaluation.
    pub fn freeze(&mut self) {
        self.config.training = false;
        self.config.norm_reward = false;
    }

    /// Configuration.
    pub fn config(&self) -> &VecNormalizeConfig {
        &self.config
    }

    /// Observations of the last step or reset before normalization.
    pub fn original_obs(&self) -> &[Observation] {
        &self.original_obs
    }

    /// Rewards of the last step before normalization.
    pub fn original_reward(&self) -> &[f32] {
        &self.original_reward
    }

    fn normalize_field(&self, rms: &RunningMeanStd, x: &[f32]) -> Vec<f32> {
        let clip = self.config.clip_obs;
        x.iter()
            .zip(rms.mean.iter().zip(rms.var.iter()))
            .map(|(v, (m, var))| {
                let z = (*v as f64 - m) / (var + self.config.epsilon).sqrt();
                z.max(-clip).min(clip) as f32
            })
            .collect()
    }

    fn normalize_obs(&self, obs: Observation) -> Observation {
        if !self.config.norm_obs {
            return obs;
        }
        match obs {
            Observation::Array(o) => {
                let o = o.to_vec();
                Observation::Array(Array1::from(self.normalize_field(&self.obs_rms[0].1, &o)))
            }
            Observation::Goal(mut g) => {
                for (k, rms) in self.obs_rms.iter() {
                    let field = match k.as_str() {
                        "observation" => &mut g.observation,
                        "achieved_goal" => &mut g.achieved_goal,
                        "desired_goal" => &mut g.desired_goal,
                        _ => continue,
                    };
                    let v = field.to_vec();
                    *field = Array1::from(self.normalize_field(rms, &v));
                }
                Observation::Goal(g)
            }
            obs @ Observation::Image(_) => obs,
        }
    }

    /// Normalizes a flattened observation, fields laid out one after another.
    fn normalize_flat(&self, flat: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(flat.len());
        let mut offset = 0;
        for (_, rms) in self.obs_rms.iter() {
            let end = (offset + rms.dim()).min(flat.len());
            out.extend(self.normalize_field(rms, &flat[offset..end]));
            offset = end;
        }
        out
    }

    fn update_obs_rms(&mut self, obs: &[Observation]) {
        if !(self.config.training && self.config.norm_obs) {
            return;
        }
        for (k, rms) in self.obs_rms.iter_mut() {
            let batch = obs
                .iter()
                .filter_map(|o| match (o, k.as_str()) {
                    (Observation::Array(o), _) => Some(o),
                    (Observation::Goal(g), "observation") => Some(&g.observation),
                    (Observation::Goal(g), "achieved_goal") => Some(&g.achieved_goal),
                    (Observation::Goal(g), "desired_goal") => Some(&g.desired_goal),
                    _ => None,
                })
                .map(|o| o.iter().map(|v| *v as f64).collect())
                .collect::<Vec<Vec<f64>>>();
            rms.update(&batch);
        }
    }

    fn normalize_terminal_obs(&self, info: &mut Record) {
        if !self.config.norm_obs {
            return;
        }
        match info.get_array1("terminal_observation") {
            Ok(flat) => {
                let normalized = self.normalize_flat(&flat);
                info.insert("terminal_observation", RecordValue::Array1(normalized));
            }
            Err(FrlError::RecordKeyError(_)) => {}
            Err(e) => warn!("Failed to normalize the terminal observation: {}", e),
        }
    }
}

impl VecEnvWrapper for VecNormalize {
    fn name(&self) -> &'static str {
        "VecNormalize"
    }

    fn reset(&mut self, obs: Vec<Observation>, _venv: &mut DummyVecEnv) -> Result<Vec<Observation>> {
        check_obs(&obs)?;
        self.returns.iter_mut().for_each(|r| *r = 0.0);
        self.update_obs_rms(&obs);
        self.original_obs = obs.clone();
        Ok(obs.into_iter().map(|o| self.normalize_obs(o)).collect())
    }

    fn step(&mut self, mut step: Step, _venv: &mut DummyVecEnv) -> Result<Step> {
        // Statistics must never absorb a non-finite value.
        check_obs(&step.obs)?;
        check_rewards(&step.reward)?;
        self.update_obs_rms(&step.obs);
        self.original_obs = step.obs.clone();
        self.original_reward = step.reward.clone();

        for (ret, r) in self.returns.iter_mut().zip(step.reward.iter()) {
            *ret = *ret * self.gamma + *r as f64;
        }
        if self.config.training && self.config.norm_reward {
            let batch = self.returns.iter().map(|r| vec![*r]).collect::<Vec<_>>();
            self.ret_rms.update(&batch);
        }

        let obs = std::mem::take(&mut step.obs);
        step.obs = obs.into_iter().map(|o| self.normalize_obs(o)).collect();

        if self.config.norm_reward {
            let scale = (self.ret_rms.var[0] + self.config.epsilon).sqrt();
            let clip = self.config.clip_reward;
            for r in step.reward.iter_mut() {
                *r = (*r as f64 / scale).max(-clip).min(clip) as f32;
            }
        }

        for i in 0..step.len() {
            if step.is_done(i) {
                self.returns[i] = 0.0;
            }
        }
        for info in step.info.iter_mut() {
            self.normalize_terminal_obs(info);
        }
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_mean_std_matches_batch_statistics() {
        let mut rms = RunningMeanStd::new(1);
        let data = [1.0, 2.0, 3.0, 4.0];
        rms.update(&data.iter().map(|v| vec![*v]).collect::<Vec<_>>());
        assert!((rms.mean[0] - 2.5).abs() < 1e-3);
        assert!((rms.var[0] - 1.25).abs() < 1e-3);

        let mut split = RunningMeanStd::new(1);
        split.update(&[vec![1.0], vec![2.0]]);
        split.update(&[vec![3.0], vec![4.0]]);
        assert!((split.mean[0] - rms.mean[0]).abs() < 1e-6);
        assert!((split.var[0] - rms.var[0]).abs() < 1e-6);
    }

    #[test]
    fn test_image_observations_cannot_be_normalized() {
        let space = Space::Image { shape: [4, 4, 3] };
        assert!(VecNormalize::new(&space, 1, 0.99, VecNormalizeConfig::default()).is_err());
        let config = VecNormalizeConfig::default().norm_obs(false);
        assert!(VecNormalize::new(&space, 1, 0.99, config).is_ok());
    }

    #[test]
    fn test_sync_rejects_mismatching_dims() {
        let config = VecNormalizeConfig::default();
        let mut a = VecNormalize::new(&Space::unbounded(3), 1, 0.99, config.clone()).unwrap();
        let b = VecNormalize::new(&Space::unbounded(5), 1, 0.99, config).unwrap();
        assert!(a.sync_from(&b.stats()).is_err());
    }

    #[test]
    fn test_freeze() {
        let mut v =
            VecNormalize::new(&Space::unbounded(3), 1, 0.99, VecNormalizeConfig::default()).unwrap();
        v.freeze();
        assert!(!v.config().training);
        assert!(!v.config().norm_reward);
        assert!(v.config().norm_obs);
    }
}
