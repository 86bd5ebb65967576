//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    error::FrlError,
    record::{Record, RecordValue::Scalar},
    Policy, VecEnv,
};
use anyhow::Result;
use log::{debug, info};

/// Runs a fixed number of episodes on a [`VecEnv`] and reports the statistics
/// of the episode returns and lengths.
///
/// The returned [`Record`] contains `eval/mean_reward`, `eval/std_reward` and
/// `eval/mean_ep_length`.
///
/// Episodes are distributed evenly over the environments of the batch, so that
/// environments with short episodes do not dominate the statistics.
/// If an environment reports `episode_return` and `episode_length` in its step
/// info when an episode ends (see the monitor wrapper of `foosball-rl-env`),
/// these values are used instead of the rewards received by the policy. They
/// are not affected by reward shaping or normalization applied to the batch.
pub struct DefaultEvaluator<E: VecEnv> {
    n_episodes: usize,
    env: E,
}

impl<E: VecEnv> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    pub fn new(env: E, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            return Err(FrlError::InvalidConfig(
                "the number of evaluation episodes must be positive".to_string(),
            )
            .into());
        }
        Ok(Self { n_episodes, env })
    }

    /// Returns a reference to the evaluation environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns a mutable reference to the evaluation environment.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

impl<E: VecEnv> Evaluator for DefaultEvaluator<E> {
    fn evaluate<P: Policy + ?Sized>(&mut self, policy: &mut P) -> Result<Record> {
        let n_envs = self.env.num_envs();
        let targets: Vec<usize> = (0..n_envs)
            .map(|i| (self.n_episodes + i) / n_envs)
            .collect();
        let mut counts = vec![0usize; n_envs];
        let mut cur_returns = vec![0f32; n_envs];
        let mut cur_lengths = vec![0usize; n_envs];
        let mut returns = Vec::with_capacity(self.n_episodes);
        let mut lengths = Vec::with_capacity(self.n_episodes);

        let mut obs = self.env.reset()?;

        while counts.iter().zip(targets.iter()).any(|(c, t)| c < t) {
            let act = policy.sample(&obs);
            let step = self.env.step(&act)?;

            for i in 0..n_envs {
                cur_returns[i] += step.reward[i];
                cur_lengths[i] += 1;

                if !step.is_done(i) {
                    continue;
                }
                if counts[i] < targets[i] {
                    let info = &step.info[i];
                    let (r, l) = match (
                        info.get_scalar("episode_return"),
                        info.get_scalar("episode_length"),
                    ) {
                        (Ok(r), Ok(l)) => (r, l),
                        _ => (cur_returns[i], cur_lengths[i] as f32),
                    };
                    debug!("Evaluation episode of env {}: return = {}, length = {}", i, r, l);
                    returns.push(r);
                    lengths.push(l);
                    counts[i] += 1;
                }
                cur_returns[i] = 0.0;
                cur_lengths[i] = 0;
            }

            obs = step.obs;
        }

        let n = returns.len() as f32;
        let mean_reward = returns.iter().sum::<f32>() / n;
        let std_reward =
            (returns.iter().map(|r| (r - mean_reward).powi(2)).sum::<f32>() / n).sqrt();
        let mean_ep_length = lengths.iter().sum::<f32>() / n;
        info!(
            "Evaluated {} episodes: mean_reward = {:.3} +/- {:.3}, mean_ep_length = {:.1}",
            returns.len(),
            mean_reward,
            std_reward,
            mean_ep_length
        );

        let mut record = Record::from_scalar("eval/mean_reward", mean_reward);
        record.insert("eval/std_reward", Scalar(std_reward));
        record.insert("eval/mean_ep_length", Scalar(mean_ep_length));
        Ok(record)
    }
}
