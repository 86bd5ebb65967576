//! Train [`Agent`].
mod config;
use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    Agent, VecEnv,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{debug, info};
use std::time::SystemTime;

/// A hook called by [`Trainer`] during training.
///
/// Checkpointing and periodic evaluation are implemented as callbacks.
pub trait TrainerCallback<E: VecEnv> {
    /// Called after every batched environment step.
    ///
    /// `env_steps` is the number of environment steps so far, summed over
    /// the environments of the batch. The returned record is stored in the recorder.
    fn on_step(&mut self, env_steps: usize, env: &mut E, agent: &mut dyn Agent) -> Result<Record>;

    /// Called once when the training loop ends.
    fn on_training_end(&mut self, _env: &mut E, _agent: &mut dyn Agent) -> Result<()> {
        Ok(())
    }
}

/// Manages the training loop.
///
/// # Training loop
///
/// 0. Given a [`VecEnv`], an agent implementing [`Agent`], a recorder implementing
///    [`Recorder`] and a list of [`TrainerCallback`]s.
/// 1. Reset the environment and set the agent to training mode.
/// 2. Sample actions with the agent and step the environment.
///    `env_steps` is increased by the number of environments.
/// 3. Pass the previous observations and the [`Step`](crate::Step) to [`Agent::observe`].
/// 4. For every environment in which an episode ended, store `rollout/ep_rew`
///    and `rollout/ep_len` if the environment reported them.
/// 5. Every `opt_interval` batched steps, do an optimization step with
///    [`Agent::opt_with_record`] and store the returned record.
/// 6. Call [`TrainerCallback::on_step`] of each callback.
/// 7. Every `flush_record_interval` batched steps, add `time/fps` and flush the recorder.
/// 8. Back to 2 until `env_steps >= total_timesteps`, then call
///    [`TrainerCallback::on_training_end`] of each callback.
pub struct Trainer {
    total_timesteps: usize,
    opt_interval: usize,
    flush_record_interval: usize,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            total_timesteps: config.total_timesteps,
            opt_interval: config.opt_interval.max(1),
            flush_record_interval: config.flush_record_interval.max(1),
        }
    }

    fn store_episode_infos(step: &crate::Step, recorder: &mut dyn Recorder) {
        for (ix, info) in step.info.iter().enumerate() {
            if !step.is_done(ix) {
                continue;
            }
            if let (Ok(r), Ok(l)) = (
                info.get_scalar("episode_return"),
                info.get_scalar("episode_length"),
            ) {
                let mut record = Record::from_scalar("rollout/ep_rew", r);
                record.insert("rollout/ep_len", Scalar(l));
                recorder.store(record);
            }
        }
    }

    /// Train the agent.
    ///
    /// Returns the number of environment steps performed.
    pub fn train<E, A>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        callbacks: &mut [Box<dyn TrainerCallback<E>>],
    ) -> Result<usize>
    where
        E: VecEnv,
        A: Agent,
    {
        let n_envs = env.num_envs();
        let mut env_steps: usize = 0;
        let mut n_calls: usize = 0;
        let mut steps_for_fps: usize = 0;
        let mut timer = SystemTime::now();

        info!(
            "Starts training for {} steps with {} environments",
            self.total_timesteps, n_envs
        );
        let mut obs = env.reset()?;
        agent.train();

        while env_steps < self.total_timesteps {
            let act = agent.sample(&obs);
            let step = env.step(&act)?;
            n_calls += 1;
            env_steps += n_envs;
            steps_for_fps += n_envs;

            agent.observe(&obs, &step);
            Self::store_episode_infos(&step, recorder);

            if n_calls % self.opt_interval == 0 {
                let record = agent.opt_with_record();
                if !record.is_empty() {
                    recorder.store(record);
                }
            }

            for callback in callbacks.iter_mut() {
                let record = callback.on_step(env_steps, env, agent)?;
                if !record.is_empty() {
                    recorder.store(record);
                }
            }

            if n_calls % self.flush_record_interval == 0 {
                let elapsed = timer.elapsed()?.as_secs_f32();
                if elapsed > 0.0 {
                    recorder.store(Record::from_scalar(
                        "time/fps",
                        steps_for_fps as f32 / elapsed,
                    ));
                }
                debug!("Flush records at {} steps", env_steps);
                recorder.flush(env_steps as _);
                steps_for_fps = 0;
                timer = SystemTime::now();
            }

            obs = step.obs;
        }

        for callback in callbacks.iter_mut() {
            callback.on_training_end(env, agent)?;
        }
        recorder.flush(env_steps as _);
        info!("Finished training after {} steps", env_steps);

        Ok(env_steps)
    }
}
