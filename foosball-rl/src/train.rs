//! Training mode.
use crate::{
    agent::build_agent,
    callbacks::{CheckpointCallback, EvalCallback, VEC_NORMALIZE_FILE},
    config::RunConfig,
};
use anyhow::Result;
use foosball_rl_core::{
    record::{NullRecorder, Recorder},
    Agent, Trainer, TrainerCallback, TrainerConfig, VecEnv,
};
use foosball_rl_env::{create_envs, create_eval_envs, VecPipeline};
use foosball_rl_tensorboard::TensorboardRecorder;
use log::{info, warn};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Summary of a training run, written next to its outputs.
#[derive(Serialize)]
struct RunSummary<'a> {
    seed: u64,
    env_wrappers: Vec<&'static str>,
    vec_env_wrappers: Vec<&'static str>,
    config: &'a RunConfig,
}

fn log_training_config(config: &RunConfig, env: &VecPipeline, seed: u64, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "{}_training_configuration.yaml",
        config.common.experiment_name
    ));
    let summary = RunSummary {
        seed,
        env_wrappers: env.env_stage_names(),
        vec_env_wrappers: env.vec_stage_names(),
        config,
    };
    let mut file = File::create(&path)?;
    file.write_all(serde_yaml::to_string(&summary)?.as_bytes())?;
    info!("Saved the run configuration in {:?}", path);
    Ok(())
}

/// Trains an agent for each seed of the configuration.
pub fn train_loop(config: &RunConfig) -> Result<()> {
    let training_path = config.common.training_path();
    for seed in config.training.seeds.iter() {
        train(config, *seed, &training_path)?;
    }
    Ok(())
}

/// Trains an agent with the given seed.
///
/// Outputs go to `<training_path>/seed-<seed>`, except Tensorboard logs written to
/// `<training_path>/tensorboard/<experiment_name>_seed_<seed>`.
/// The agent and the normalization statistics at the end of training are saved in `final`.
/// Returns the number of environment steps.
pub fn train(config: &RunConfig, seed: u64, training_path: &Path) -> Result<usize> {
    let training = &config.training;
    let callbacks_config = &config.callbacks;
    let seed_dir = training_path.join(format!("seed-{}", seed));

    info!(
        "Creating {} {} envs with seed {}",
        training.n_envs, config.environment.env_id, seed
    );
    let mut env = create_envs(
        &config.environment,
        &config.wrapper,
        training.n_envs,
        seed,
        training.gamma,
        training.vec_normalize_load_path.as_deref(),
        Some(training_path),
    )?;
    let mut agent = build_agent(&config.common.algorithm, env.action_space(), seed)?;

    if let Err(e) = log_training_config(config, &env, seed, &seed_dir) {
        warn!("Failed to save the run configuration: {}", e);
    }

    let mut callbacks: Vec<Box<dyn TrainerCallback<VecPipeline>>> = vec![];
    if callbacks_config.use_eval_callback {
        let eval_config = &callbacks_config.eval_callback;
        let eval_dir = seed_dir.join("eval");
        let eval_env = create_eval_envs(
            &config.environment,
            &config.wrapper,
            eval_config.n_eval_envs,
            eval_config.eval_seed,
            training.gamma,
            None,
            Some(eval_dir.join("video").as_path()),
        )?;
        let callback = EvalCallback::new(eval_env, eval_dir.join("best"), eval_config)?;
        callbacks.push(Box::new(callback));
    }
    if callbacks_config.use_checkpoint_callback {
        callbacks.push(Box::new(CheckpointCallback::new(
            seed_dir.join("checkpoints"),
            callbacks_config.checkpoint_callback.clone(),
        )));
    }

    let mut recorder: Box<dyn Recorder> = if callbacks_config.use_tensorboard {
        let logdir = training_path
            .join("tensorboard")
            .join(format!("{}_seed_{}", config.common.experiment_name, seed));
        Box::new(TensorboardRecorder::new(logdir))
    } else {
        Box::new(NullRecorder::default())
    };

    let mut trainer = Trainer::build(
        TrainerConfig::default()
            .total_timesteps(training.total_timesteps)
            .opt_interval(training.opt_interval)
            .flush_record_interval(training.flush_record_interval),
    );
    let env_steps = trainer.train(&mut env, &mut agent, recorder.as_mut(), &mut callbacks)?;

    let final_dir = seed_dir.join("final");
    agent.save_params(&final_dir)?;
    if let Some(normalize) = env.get_normalize() {
        if let Err(e) = normalize.save(final_dir.join(VEC_NORMALIZE_FILE)) {
            warn!("Failed to save normalization stats: {}", e);
        }
    }
    env.close();
    Ok(env_steps)
}
