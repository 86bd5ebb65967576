mod common;
use anyhow::Result;
use common::{zero_actions, Diverging, Walk};
use foosball_rl_core::{error::FrlError, Env, Observation, Space, VecEnv};
use foosball_rl_env::{
    apply_env_wrappers, create_envs, create_envs_with, create_eval_envs,
    vec::{VecPbrs, VideoConfig},
    wrapper::{ActionSpaceConfig, ActionSpaceMode},
    DummyVecEnv, EnvId, EnvWrapperConfig, TableEnvConfig, VecPipeline, WrapperConfig,
};
use rand::{rngs::SmallRng, SeedableRng};
use std::{fs, path::Path};
use tempdir::TempDir;
use test_log::test;

fn walks(len: usize) -> impl Fn(usize) -> Result<Box<dyn Env>> {
    move |_: usize| -> Result<Box<dyn Env>> { Ok(Box::new(Walk::new(len))) }
}

fn wrapper_config(pbrs: bool, normalize: bool) -> WrapperConfig {
    let mut config = WrapperConfig::default();
    config.vec_env_wrapper.use_vec_pbrs_wrapper = pbrs;
    config.vec_env_wrapper.use_vec_normalize_wrapper = normalize;
    config
}

fn random_steps(venv: &mut VecPipeline, n: usize, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    for _ in 0..n {
        let acts = (0..venv.num_envs())
            .map(|_| venv.action_space().sample_act(&mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        venv.step(&acts)?;
    }
    Ok(())
}

#[test]
fn test_stage_order() -> Result<()> {
    let mut config = wrapper_config(true, true);
    config.env_wrapper.use_goal_env_wrapper = true;
    config.env_wrapper.use_action_space_wrapper = true;
    config.env_wrapper.action_space_wrapper.action_space = ActionSpaceMode::Discrete;

    let venv = create_envs_with(walks(10), &config, 2, 0, 0.99, None, None)?;
    assert_eq!(
        venv.env_stage_names(),
        vec![
            "AddActionToObservation",
            "GoalEnvWrapper",
            "DiscreteActionWrapper",
            "Monitor"
        ]
    );
    assert_eq!(
        venv.vec_stage_names(),
        vec!["VecPbrs", "VecNormalize", "VecCheckNan"]
    );
    assert_eq!(venv.action_space(), &Space::Discrete(6));
    Ok(())
}

#[test]
fn test_continuous_action_space_is_passed_through() -> Result<()> {
    let mut config = wrapper_config(false, false);
    config.env_wrapper.use_action_space_wrapper = true;
    config.env_wrapper.action_space_wrapper = ActionSpaceConfig::default();

    let venv = create_envs_with(walks(10), &config, 1, 0, 0.99, None, None)?;
    assert_eq!(
        venv.env_stage_names(),
        vec!["AddActionToObservation", "Monitor"]
    );
    assert_eq!(venv.vec_stage_names(), vec!["VecCheckNan"]);
    assert_eq!(venv.action_space(), Walk::new(1).action_space());
    Ok(())
}

#[test]
fn test_pbrs_reset_zeroes_potentials() -> Result<()> {
    let env_config = TableEnvConfig::new(EnvId::Goalkeeper);
    let mut venv = create_envs(&env_config, &wrapper_config(true, false), 4, 7, 0.99, None, None)?;
    venv.reset()?;
    random_steps(&mut venv, 3, 0)?;
    let pbrs = venv.get_pbrs().expect("reward shaping is enabled");
    assert!(pbrs.last_potentials().iter().all(|p| *p != 0.0));

    venv.reset()?;
    let pbrs = venv.get_pbrs().expect("reward shaping is enabled");
    assert_eq!(pbrs.last_potentials(), &[0.0; 4]);
    Ok(())
}

#[test]
fn test_pbrs_telescopes_without_discount() -> Result<()> {
    let mut venv = create_envs_with(walks(100), &wrapper_config(true, false), 1, 0, 1.0, None, None)?;
    venv.reset()?;
    let mut shaped = 0.0;
    for _ in 0..20 {
        let step = venv.step(&zero_actions(1))?;
        shaped += step.reward[0];
    }
    let last = venv.get_pbrs().expect("reward shaping is enabled").last_potentials()[0];
    assert!((shaped - last).abs() < 1e-4);

    // Potential of the ball after 20 steps, at x = 2.0.
    let expected = foosball_rl_env::vec::euclidean_distance(&[2.0, 0.0]);
    assert!((last - expected).abs() < 1e-4);
    Ok(())
}

#[test]
fn test_zero_potential_adds_nothing() -> Result<()> {
    let env = apply_env_wrappers(Box::new(Walk::new(3)), &EnvWrapperConfig::default())?;
    let venv = DummyVecEnv::new(vec![env])?;
    let pbrs = VecPbrs::new(venv.observation_space(), 1, 0.99, Box::new(|_| 0.0))?;
    let mut venv = VecPipeline::new(venv).pbrs(pbrs);
    venv.reset()?;
    let rewards = (0..6)
        .map(|_| -> Result<f32> { Ok(venv.step(&zero_actions(1))?.reward[0]) })
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(rewards, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    Ok(())
}

#[test]
fn test_episode_end_is_monitored() -> Result<()> {
    let mut venv = create_envs_with(walks(3), &wrapper_config(false, false), 2, 0, 0.99, None, None)?;
    venv.reset()?;
    venv.step(&zero_actions(2))?;
    venv.step(&zero_actions(2))?;
    let step = venv.step(&zero_actions(2))?;
    for i in 0..2 {
        assert!(step.is_done(i));
        assert_eq!(step.info[i].get_scalar("episode_return")?, 1.0);
        assert_eq!(step.info[i].get_scalar("episode_length")?, 3.0);
        // The ball position followed by the last action.
        let terminal = step.info[i].get_array1("terminal_observation")?;
        assert!((terminal[0] - 0.3).abs() < 1e-6);
        assert_eq!(terminal.len(), 5);
        // The next episode has started.
        assert_eq!(step.obs[i].features().map(|o| o[0]), Some(0.0));
    }
    Ok(())
}

#[test]
fn test_normalization_stats_round_trip() -> Result<()> {
    let tmp = TempDir::new("vec_normalize")?;
    let path = tmp.path().join("vec_normalize.bin");
    let env_config = TableEnvConfig::new(EnvId::Goalkeeper);
    let config = wrapper_config(true, true);

    let mut venv = create_envs(&env_config, &config, 2, 0, 0.99, None, None)?;
    venv.reset()?;
    random_steps(&mut venv, 20, 1)?;
    let normalize = venv.get_normalize().expect("normalization is enabled");
    normalize.save(&path)?;
    let saved = normalize.stats();

    let mut loaded = create_envs(&env_config, &config, 2, 0, 0.99, Some(path.as_path()), None)?;
    assert_eq!(saved, loaded.get_normalize().expect("normalization is enabled").stats());
    assert!(saved.obs_rms[0].1.count > 20.0);

    // Stats read from the file normalize like the in-memory ones.
    let mut synced = create_envs(&env_config, &config, 2, 0, 0.99, None, None)?;
    synced
        .get_normalize_mut()
        .expect("normalization is enabled")
        .sync_from(&saved)?;
    assert_eq!(loaded.reset()?, synced.reset()?);
    let mut rng = SmallRng::seed_from_u64(4);
    for _ in 0..10 {
        let acts = (0..2)
            .map(|_| loaded.action_space().sample_act(&mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        let (a, b) = (loaded.step(&acts)?, synced.step(&acts)?);
        assert_eq!(a.obs, b.obs);
        assert_eq!(a.reward, b.reward);
    }
    Ok(())
}

#[test]
fn test_eval_envs_do_not_update_stats() -> Result<()> {
    let env_config = TableEnvConfig::new(EnvId::Goalkeeper);
    let mut venv = create_eval_envs(&env_config, &wrapper_config(false, true), 2, 0, 0.99, None, None)?;
    let before = venv.get_normalize().expect("normalization is enabled").stats();
    venv.reset()?;
    random_steps(&mut venv, 10, 2)?;
    let normalize = venv.get_normalize().expect("normalization is enabled");
    assert_eq!(before, normalize.stats());
    assert!(!normalize.config().training);
    assert!(!normalize.config().norm_reward);
    Ok(())
}

#[test]
fn test_nan_observation_aborts() -> Result<()> {
    let make_env = |_: usize| -> Result<Box<dyn Env>> { Ok(Box::new(Diverging(Walk::new(2)))) };
    let mut venv = create_envs_with(make_env, &wrapper_config(false, false), 1, 0, 0.99, None, None)?;
    venv.reset()?;
    venv.step(&zero_actions(1))?;
    let err = match venv.step(&zero_actions(1)) {
        Ok(_) => panic!("NaN observation was not detected"),
        Err(e) => e,
    };
    match err.downcast_ref::<FrlError>() {
        Some(FrlError::NumericalInstability { target, .. }) => assert_eq!(target, "observations"),
        _ => panic!("unexpected error: {}", err),
    }
    Ok(())
}

#[test]
fn test_nan_observation_aborts_before_normalization() -> Result<()> {
    let make_env = |_: usize| -> Result<Box<dyn Env>> { Ok(Box::new(Diverging(Walk::new(2)))) };
    let mut venv = create_envs_with(make_env, &WrapperConfig::default(), 1, 0, 0.99, None, None)?;
    assert_eq!(venv.vec_stage_names(), vec!["VecPbrs", "VecNormalize", "VecCheckNan"]);
    venv.reset()?;
    venv.step(&zero_actions(1))?;
    let err = match venv.step(&zero_actions(1)) {
        Ok(step) => panic!("NaN observation was clipped to {:?}", step.obs),
        Err(e) => e,
    };
    match err.downcast_ref::<FrlError>() {
        Some(FrlError::NumericalInstability { value, target, .. }) => {
            assert_eq!(value, "NaN");
            assert_eq!(target, "observations");
        }
        _ => panic!("unexpected error: {}", err),
    }

    let stats = venv.get_normalize().expect("normalization is enabled").stats();
    assert!(stats.obs_rms[0].1.mean.iter().all(|m| m.is_finite()));
    assert!(stats.ret_rms.mean.iter().all(|m| m.is_finite()));
    Ok(())
}

#[test]
fn test_pbrs_rejects_image_observations() -> Result<()> {
    let env_config = TableEnvConfig::new(EnvId::Goalkeeper).use_image_obs(true);
    let mut config = wrapper_config(true, false);
    config.env_wrapper.use_add_actions_to_observation_wrapper = false;
    assert!(create_envs(&env_config, &config, 1, 0, 0.99, None, None).is_err());

    config.vec_env_wrapper.use_vec_pbrs_wrapper = false;
    let mut venv = create_envs(&env_config, &config, 1, 0, 0.99, None, None)?;
    let obs = venv.reset()?;
    assert!(matches!(obs[0], Observation::Image(_)));
    Ok(())
}

fn count_files(dir: &Path) -> Result<usize> {
    let mut n = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        n += if path.is_dir() { count_files(&path)? } else { 1 };
    }
    Ok(n)
}

#[test]
fn test_video_frames_are_written() -> Result<()> {
    let tmp = TempDir::new("video")?;
    let env_config = TableEnvConfig::new(EnvId::Goalkeeper).render_size(30, 56);
    let mut config = wrapper_config(false, false);
    config.vec_env_wrapper.use_video_recording_wrapper = true;
    config.vec_env_wrapper.vec_video_recorder_wrapper = VideoConfig {
        video_length: 3,
        video_interval: 1000,
        video_log_path_suffix: "videos".to_string(),
    };

    let mut venv = create_envs(&env_config, &config, 1, 5, 0.99, None, Some(tmp.path()))?;
    assert_eq!(venv.vec_stage_names(), vec!["VecCheckNan", "VecVideoRecorder"]);
    venv.reset()?;
    random_steps(&mut venv, 10, 3)?;
    venv.close();

    let dir = tmp
        .path()
        .join("seed-5")
        .join("videos")
        .join("rl-run-video-step-0-to-step-3");
    assert!(dir.join("frame-00000.png").is_file());
    // One frame at reset, then one per step until the recording exceeds its length.
    assert!(dir.join("frame-00003.png").is_file());
    assert_eq!(count_files(&tmp.path().join("seed-5"))?, 4);
    Ok(())
}
