//! Foosball table environments and wrapper pipelines.
//!
//! [`TableEnv`] is a single table environment on a [`Simulator`](sim::Simulator),
//! configured by [`TableEnvConfig`] and following the rules of an
//! [`EpisodeDefinition`]. A small kinematic backend, [`KinematicTable`](sim::KinematicTable),
//! is provided.
//!
//! Environments are composed into a vectorized pipeline by [`create_envs`]:
//!
//! ```text
//! TableEnv -> AddActionToObservation -> GoalEnvWrapper -> action space adapter -> Monitor
//!          -> DummyVecEnv -> VecPbrs -> VecNormalize -> VecCheckNan -> VecVideoRecorder
//! ```
//!
//! Stages are optional except `Monitor`, `DummyVecEnv` and `VecCheckNan`, and
//! selected by [`WrapperConfig`]. The applied stages can be queried by name with
//! [`VecPipeline::env_stage_names`] and [`VecPipeline::vec_stage_names`].
//!
//! ```no_run
//! use foosball_rl_env::{create_envs, EnvId, TableEnvConfig, WrapperConfig};
//! use foosball_rl_core::VecEnv;
//!
//! # fn main() -> anyhow::Result<()> {
//! let env_config = TableEnvConfig::new(EnvId::Goalkeeper);
//! let wrapper = WrapperConfig::default();
//! let mut venv = create_envs(&env_config, &wrapper, 4, 42, 0.99, None, None)?;
//! let obs = venv.reset()?;
//! assert_eq!(obs.len(), 4);
//! # Ok(())
//! # }
//! ```
mod base;
mod config;
pub mod constants;
pub mod constraints;
mod episode;
mod factory;
pub mod sim;
pub mod vec;
pub mod wrapper;
pub use base::TableEnv;
pub use config::{EnvId, TableEnvConfig};
pub use episode::{BallInit, EpisodeDefinition};
pub use factory::{
    apply_env_wrappers, create_envs, create_envs_with, create_eval_envs, EnvWrapperConfig,
    VecEnvWrapperConfig, WrapperConfig,
};
pub use vec::{DummyVecEnv, VecNormalizeStats, VecPipeline};
