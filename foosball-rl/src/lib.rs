//! Training and evaluation of agents on foosball table environments.
//!
//! A run is configured by a single YAML file read into [`RunConfig`].
//! [`train_loop`] trains an agent for each configured seed with periodic
//! evaluation and checkpoints, [`evaluate_model`] evaluates a saved agent.
//! Outputs are stored under `<experiments_dir>/<experiment_name>`:
//!
//! ```text
//! training/
//!   tensorboard/<experiment_name>_seed_<seed>/
//!   seed-<seed>/
//!     <experiment_name>_training_configuration.yaml
//!     checkpoints/
//!     eval/best/
//!     final/
//! testing/
//!   evaluation_result_<experiment_name>_<millis>.yaml
//! ```
pub mod agent;
pub mod callbacks;
pub mod config;
mod evaluate;
mod train;
pub use agent::{build_agent, RandomAgent};
pub use callbacks::{CheckpointCallback, EvalCallback};
pub use config::RunConfig;
pub use evaluate::{evaluate_model, EvaluationResult};
pub use train::{train, train_loop};
