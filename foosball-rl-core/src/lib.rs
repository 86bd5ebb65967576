#![warn(missing_docs)]
//! Core traits and types for reinforcement learning on simulated foosball tables.
//!
//! This crate is independent of any simulator backend and learning algorithm.
//! It defines the vocabulary shared by the environment pipeline
//! (`foosball-rl-env`) and the experiment driver (`foosball-rl`):
//!
//! * [`Space`], [`Observation`] and [`Action`] describe what flows through an environment.
//! * [`Env`] is a single environment, [`VecEnv`] a batch of environments stepped together.
//!   A [`VecEnv`] emits a batched [`Step`] at every interaction.
//! * [`Policy`] maps observations to actions, [`Agent`] is a trainable policy.
//! * [`record`] provides [`Record`](record::Record) used for step infos and metrics.
//! * [`Trainer`] and [`Evaluator`] drive an [`Agent`] against a [`VecEnv`].
pub mod error;
pub mod record;

mod base;
pub use base::{Agent, Env, EnvStep, Policy, Step, VecEnv};

mod space;
pub use space::{Action, GoalObs, Observation, Space};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerCallback, TrainerConfig};
