//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
pub use agent::Agent;
pub use env::{Env, VecEnv};
pub use policy::Policy;
pub use step::{EnvStep, Step};
