//! Errors in the library.
use thiserror::Error;

/// Errors raised while building or running an environment pipeline.
#[derive(Error, Debug)]
pub enum FrlError {
    /// A wrapper was applied to a space it does not support.
    #[error("{wrapper} does not support the space {space}")]
    UnsupportedSpace {
        /// Name of the wrapper.
        wrapper: String,
        /// Description of the offending space.
        space: String,
    },

    /// A configuration value is missing or invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An action does not belong to the action space of the environment.
    #[error("Invalid action {act} for the action space {space}")]
    InvalidAction {
        /// Description of the action.
        act: String,
        /// Description of the action space.
        space: String,
    },

    /// NaN or infinity was found in the data flowing through an environment.
    #[error("Found {value} in {target} of environment {env_ix}")]
    NumericalInstability {
        /// Either `NaN` or `inf`.
        value: String,
        /// Where the value was found, e.g. `observations`.
        target: String,
        /// Index of the environment in the vectorized environment.
        env_ix: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
