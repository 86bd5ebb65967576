//! Interface to a rigid-body simulation of the table.
//!
//! Physics is delegated to an engine behind [`Simulator`]. The state is
//! exposed as flat arrays in [`SimData`] with the following layout, where
//! `r` is the index of a rod in the model:
//!
//! | array        | index             | meaning                                   |
//! |--------------|-------------------|-------------------------------------------|
//! | `qpos`       | `0..3`            | ball position `(x, y, z)`                 |
//! | `qpos`       | `3..7`            | ball orientation quaternion `(w, x, y, z)`|
//! | `qpos`       | `7 + 2r`, `8 + 2r`| lateral and angular position of rod `r`   |
//! | `qvel`       | `0..3`            | ball linear velocity                      |
//! | `qvel`       | `3..6`            | ball angular velocity                     |
//! | `qvel`       | `6 + 2r`, `7 + 2r`| lateral and angular velocity of rod `r`   |
//! | `sensordata` | `0`               | black goal sensor                         |
//! | `sensordata` | `1`               | white goal sensor                         |
//! | `sensordata` | `2..5`            | ball velocity                             |
//! | `sensordata` | `5..8`            | ball acceleration                         |
//! | `sensordata` | `8 + 4r..12 + 4r` | lateral position, lateral velocity, angular position and angular velocity of rod `r` |
//! | `ctrl`       | `2r`, `2r + 1`    | lateral and angular actuator of rod `r`   |
//!
//! A goal sensor is positive while the ball is inside the corresponding goal.
mod kinematic;
use ndarray::Array3;
pub use kinematic::{KinematicTable, TableLayout};

/// Index of the black goal sensor.
pub const BLACK_GOAL_SENSOR: usize = 0;

/// Index of the white goal sensor.
pub const WHITE_GOAL_SENSOR: usize = 1;

/// Index of the first sensor not related to a goal.
pub const FIRST_NON_GOAL_SENSOR: usize = 2;

/// Index in `qpos` of the first rod coordinate.
pub const ROD_QPOS_OFFSET: usize = 7;

/// Index in `qvel` of the first rod coordinate.
pub const ROD_QVEL_OFFSET: usize = 6;

/// State of a simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimData {
    /// Generalized positions.
    pub qpos: Vec<f64>,

    /// Generalized velocities.
    pub qvel: Vec<f64>,

    /// Actuator inputs.
    pub ctrl: Vec<f64>,

    /// Sensor readings.
    pub sensordata: Vec<f64>,

    /// Simulation time in seconds.
    pub time: f64,
}

impl SimData {
    /// Ball position `(x, y, z)`.
    pub fn ball_pos(&self) -> &[f64] {
        &self.qpos[0..3]
    }

    /// Ball linear velocity `(vx, vy, vz)`.
    pub fn ball_vel(&self) -> &[f64] {
        &self.qvel[0..3]
    }
}

/// A rigid-body simulation of a foosball table.
pub trait Simulator {
    /// Current state.
    fn data(&self) -> &SimData;

    /// Mutable access to the current state.
    fn data_mut(&mut self) -> &mut SimData;

    /// Range of each actuator as `(low, high)`.
    fn ctrl_range(&self) -> &[(f32, f32)];

    /// Advances the simulation by one time step with the current `ctrl`.
    fn step(&mut self);

    /// Recomputes derived quantities, like sensor readings, from `qpos` and `qvel`
    /// without advancing time.
    fn forward(&mut self);

    /// Length of a time step in seconds.
    fn timestep(&self) -> f64;

    /// Renders the table as an RGB image of shape `[height, width, 3]`.
    fn render(&mut self) -> Option<Array3<u8>> {
        None
    }
}
