//! Episode definition.
//!
//! An [`EpisodeDefinition`] decides how an episode starts and when it ends.
//! An episode is initialized by [`EpisodeDefinition::initialize_episode`],
//! then runs until [`EpisodeDefinition::is_terminated`] (a goal) or
//! [`EpisodeDefinition::is_truncated`] (the ball left the table or stopped)
//! returns `true`.
use crate::{
    constants::*,
    constraints::{
        ball_in_black_goal_bounds, ball_in_white_goal_bounds, ball_outside_player_space,
        ball_outside_table, ball_stopped,
    },
    sim::{SimData, BLACK_GOAL_SENSOR, WHITE_GOAL_SENSOR},
};
use log::trace;
use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

/// Initial state of the ball.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BallInit {
    /// Shot by the white striker towards the black goal.
    ///
    /// The ball starts in front of the white striker at a random y in `[-0.1, 0.1]`
    /// and is aimed at a random point of the black goal mouth.
    TowardsBlackGoal {
        /// Speed of the ball.
        speed: f64,
    },

    /// Position and velocity drawn uniformly from the given ranges.
    Uniform {
        /// Range of the x-coordinate.
        x: (f64, f64),
        /// Range of the y-coordinate.
        y: (f64, f64),
        /// Range of the velocity along the x-axis.
        vx: (f64, f64),
        /// Range of the velocity along the y-axis.
        vy: (f64, f64),
        /// Offset of the initial height from [`FIELD_HEIGHT`].
        z_offset: f64,
    },
}

/// Rules of an episode.
///
/// Use one of the presets [`EpisodeDefinition::goalkeeper`], [`EpisodeDefinition::foosball`]
/// or [`EpisodeDefinition::multi_agent`] and adjust the fields if needed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDefinition {
    /// Initial state of the ball.
    pub ball_init: BallInit,

    /// Terminates the episode when the ball enters the white goal.
    pub end_episode_on_struck_goal: bool,

    /// Terminates the episode when the ball enters the black goal.
    pub end_episode_on_conceded_goal: bool,

    /// Sets all rods to their neutral position at the start of an episode.
    pub reset_goalie_position_on_episode_start: bool,

    /// Truncates the episode when the ball stopped for longer than
    /// `ball_stopped_time_threshold_in_s`.
    pub end_episode_on_ball_stopped: bool,

    /// Truncates the episode as soon as the ball stops where the black goalie
    /// cannot reach it.
    pub end_episode_on_ball_out_of_reach: bool,

    /// Speed of the ball below which it is regarded as stopped.
    pub ball_stopped_velocity_threshold: f64,

    /// Time in simulation seconds the ball may rest before the episode is truncated.
    pub ball_stopped_time_threshold_in_s: f64,

    #[serde(skip)]
    ball_stopped_since: Option<f64>,
}

impl Default for EpisodeDefinition {
    fn default() -> Self {
        Self::goalkeeper()
    }
}

impl EpisodeDefinition {
    /// A shot on the black goal to be defended by the black goalie.
    pub fn goalkeeper() -> Self {
        Self {
            ball_init: BallInit::TowardsBlackGoal { speed: 2.0 },
            end_episode_on_struck_goal: true,
            end_episode_on_conceded_goal: true,
            reset_goalie_position_on_episode_start: true,
            end_episode_on_ball_stopped: true,
            end_episode_on_ball_out_of_reach: true,
            ball_stopped_velocity_threshold: BALL_STOPPED_VELOCITY_THRESHOLD,
            ball_stopped_time_threshold_in_s: 5.0,
            ball_stopped_since: None,
        }
    }

    /// A kick-off in the center of the table, ended by a goal or the ball leaving the table.
    pub fn foosball() -> Self {
        Self {
            ball_init: BallInit::Uniform {
                x: (0.0, 0.0),
                y: (0.0, 0.0),
                vx: (-0.005, 0.005),
                vy: (-0.05, 0.05),
                z_offset: 0.0,
            },
            end_episode_on_struck_goal: true,
            end_episode_on_conceded_goal: true,
            reset_goalie_position_on_episode_start: true,
            end_episode_on_ball_stopped: false,
            end_episode_on_ball_out_of_reach: false,
            ball_stopped_velocity_threshold: BALL_STOPPED_VELOCITY_THRESHOLD,
            ball_stopped_time_threshold_in_s: 5.0,
            ball_stopped_since: None,
        }
    }

    /// A random start near the center, also ended when the ball rests for one second.
    pub fn multi_agent() -> Self {
        Self {
            ball_init: BallInit::Uniform {
                x: (-0.1, 0.1),
                y: (-0.2, 0.2),
                vx: (-0.1, 0.1),
                vy: (-0.1, 0.1),
                z_offset: 0.01,
            },
            end_episode_on_ball_stopped: true,
            ball_stopped_time_threshold_in_s: 1.0,
            ..Self::foosball()
        }
    }

    /// Simulation time since which the ball rests, if it does.
    pub fn ball_stopped_since(&self) -> Option<f64> {
        self.ball_stopped_since
    }

    /// Sets the initial state of an episode.
    ///
    /// `data.qpos` and `data.qvel` are updated; derived quantities must be recomputed
    /// by the caller with [`Simulator::forward`](crate::sim::Simulator::forward).
    pub fn initialize_episode(&mut self, data: &mut SimData, rng: &mut SmallRng) {
        self.ball_stopped_since = None;

        if self.reset_goalie_position_on_episode_start {
            data.qpos.iter_mut().for_each(|q| *q = 0.0);
            data.qvel.iter_mut().for_each(|v| *v = 0.0);
        }

        let (pos, vel) = match &self.ball_init {
            BallInit::TowardsBlackGoal { speed } => {
                let x = WHITE_STRIKER_X_POSITION + PLAYER_BALL_DISTANCE_INCREMENT;
                let y = rng.gen_range(-0.1..=0.1);
                let y_target =
                    rng.gen_range(-ABS_GOAL_Y_SYMMETRIC_BOUND..=ABS_GOAL_Y_SYMMETRIC_BOUND);
                let angle = (y_target - y).atan2(BLACK_GOAL_X_POSITION - x);
                (
                    [x, y, FIELD_HEIGHT],
                    [speed * angle.cos(), speed * angle.sin()],
                )
            }
            BallInit::Uniform {
                x,
                y,
                vx,
                vy,
                z_offset,
            } => (
                [
                    uniform(rng, *x),
                    uniform(rng, *y),
                    FIELD_HEIGHT + z_offset,
                ],
                [uniform(rng, *vx), uniform(rng, *vy)],
            ),
        };

        data.qpos[0..3].copy_from_slice(&pos);
        data.qpos[3..7].copy_from_slice(&[1.0, 0.0, 0.0, 0.0]);
        data.qvel[0..6].iter_mut().for_each(|v| *v = 0.0);
        data.qvel[0..2].copy_from_slice(&vel);
        trace!("Initialized episode: ball at {:?} with velocity {:?}", pos, vel);
    }

    /// Returns `true` if a goal ends the episode.
    pub fn is_terminated(&self, data: &SimData) -> bool {
        let pos = data.ball_pos();
        let conceded =
            data.sensordata[BLACK_GOAL_SENSOR] > 0.0 || ball_in_black_goal_bounds(pos);
        let struck = data.sensordata[WHITE_GOAL_SENSOR] > 0.0 || ball_in_white_goal_bounds(pos);
        (self.end_episode_on_conceded_goal && conceded) || (self.end_episode_on_struck_goal && struck)
    }

    /// Returns `true` if the episode is cut off without a goal.
    ///
    /// This method tracks how long the ball rests and must be called once after
    /// every environment step.
    pub fn is_truncated(&mut self, data: &SimData) -> bool {
        let pos = data.ball_pos();
        if ball_outside_table(pos) {
            return true;
        }

        if ball_stopped(data.ball_vel(), self.ball_stopped_velocity_threshold) {
            if self.ball_stopped_since.is_none() {
                self.ball_stopped_since = Some(data.time);
            }
        } else {
            self.ball_stopped_since = None;
        }

        let since = match self.ball_stopped_since {
            Some(since) => since,
            None => return false,
        };

        (self.end_episode_on_ball_out_of_reach && ball_outside_player_space(pos, &BLACK_GOALIE))
            || (self.end_episode_on_ball_stopped
                && data.time - since > self.ball_stopped_time_threshold_in_s)
    }
}

fn uniform(rng: &mut SmallRng, (low, high): (f64, f64)) -> f64 {
    if low < high {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{KinematicTable, Simulator, TableLayout};
    use rand::SeedableRng;

    fn data() -> SimData {
        KinematicTable::new(TableLayout::Goalkeeper).data().clone()
    }

    fn place_ball(data: &mut SimData, pos: [f64; 2], vel: [f64; 2], time: f64) {
        data.qpos[0] = pos[0];
        data.qpos[1] = pos[1];
        data.qvel[0] = vel[0];
        data.qvel[1] = vel[1];
        data.time = time;
    }

    #[test]
    fn test_goalkeeper_initialization() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut episode = EpisodeDefinition::goalkeeper();
        let mut data = data();
        data.qpos[7] = 0.05;

        for _ in 0..100 {
            episode.initialize_episode(&mut data, &mut rng);
            let x = WHITE_STRIKER_X_POSITION + PLAYER_BALL_DISTANCE_INCREMENT;
            assert_eq!(data.qpos[0], x);
            assert!(data.qpos[1].abs() <= 0.1);
            assert_eq!(data.qpos[2], FIELD_HEIGHT);
            assert_eq!(data.qpos[7], 0.0);
            assert!((data.qvel[0].hypot(data.qvel[1]) - 2.0).abs() < 1e-9);
            assert!(data.qvel[0] < 0.0);

            // The ball crosses the black goal line inside the goal mouth.
            let t = (BLACK_GOAL_X_POSITION - x) / data.qvel[0];
            let y = data.qpos[1] + t * data.qvel[1];
            assert!(y.abs() <= ABS_GOAL_Y_SYMMETRIC_BOUND + 1e-9);
        }
    }

    #[test]
    fn test_foosball_initialization() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut episode = EpisodeDefinition::foosball();
        let mut data = KinematicTable::new(TableLayout::Full).data().clone();
        episode.initialize_episode(&mut data, &mut rng);
        assert_eq!(&data.qpos[0..3], &[0.0, 0.0, FIELD_HEIGHT]);
        assert!(data.qvel[0].abs() <= 0.005);
        assert!(data.qvel[1].abs() <= 0.05);
    }

    #[test]
    fn test_termination_flags() {
        let mut data = data();
        let mut episode = EpisodeDefinition::goalkeeper();

        place_ball(&mut data, [-0.63, 0.0], [0.0; 2], 0.0);
        assert!(episode.is_terminated(&data));
        episode.end_episode_on_conceded_goal = false;
        assert!(!episode.is_terminated(&data));

        place_ball(&mut data, [0.63, 0.0], [0.0; 2], 0.0);
        assert!(episode.is_terminated(&data));
        episode.end_episode_on_struck_goal = false;
        assert!(!episode.is_terminated(&data));

        // Goal sensor alone
        let mut episode = EpisodeDefinition::foosball();
        place_ball(&mut data, [0.0, 0.0], [0.0; 2], 0.0);
        assert!(!episode.is_terminated(&data));
        data.sensordata[WHITE_GOAL_SENSOR] = 1.0;
        assert!(episode.is_terminated(&data));
        assert!(!episode.is_truncated(&data));
    }

    #[test]
    fn test_truncated_outside_table() {
        let mut data = data();
        let mut episode = EpisodeDefinition::foosball();
        place_ball(&mut data, [0.0, 0.4], [1.0, 0.0], 0.0);
        assert!(episode.is_truncated(&data));
    }

    #[test]
    fn test_stall_timer_uses_simulation_time() {
        let mut data = data();
        let mut episode = EpisodeDefinition::multi_agent();

        place_ball(&mut data, [0.0, 0.0], [0.0; 2], 10.0);
        assert!(!episode.is_truncated(&data));
        assert_eq!(episode.ball_stopped_since(), Some(10.0));

        data.time = 10.9;
        assert!(!episode.is_truncated(&data));
        assert_eq!(episode.ball_stopped_since(), Some(10.0));

        data.time = 11.1;
        assert!(episode.is_truncated(&data));
    }

    #[test]
    fn test_stall_timer_resets_when_ball_moves() {
        let mut data = data();
        let mut episode = EpisodeDefinition::multi_agent();

        place_ball(&mut data, [0.0, 0.0], [0.0; 2], 0.0);
        assert!(!episode.is_truncated(&data));

        place_ball(&mut data, [0.0, 0.0], [0.5, 0.0], 0.8);
        assert!(!episode.is_truncated(&data));
        assert_eq!(episode.ball_stopped_since(), None);

        place_ball(&mut data, [0.0, 0.0], [0.0; 2], 1.5);
        assert!(!episode.is_truncated(&data));
        assert_eq!(episode.ball_stopped_since(), Some(1.5));

        data.time = 2.4;
        assert!(!episode.is_truncated(&data));
        data.time = 2.6;
        assert!(episode.is_truncated(&data));
    }

    #[test]
    fn test_goalkeeper_truncates_when_ball_out_of_reach() {
        let mut data = data();
        let mut episode = EpisodeDefinition::goalkeeper();

        // Moving ball far from the goalie
        place_ball(&mut data, [0.2, 0.0], [0.5, 0.0], 0.0);
        assert!(!episode.is_truncated(&data));

        // Resting ball in front of the goalie
        place_ball(&mut data, [BLACK_GOALIE_X_POSITION + 0.05, 0.0], [0.0; 2], 0.1);
        assert!(!episode.is_truncated(&data));

        // Resting ball far from the goalie
        place_ball(&mut data, [0.2, 0.0], [0.0; 2], 0.2);
        assert!(episode.is_truncated(&data));
    }

    #[test]
    fn test_initialization_resets_stall_timer() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut data = data();
        let mut episode = EpisodeDefinition::multi_agent();
        place_ball(&mut data, [0.0, 0.0], [0.0; 2], 3.0);
        assert!(!episode.is_truncated(&data));
        assert!(episode.ball_stopped_since().is_some());
        episode.initialize_episode(&mut data, &mut rng);
        assert_eq!(episode.ball_stopped_since(), None);
    }
}
