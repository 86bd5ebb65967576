//! Dimensions of the foosball table.
//!
//! Coordinates are in meters. The origin is the center of the field,
//! the x-axis runs along the long side of the table from the black goal to
//! the white goal and the z-axis points up.

/// Half length of the table, the x-axis spans `[-TABLE_X_BOUND, TABLE_X_BOUND]`.
pub const TABLE_X_BOUND: f64 = 0.67;

/// Half width of the table, the y-axis spans `[-TABLE_Y_BOUND, TABLE_Y_BOUND]`.
pub const TABLE_Y_BOUND: f64 = 0.355;

/// Height of the center of a ball resting on the field.
pub const FIELD_HEIGHT: f64 = 0.0175;

/// Radius of the ball.
pub const BALL_RADIUS: f64 = 0.0175;

/// x-coordinate of the goal line of the white goal.
pub const WHITE_GOAL_X_POSITION: f64 = 0.6085;

/// x-coordinate of the goal line of the black goal.
pub const BLACK_GOAL_X_POSITION: f64 = -0.6085;

/// Half width of both goals, which are centered at `y = 0`.
pub const ABS_GOAL_Y_SYMMETRIC_BOUND: f64 = 0.1;

/// Height of the goal mouth.
pub const GOAL_HEIGHT: f64 = 0.08;

/// Speed of the ball below which it is regarded as stopped.
pub const BALL_STOPPED_VELOCITY_THRESHOLD: f64 = 0.01;

/// x-coordinate of the black goalie rod.
pub const BLACK_GOALIE_X_POSITION: f64 = -0.525;

/// x-coordinate of the white striker rod.
pub const WHITE_STRIKER_X_POSITION: f64 = -0.225;

/// Distance in front of a figure at which the ball is placed.
pub const PLAYER_BALL_DISTANCE_INCREMENT: f64 = 0.03;

/// Half extent of a figure along the x-axis, including the ball radius.
pub const PLAYER_REACH_X: f64 = 0.035;

/// Half extent of a figure along the y-axis, including the ball radius.
pub const PLAYER_REACH_Y: f64 = 0.03;

/// Length from the rod axis to the foot of a figure.
pub const PLAYER_FOOT_LENGTH: f64 = 0.08;

/// A rod of the table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rod {
    /// Short name, e.g. `b_g` for the black goalie.
    pub name: &'static str,

    /// x-coordinate of the rod axis.
    pub x: f64,

    /// y-offsets of the figures at lateral position zero.
    pub figures: &'static [f64],

    /// Maximum lateral displacement in both directions.
    pub travel: f64,

    /// `1.0` if the rod belongs to the black team, `-1.0` otherwise.
    ///
    /// Black figures kick towards the white goal, i.e. in +x.
    pub direction: f64,
}

/// Black goalie.
pub const BLACK_GOALIE: Rod = Rod {
    name: "b_g",
    x: BLACK_GOALIE_X_POSITION,
    figures: &[0.0],
    travel: 0.115,
    direction: 1.0,
};

/// Rods of the full table, black team first.
///
/// Rods of each team are ordered from their own goal towards the opponent.
pub const RODS: [Rod; 8] = [
    BLACK_GOALIE,
    Rod {
        name: "b_d",
        x: -0.375,
        figures: &[-0.12, 0.12],
        travel: 0.115,
        direction: 1.0,
    },
    Rod {
        name: "b_m",
        x: -0.075,
        figures: &[-0.24, -0.12, 0.0, 0.12, 0.24],
        travel: 0.055,
        direction: 1.0,
    },
    Rod {
        name: "b_s",
        x: 0.225,
        figures: &[-0.185, 0.0, 0.185],
        travel: 0.115,
        direction: 1.0,
    },
    Rod {
        name: "w_g",
        x: 0.525,
        figures: &[0.0],
        travel: 0.115,
        direction: -1.0,
    },
    Rod {
        name: "w_d",
        x: 0.375,
        figures: &[-0.12, 0.12],
        travel: 0.115,
        direction: -1.0,
    },
    Rod {
        name: "w_m",
        x: 0.075,
        figures: &[-0.24, -0.12, 0.0, 0.12, 0.24],
        travel: 0.055,
        direction: -1.0,
    },
    Rod {
        name: "w_s",
        x: WHITE_STRIKER_X_POSITION,
        figures: &[-0.185, 0.0, 0.185],
        travel: 0.115,
        direction: -1.0,
    },
];

/// Maximum rotation of a rod in both directions, in radians.
pub const ROD_MAX_ANGLE: f64 = std::f64::consts::FRAC_PI_2;
