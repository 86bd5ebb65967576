//! Geometric predicates on the state of the ball.
//!
//! Goal regions are boxes behind the goal lines with inclusive bounds.
//! The black goal lies at negative x and the white goal at positive x,
//! so a ball can never be in both.
use crate::constants::*;

/// Side of a goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalSide {
    /// Goal defended by the black team.
    Black,
    /// Goal defended by the white team.
    White,
}

fn in_goal_mouth(y: f64, z: f64) -> bool {
    (-ABS_GOAL_Y_SYMMETRIC_BOUND..=ABS_GOAL_Y_SYMMETRIC_BOUND).contains(&y)
        && (0.0..=GOAL_HEIGHT).contains(&z)
}

/// Returns `true` if the ball `(x, y, z)` is inside the black goal.
pub fn ball_in_black_goal_bounds(pos: &[f64]) -> bool {
    (-TABLE_X_BOUND..=BLACK_GOAL_X_POSITION).contains(&pos[0]) && in_goal_mouth(pos[1], pos[2])
}

/// Returns `true` if the ball `(x, y, z)` is inside the white goal.
pub fn ball_in_white_goal_bounds(pos: &[f64]) -> bool {
    (WHITE_GOAL_X_POSITION..=TABLE_X_BOUND).contains(&pos[0]) && in_goal_mouth(pos[1], pos[2])
}

/// Returns the goal the ball `(x, y, z)` is in, if any.
pub fn goal_region(pos: &[f64]) -> Option<GoalSide> {
    if ball_in_black_goal_bounds(pos) {
        Some(GoalSide::Black)
    } else if ball_in_white_goal_bounds(pos) {
        Some(GoalSide::White)
    } else {
        None
    }
}

/// Returns `true` if the ball `(x, y)` left the table.
pub fn ball_outside_table(pos: &[f64]) -> bool {
    pos[0].abs() > TABLE_X_BOUND || pos[1].abs() > TABLE_Y_BOUND
}

/// Returns `true` if the speed `|(vx, vy)|` is below `threshold`.
pub fn ball_stopped(vel: &[f64], threshold: f64) -> bool {
    vel[0].hypot(vel[1]) < threshold
}

/// Returns `true` if no figure of `rod` can touch the ball `(x, y)`,
/// whatever its lateral position.
pub fn ball_outside_player_space(pos: &[f64], rod: &Rod) -> bool {
    if (pos[0] - rod.x).abs() > PLAYER_REACH_X + PLAYER_FOOT_LENGTH {
        return true;
    }
    !rod.figures
        .iter()
        .any(|y| (pos[1] - y).abs() <= rod.travel + PLAYER_REACH_Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_bounds_are_inclusive() {
        let h = FIELD_HEIGHT;
        let g = ABS_GOAL_Y_SYMMETRIC_BOUND;
        assert!(ball_in_white_goal_bounds(&[WHITE_GOAL_X_POSITION, g, h]));
        assert!(ball_in_white_goal_bounds(&[TABLE_X_BOUND, -g, h]));
        assert!(ball_in_black_goal_bounds(&[BLACK_GOAL_X_POSITION, -g, h]));
        assert!(ball_in_black_goal_bounds(&[-TABLE_X_BOUND, g, GOAL_HEIGHT]));

        assert!(!ball_in_white_goal_bounds(&[WHITE_GOAL_X_POSITION - 1e-6, 0.0, h]));
        assert!(!ball_in_white_goal_bounds(&[0.62, g + 1e-6, h]));
        assert!(!ball_in_black_goal_bounds(&[-0.62, 0.0, GOAL_HEIGHT + 1e-6]));
    }

    #[test]
    fn test_goal_classification_is_exclusive() {
        let xs = [-0.68, -0.67, -0.64, -0.6085, -0.3, 0.0, 0.3, 0.6085, 0.64, 0.67, 0.68];
        let ys = [-0.2, -0.1, 0.0, 0.1, 0.2];
        for x in xs.iter() {
            for y in ys.iter() {
                let pos = [*x, *y, FIELD_HEIGHT];
                let black = ball_in_black_goal_bounds(&pos);
                let white = ball_in_white_goal_bounds(&pos);
                assert!(!(black && white));
                match goal_region(&pos) {
                    Some(GoalSide::Black) => assert!(black),
                    Some(GoalSide::White) => assert!(white),
                    None => assert!(!black && !white),
                }
            }
        }
    }

    #[test]
    fn test_ball_outside_table() {
        assert!(!ball_outside_table(&[0.0, 0.0]));
        assert!(!ball_outside_table(&[TABLE_X_BOUND, TABLE_Y_BOUND]));
        assert!(ball_outside_table(&[TABLE_X_BOUND + 0.01, 0.0]));
        assert!(ball_outside_table(&[0.0, -TABLE_Y_BOUND - 0.01]));
    }

    #[test]
    fn test_ball_outside_player_space() {
        assert!(!ball_outside_player_space(&[BLACK_GOALIE_X_POSITION, 0.05], &BLACK_GOALIE));
        assert!(ball_outside_player_space(&[BLACK_GOALIE_X_POSITION, 0.3], &BLACK_GOALIE));
        assert!(ball_outside_player_space(&[0.0, 0.0], &BLACK_GOALIE));
    }
}
