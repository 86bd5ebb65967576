//! A point-mass model of the table.
//!
//! The ball slides on the field with a constant deceleration plus drag,
//! bounces off the walls and the figures, and the rods track the actuator
//! targets with bounded speed. It is meant for smoke runs and tests of the
//! environment pipeline, not as a replacement for a physics engine.
use super::{SimData, Simulator, ROD_QPOS_OFFSET, ROD_QVEL_OFFSET};
use crate::{
    constants::*,
    constraints::{goal_region, GoalSide},
};
use log::trace;
use ndarray::Array3;

const TIMESTEP: f64 = 0.002;
const BALL_DECELERATION: f64 = 0.05;
const BALL_DRAG: f64 = 0.3;
const WALL_RESTITUTION: f64 = 0.8;
const FIGURE_RESTITUTION: f64 = 0.7;
const FIGURE_FRICTION: f64 = 0.5;
const ROD_MAX_LATERAL_SPEED: f64 = 2.0;
const ROD_MAX_ANGULAR_SPEED: f64 = 30.0;
const FIGURE_DOWN_ANGLE: f64 = std::f64::consts::FRAC_PI_3;

const FIELD_COLOR: [u8; 3] = [30, 120, 40];
const BLACK_COLOR: [u8; 3] = [20, 20, 20];
const WHITE_COLOR: [u8; 3] = [240, 240, 240];
const BALL_COLOR: [u8; 3] = [250, 140, 0];

/// Rods present in a [`KinematicTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableLayout {
    /// Only the black goalie.
    Goalkeeper,

    /// All rods of both teams, see [`RODS`].
    Full,
}

/// Kinematic stand-in for a rigid-body engine.
pub struct KinematicTable {
    rods: Vec<Rod>,
    data: SimData,
    ctrl_range: Vec<(f32, f32)>,
    render_size: (usize, usize),
}

impl KinematicTable {
    /// Creates a table with the ball at rest in the center.
    pub fn new(layout: TableLayout) -> Self {
        let rods = match layout {
            TableLayout::Goalkeeper => vec![BLACK_GOALIE],
            TableLayout::Full => RODS.to_vec(),
        };
        let n = rods.len();
        let ctrl_range = rods
            .iter()
            .flat_map(|rod| {
                vec![
                    (-rod.travel as f32, rod.travel as f32),
                    (-ROD_MAX_ANGLE as f32, ROD_MAX_ANGLE as f32),
                ]
            })
            .collect();
        let mut qpos = vec![0.0; ROD_QPOS_OFFSET + 2 * n];
        qpos[2] = FIELD_HEIGHT;
        qpos[3] = 1.0;
        let mut table = Self {
            rods,
            data: SimData {
                qpos,
                qvel: vec![0.0; ROD_QVEL_OFFSET + 2 * n],
                ctrl: vec![0.0; 2 * n],
                sensordata: vec![0.0; 8 + 4 * n],
                time: 0.0,
            },
            ctrl_range,
            render_size: (120, 224),
        };
        table.forward();
        table
    }

    /// Sets the size `(height, width)` of rendered images.
    pub fn render_size(mut self, height: usize, width: usize) -> Self {
        self.render_size = (height, width);
        self
    }

    /// Rods of the table, in the order of the actuators.
    pub fn rods(&self) -> &[Rod] {
        &self.rods
    }

    fn update_sensors(&mut self, acc: [f64; 3]) {
        let d = &mut self.data;
        let goal = goal_region(&d.qpos[0..3]);
        d.sensordata[0] = if goal == Some(GoalSide::Black) { 1.0 } else { 0.0 };
        d.sensordata[1] = if goal == Some(GoalSide::White) { 1.0 } else { 0.0 };
        d.sensordata[2..5].copy_from_slice(&d.qvel[0..3]);
        d.sensordata[5..8].copy_from_slice(&acc);
        for r in 0..self.rods.len() {
            let s = 8 + 4 * r;
            d.sensordata[s] = d.qpos[ROD_QPOS_OFFSET + 2 * r];
            d.sensordata[s + 1] = d.qvel[ROD_QVEL_OFFSET + 2 * r];
            d.sensordata[s + 2] = d.qpos[ROD_QPOS_OFFSET + 2 * r + 1];
            d.sensordata[s + 3] = d.qvel[ROD_QVEL_OFFSET + 2 * r + 1];
        }
    }

    fn move_rods(&mut self, dt: f64) {
        let d = &mut self.data;
        for r in 0..self.rods.len() {
            for (k, max_speed) in [ROD_MAX_LATERAL_SPEED, ROD_MAX_ANGULAR_SPEED].iter().enumerate() {
                let (low, high) = self.ctrl_range[2 * r + k];
                let target = d.ctrl[2 * r + k].clamp(low as f64, high as f64);
                let q = &mut d.qpos[ROD_QPOS_OFFSET + 2 * r + k];
                let v = ((target - *q) / dt).clamp(-max_speed, *max_speed);
                *q += v * dt;
                d.qvel[ROD_QVEL_OFFSET + 2 * r + k] = v;
            }
        }
    }

    fn move_ball(&mut self, dt: f64) {
        let d = &mut self.data;
        let speed = d.qvel[0].hypot(d.qvel[1]);
        if speed > 0.0 {
            let slowed = (speed - (BALL_DECELERATION + BALL_DRAG * speed) * dt).max(0.0);
            d.qvel[0] *= slowed / speed;
            d.qvel[1] *= slowed / speed;
        }
        d.qvel[2] = 0.0;
        d.qpos[0] += d.qvel[0] * dt;
        d.qpos[1] += d.qvel[1] * dt;
        d.qpos[2] = FIELD_HEIGHT;

        // Side walls
        let y_bound = TABLE_Y_BOUND - BALL_RADIUS;
        if d.qpos[1].abs() > y_bound {
            d.qpos[1] = y_bound.copysign(d.qpos[1]);
            d.qvel[1] = -d.qvel[1] * WALL_RESTITUTION;
        }

        // End walls, open at the goal mouths
        let x_bound = WHITE_GOAL_X_POSITION - BALL_RADIUS;
        if d.qpos[0].abs() > x_bound {
            if d.qpos[1].abs() <= ABS_GOAL_Y_SYMMETRIC_BOUND {
                if d.qpos[0].abs() > TABLE_X_BOUND {
                    d.qpos[0] = TABLE_X_BOUND.copysign(d.qpos[0]);
                    d.qvel[0] = 0.0;
                }
            } else {
                d.qpos[0] = x_bound.copysign(d.qpos[0]);
                d.qvel[0] = -d.qvel[0] * WALL_RESTITUTION;
            }
        }
    }

    fn collide_figures(&mut self) {
        let d = &mut self.data;
        for (r, rod) in self.rods.iter().enumerate() {
            let lateral = d.qpos[ROD_QPOS_OFFSET + 2 * r];
            let angle = d.qpos[ROD_QPOS_OFFSET + 2 * r + 1];
            if angle.abs() > FIGURE_DOWN_ANGLE {
                continue;
            }
            let dx = d.qpos[0] - rod.x;
            if dx.abs() > PLAYER_REACH_X {
                continue;
            }
            let hit = rod
                .figures
                .iter()
                .any(|y| (d.qpos[1] - (y + lateral)).abs() <= PLAYER_REACH_Y);
            if !hit {
                continue;
            }

            let lateral_vel = d.qvel[ROD_QVEL_OFFSET + 2 * r];
            let angular_vel = d.qvel[ROD_QVEL_OFFSET + 2 * r + 1];
            let foot_vx = rod.direction * angular_vel * PLAYER_FOOT_LENGTH * angle.cos();
            let side = dx.signum();
            let rel = d.qvel[0] - foot_vx;
            if rel * side < 0.0 {
                trace!("Ball hit a figure of rod {}", rod.name);
                d.qvel[0] = foot_vx - rel * FIGURE_RESTITUTION;
                d.qvel[1] += lateral_vel * FIGURE_FRICTION;
                d.qpos[0] = rod.x + side * PLAYER_REACH_X;
            }
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> (isize, isize) {
        let (h, w) = self.render_size;
        let col = (x + TABLE_X_BOUND) / (2.0 * TABLE_X_BOUND) * (w as f64 - 1.0);
        let row = (TABLE_Y_BOUND - y) / (2.0 * TABLE_Y_BOUND) * (h as f64 - 1.0);
        (row.round() as isize, col.round() as isize)
    }
}

fn fill_rect(img: &mut Array3<u8>, rows: (isize, isize), cols: (isize, isize), color: [u8; 3]) {
    let (h, w) = (img.shape()[0] as isize, img.shape()[1] as isize);
    for r in rows.0.max(0)..=rows.1.min(h - 1) {
        for c in cols.0.max(0)..=cols.1.min(w - 1) {
            for (k, v) in color.iter().enumerate() {
                img[[r as usize, c as usize, k]] = *v;
            }
        }
    }
}

impl Simulator for KinematicTable {
    fn data(&self) -> &SimData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut SimData {
        &mut self.data
    }

    fn ctrl_range(&self) -> &[(f32, f32)] {
        &self.ctrl_range
    }

    fn step(&mut self) {
        let dt = TIMESTEP;
        let prev_vel = [self.data.qvel[0], self.data.qvel[1], self.data.qvel[2]];
        self.move_rods(dt);
        self.move_ball(dt);
        self.collide_figures();
        self.data.time += dt;
        let v = &self.data.qvel;
        let acc = [
            (v[0] - prev_vel[0]) / dt,
            (v[1] - prev_vel[1]) / dt,
            (v[2] - prev_vel[2]) / dt,
        ];
        self.update_sensors(acc);
    }

    fn forward(&mut self) {
        self.update_sensors([0.0; 3]);
    }

    fn timestep(&self) -> f64 {
        TIMESTEP
    }

    fn render(&mut self) -> Option<Array3<u8>> {
        let (h, w) = self.render_size;
        let mut img = Array3::<u8>::zeros((h, w, 3));
        fill_rect(&mut img, (0, h as isize), (0, w as isize), FIELD_COLOR);

        let g = ABS_GOAL_Y_SYMMETRIC_BOUND;
        let (r0, c0) = self.to_pixel(-TABLE_X_BOUND, g);
        let (r1, c1) = self.to_pixel(BLACK_GOAL_X_POSITION, -g);
        fill_rect(&mut img, (r0, r1), (c0, c1), BLACK_COLOR);
        let (r0, c0) = self.to_pixel(WHITE_GOAL_X_POSITION, g);
        let (r1, c1) = self.to_pixel(TABLE_X_BOUND, -g);
        fill_rect(&mut img, (r0, r1), (c0, c1), WHITE_COLOR);

        for (r, rod) in self.rods.iter().enumerate() {
            let color = if rod.direction > 0.0 { BLACK_COLOR } else { WHITE_COLOR };
            let (_, c) = self.to_pixel(rod.x, 0.0);
            fill_rect(&mut img, (0, h as isize), (c, c), color);
            let lateral = self.data.qpos[ROD_QPOS_OFFSET + 2 * r];
            for y in rod.figures.iter() {
                let (r0, c0) = self.to_pixel(rod.x - 0.01, y + lateral + 0.01);
                let (r1, c1) = self.to_pixel(rod.x + 0.01, y + lateral - 0.01);
                fill_rect(&mut img, (r0, r1), (c0, c1), color);
            }
        }

        let (r0, c0) = self.to_pixel(self.data.qpos[0] - BALL_RADIUS, self.data.qpos[1] + BALL_RADIUS);
        let (r1, c1) = self.to_pixel(self.data.qpos[0] + BALL_RADIUS, self.data.qpos[1] - BALL_RADIUS);
        fill_rect(&mut img, (r0, r1), (c0, c1), BALL_COLOR);

        Some(img)
    }
}
