use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::{Calibration, PlantConfig};
use crate::filter::Dema;
use crate::sim::plant::{PlantSim, PlantSim1d};
use crate::sim::reward::Reward;

// ---------------------------------------------------------------------------
// Environment variants
// ---------------------------------------------------------------------------

/// Number of simulated plate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisCount {
    One,
    Two,
}

impl AxisCount {
    pub fn n(self) -> usize {
        match self {
            AxisCount::One => 1,
            AxisCount::Two => 2,
        }
    }
}

/// How the environment interprets the policy's action vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    /// One entry per axis in [-1, 1], scaled to the plate angle limit.
    DirectAngle,
    /// Per-axis {kp, kd, ki} weights, dotted with the scaled observation
    /// to synthesize the command angle through a tanh.
    PidWeights,
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Iteration budget exhausted, the normal case.
    MaxIter,
    /// Ball left the safety bound. A termination signal, not an error.
    Diverged,
}

// ---------------------------------------------------------------------------
// Step interface types
// ---------------------------------------------------------------------------

/// Rejected at the step boundary before anything mutates.
#[derive(Debug, Clone)]
pub enum StepError {
    DimensionMismatch { expected: usize, got: usize },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::DimensionMismatch { expected, got } => {
                write!(f, "action has {} components, environment expects {}", got, expected)
            }
        }
    }
}

impl std::error::Error for StepError {}

/// Result of one environment step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Scaled observation: {error, d_error, integral} × axes.
    pub observation: Vec<f64>,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Raw (unscaled) diagnostics exposed alongside each step.
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub iter: u32,
    pub termination: Option<Termination>,
    pub target: Vec<f64>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub angle: Vec<f64>,
    /// Unfiltered tracking error, the quantity the reward consumes.
    pub real_error: Vec<f64>,
    pub real_d_error: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Plant dispatch over the axis count
// ---------------------------------------------------------------------------

enum Plant {
    One(PlantSim1d),
    Two(PlantSim),
}

impl Plant {
    fn step(&mut self, angles: &[f64; 2]) {
        match self {
            Plant::One(p) => p.step(angles[0]),
            Plant::Two(p) => p.step(nalgebra::Vector2::new(angles[0], angles[1])),
        }
    }

    fn reset(&mut self) {
        match self {
            Plant::One(p) => p.reset(),
            Plant::Two(p) => p.reset(),
        }
    }

    fn position(&self, axis: usize) -> f64 {
        match self {
            Plant::One(p) => p.ball.pos,
            Plant::Two(p) => p.ball.pos[axis],
        }
    }

    fn velocity(&self, axis: usize) -> f64 {
        match self {
            Plant::One(p) => p.ball.vel,
            Plant::Two(p) => p.ball.vel[axis],
        }
    }

    fn angle(&self, axis: usize) -> f64 {
        match self {
            Plant::One(p) => p.motor.angle,
            Plant::Two(p) => {
                if axis == 0 {
                    p.motor_x.angle
                } else {
                    p.motor_y.angle
                }
            }
        }
    }

    fn set_ball(&mut self, axis: usize, pos: f64, vel: f64) {
        match self {
            Plant::One(p) => {
                p.ball.pos = pos;
                p.ball.vel = vel;
            }
            Plant::Two(p) => {
                p.ball.pos[axis] = pos;
                p.ball.vel[axis] = vel;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// The environment
// ---------------------------------------------------------------------------

/// Episode-based RL environment around the closed-loop plant.
///
/// One parameterized type covers every variant: axis count, action
/// interpretation and reward selection are constructor arguments rather
/// than subclasses. Each instance owns its plant and filter state
/// exclusively; run several instances for parallel rollouts.
///
/// Determinism: all stochastic choices (initial state, target
/// perturbations) come from one ChaCha8 stream, so trajectories are
/// reproducible from the reset seed.
pub struct BalancerEnv {
    config: PlantConfig,
    plant: Plant,
    axes: AxisCount,
    mode: ActionMode,
    reward: Reward,
    rng: ChaCha8Rng,
    target: [f64; 2],
    filters: [Dema; 2],
    /// Unscaled observation, laid out [e.., de.., ie..] with stride n.
    obs: [f64; 6],
    real_error: [f64; 2],
    real_d_error: [f64; 2],
    iter: u32,
    done: bool,
}

impl BalancerEnv {
    pub fn new(
        calibration: &Calibration,
        config: PlantConfig,
        axes: AxisCount,
        mode: ActionMode,
        reward: Reward,
    ) -> Self {
        let plant = match axes {
            AxisCount::One => Plant::One(PlantSim1d::new(calibration, &config)),
            AxisCount::Two => Plant::Two(PlantSim::new(calibration, &config)),
        };
        let filter = Dema::new(config.filtering_period);
        Self {
            plant,
            axes,
            mode,
            reward,
            rng: ChaCha8Rng::seed_from_u64(0),
            target: [0.0; 2],
            filters: [filter.clone(), filter],
            obs: [0.0; 6],
            real_error: [0.0; 2],
            real_d_error: [0.0; 2],
            iter: 0,
            done: false,
            config,
        }
    }

    fn n(&self) -> usize {
        self.axes.n()
    }

    /// Length of the action vector this variant expects.
    pub fn action_dim(&self) -> usize {
        match self.mode {
            ActionMode::DirectAngle => self.n(),
            ActionMode::PidWeights => 3 * self.n(),
        }
    }

    /// Length of the observation vector: {e, de, ie} per axis.
    pub fn observation_dim(&self) -> usize {
        3 * self.n()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Begin a randomized episode. Target and ball position start uniform
    /// within ±0.8·max_x, velocity within ±max_x/5. Returns the initial
    /// scaled observation.
    pub fn reset(&mut self, seed: Option<u64>) -> Vec<f64> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.plant.reset();

        let pos_bound = 0.8 * self.config.max_x;
        let vel_bound = self.config.max_x / 5.0;
        for i in 0..self.n() {
            self.target[i] = self.rng.gen_range(-pos_bound..=pos_bound);
            let pos = self.rng.gen_range(-pos_bound..=pos_bound);
            let vel = self.rng.gen_range(-vel_bound..=vel_bound);
            self.plant.set_ball(i, pos, vel);
        }

        self.begin_episode()
    }

    /// Begin a deterministic zero-state episode (benchmarking): ball at
    /// the center, zero target, fixed RNG stream.
    pub fn test_reset(&mut self) -> Vec<f64> {
        self.rng = ChaCha8Rng::seed_from_u64(0);
        self.plant.reset();
        self.target = [0.0; 2];
        self.begin_episode()
    }

    fn begin_episode(&mut self) -> Vec<f64> {
        for i in 0..self.n() {
            self.filters[i].reset_to(self.plant.position(i));
        }
        self.obs = [0.0; 6];
        self.real_error = [0.0; 2];
        self.real_d_error = [0.0; 2];
        self.iter = 0;
        self.done = false;
        self.observe();
        self.scaled_obs()
    }

    /// Advance one tick under `action`.
    pub fn step(&mut self, action: &[f64]) -> Result<StepResult, StepError> {
        if action.len() != self.action_dim() {
            return Err(StepError::DimensionMismatch {
                expected: self.action_dim(),
                got: action.len(),
            });
        }

        // Non-stationary reference: each axis target re-randomizes on a
        // fixed cadence so the controller cannot memorize one setpoint.
        if self.iter > 0 && self.iter % self.config.target_hold_steps == 0 {
            let bound = 0.8 * self.config.max_x;
            for i in 0..self.n() {
                self.target[i] = self.rng.gen_range(-bound..=bound);
            }
        }

        let angles = self.command_angles(action);
        self.plant.step(&angles);
        self.observe();

        let n = self.n();
        let reward = self.reward.compute(
            &self.config,
            &self.real_error[..n],
            &self.real_d_error[..n],
            &angles[..n],
        );

        self.iter += 1;
        let termination = self.check_termination();
        self.done = termination.is_some();

        Ok(StepResult {
            observation: self.scaled_obs(),
            reward,
            done: self.done,
            info: StepInfo {
                iter: self.iter,
                termination,
                target: self.target[..n].to_vec(),
                position: (0..n).map(|i| self.plant.position(i)).collect(),
                velocity: (0..n).map(|i| self.plant.velocity(i)).collect(),
                angle: angles[..n].to_vec(),
                real_error: self.real_error[..n].to_vec(),
                real_d_error: self.real_d_error[..n].to_vec(),
            },
        })
    }

    fn command_angles(&self, action: &[f64]) -> [f64; 2] {
        let n = self.n();
        let mut angles = [0.0; 2];
        match self.mode {
            ActionMode::DirectAngle => {
                for i in 0..n {
                    angles[i] = action[i] * self.config.max_angle;
                }
            }
            ActionMode::PidWeights => {
                let sobs = self.scaled_obs();
                for i in 0..n {
                    let z: f64 = (0..3).map(|k| action[k * n + i] * sobs[k * n + i]).sum();
                    angles[i] = z.tanh() * self.config.max_angle;
                }
            }
        }
        angles
    }

    fn observe(&mut self) {
        let n = self.n();
        let dt = self.config.dt;
        for i in 0..n {
            let pos = self.plant.position(i);
            let dema = self.filters[i].update(pos);

            let f_error = dema - self.target[i];
            let f_d_error = (f_error - self.obs[i]) / dt;
            let f_integral = (self.obs[2 * n + i] + f_error * dt)
                .clamp(-self.config.ball_max_integral, self.config.ball_max_integral);

            self.obs[i] = f_error;
            self.obs[n + i] = f_d_error;
            self.obs[2 * n + i] = f_integral;

            // Unfiltered pair, kept apart for the reward: filtering shapes
            // what the controller sees, never what it is paid for.
            let real = pos - self.target[i];
            self.real_d_error[i] = (real - self.real_error[i]) / dt;
            self.real_error[i] = real;
        }
    }

    fn scaled_obs(&self) -> Vec<f64> {
        let n = self.n();
        let mut out = vec![0.0; 3 * n];
        for i in 0..n {
            out[i] = self.obs[i] * self.config.ball_error_scaling;
            out[n + i] = self.obs[n + i] * self.config.ball_d_error_scaling;
            out[2 * n + i] = self.obs[2 * n + i] * self.config.ball_integral_error_scaling;
        }
        out
    }

    fn check_termination(&self) -> Option<Termination> {
        for i in 0..self.n() {
            if self.plant.position(i).abs() > self.config.escape_bound {
                return Some(Termination::Diverged);
            }
        }
        if self.iter >= self.config.max_iter {
            return Some(Termination::MaxIter);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
