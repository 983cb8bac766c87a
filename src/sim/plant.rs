use nalgebra::Vector2;

use crate::config::{Calibration, PlantConfig};
use crate::control::MotorPid;
use crate::dynamics::{Ball, Ball1d, Motor};

// ---------------------------------------------------------------------------
// Closed-loop plant: two motors + inner PIDs + ball
// ---------------------------------------------------------------------------

/// The full two-axis cascade.
///
/// The outer loop (whatever drives `step`) commands plate *angles*; the
/// inner loop tracks those angles with the calibrated motor PID and the
/// ball responds to the realized tilt. This mirrors the physical
/// actuation hierarchy: slow ball dynamics on top, fast servo loop below.
pub struct PlantSim {
    pub motor_x: Motor,
    pub motor_y: Motor,
    pid: MotorPid,
    pub ball: Ball,
    dt: f64,
    /// Angle tracking error per axis, deg.
    pub error: Vector2<f64>,
    /// Error derivative per axis, deg/s.
    pub d_error: Vector2<f64>,
    /// Error integral per axis, deg·s. Deliberately unclamped: the inner
    /// loop relies on the tanh drive saturation, not on windup limits.
    pub i_error: Vector2<f64>,
}

impl PlantSim {
    pub fn new(calibration: &Calibration, config: &PlantConfig) -> Self {
        Self::with_motors(
            Motor::physical(calibration.motor.clone(), config),
            Motor::physical(calibration.motor.clone(), config),
            calibration,
            config,
        )
    }

    /// Build with caller-supplied motors (e.g. the learned model).
    pub fn with_motors(
        motor_x: Motor,
        motor_y: Motor,
        calibration: &Calibration,
        config: &PlantConfig,
    ) -> Self {
        Self {
            motor_x,
            motor_y,
            pid: MotorPid::new(calibration.pid.clone(), config),
            ball: Ball::new(&calibration.ball, config),
            dt: config.dt,
            error: Vector2::zeros(),
            d_error: Vector2::zeros(),
            i_error: Vector2::zeros(),
        }
    }

    /// Advance one tick toward the target plate angles (deg).
    ///
    /// Both motors update before the ball sees the new tilt.
    pub fn step(&mut self, target: Vector2<f64>) {
        let error = target - Vector2::new(self.motor_x.angle, self.motor_y.angle);
        self.d_error = (error - self.error) / self.dt;
        self.i_error += error * self.dt;
        self.error = error;

        let u_x = self.pid.step(self.error.x, self.d_error.x, self.i_error.x);
        let u_y = self.pid.step(self.error.y, self.d_error.y, self.i_error.y);

        self.motor_x.step(u_x);
        self.motor_y.step(u_y);
        self.ball.step(self.motor_x.angle, self.motor_y.angle);
    }

    /// Return every sub-state and accumulator to zero.
    pub fn reset(&mut self) {
        self.motor_x.reset();
        self.motor_y.reset();
        self.ball.reset();
        self.error = Vector2::zeros();
        self.d_error = Vector2::zeros();
        self.i_error = Vector2::zeros();
    }
}

// ---------------------------------------------------------------------------
// Single-axis cascade
// ---------------------------------------------------------------------------

/// One motor, one inner PID, one ball axis.
pub struct PlantSim1d {
    pub motor: Motor,
    pid: MotorPid,
    pub ball: Ball1d,
    dt: f64,
    pub error: f64,
    pub d_error: f64,
    pub i_error: f64,
}

impl PlantSim1d {
    pub fn new(calibration: &Calibration, config: &PlantConfig) -> Self {
        Self {
            motor: Motor::physical(calibration.motor.clone(), config),
            pid: MotorPid::new(calibration.pid.clone(), config),
            ball: Ball1d::new(&calibration.ball, config),
            dt: config.dt,
            error: 0.0,
            d_error: 0.0,
            i_error: 0.0,
        }
    }

    pub fn step(&mut self, target: f64) {
        let error = target - self.motor.angle;
        self.d_error = (error - self.error) / self.dt;
        self.i_error += error * self.dt;
        self.error = error;

        let u = self.pid.step(self.error, self.d_error, self.i_error);
        self.motor.step(u);
        self.ball.step(self.motor.angle);
    }

    pub fn reset(&mut self) {
        self.motor.reset();
        self.ball.reset();
        self.error = 0.0;
        self.d_error = 0.0;
        self.i_error = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> PlantSim {
        PlantSim::new(&Calibration::default(), &PlantConfig::default())
    }

    #[test]
    fn motors_track_commanded_angle() {
        let mut p = plant();
        let target = Vector2::new(15.0, -10.0);
        for _ in 0..800 {
            p.step(target);
        }
        assert!(
            (p.motor_x.angle - 15.0).abs() < 2.0,
            "Inner loop should settle near the setpoint, got {}",
            p.motor_x.angle
        );
        assert!((p.motor_y.angle + 10.0).abs() < 2.0);
    }

    #[test]
    fn inner_integral_is_not_clamped() {
        let mut p = plant();
        // An unreachable setpoint winds the integral far past any clamp a
        // naive implementation would apply.
        for _ in 0..40_000 {
            p.step(Vector2::new(500.0, 0.0));
        }
        assert!(
            p.i_error.x > 1_000.0,
            "Inner integral must accumulate unboundedly, got {}",
            p.i_error.x
        );
    }

    #[test]
    fn tilting_plate_moves_ball() {
        let mut p = plant();
        for _ in 0..500 {
            p.step(Vector2::new(10.0, 0.0));
        }
        assert!(p.ball.pos.x.abs() > 1e-4, "Sustained tilt must move the ball");
        assert_eq!(p.ball.pos.y, 0.0);
    }

    #[test]
    fn reset_restores_zero_state() {
        let mut p = plant();
        for _ in 0..100 {
            p.step(Vector2::new(10.0, -5.0));
        }
        p.reset();
        assert_eq!(p.motor_x.angle, 0.0);
        assert_eq!(p.motor_y.speed, 0.0);
        assert_eq!(p.ball.pos, Vector2::zeros());
        assert_eq!(p.error, Vector2::zeros());
        assert_eq!(p.i_error, Vector2::zeros());
    }

    #[test]
    fn one_axis_cascade_matches_x_axis() {
        let calibration = Calibration::default();
        let config = PlantConfig::default();
        let mut p2 = PlantSim::new(&calibration, &config);
        let mut p1 = PlantSim1d::new(&calibration, &config);
        for i in 0..300 {
            let t = ((i as f64) * 0.05).sin() * 12.0;
            p2.step(Vector2::new(t, 0.0));
            p1.step(t);
        }
        assert!((p1.motor.angle - p2.motor_x.angle).abs() < 1e-9);
        assert!((p1.ball.pos - p2.ball.pos.x).abs() < 1e-9);
    }
}
