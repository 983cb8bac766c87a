use crate::config::{PidGains, PlantConfig};
use crate::control::controller::AxisController;

// ---------------------------------------------------------------------------
// Inner-loop motor PID (fixed gain vector, tanh-saturated)
// ---------------------------------------------------------------------------

/// The cascaded inner-loop controller tracking motor *angle* setpoints.
///
/// `u = tanh(w · [e, de, ie] + bias) · max_u`
///
/// The gain vector is calibrated offline and never trained by the outer
/// loop; the tanh keeps the drive voltage within the servo limit.
#[derive(Debug, Clone)]
pub struct MotorPid {
    gains: PidGains,
    max_u: f64,
}

impl MotorPid {
    pub fn new(gains: PidGains, config: &PlantConfig) -> Self {
        Self { gains, max_u: config.max_motor_u }
    }

    /// Compute the drive voltage from the angle error triplet.
    pub fn step(&self, error: f64, d_error: f64, i_error: f64) -> f64 {
        let w = &self.gains.weights;
        let z = w[0] * error + w[1] * d_error + w[2] * i_error + self.gains.bias;
        z.tanh() * self.max_u
    }
}

impl AxisController for MotorPid {
    fn step(&mut self, error: f64, d_error: f64, integral_error: f64) -> f64 {
        MotorPid::step(self, error, d_error, integral_error)
    }

    fn name(&self) -> &str {
        "MotorPid"
    }
}

// ---------------------------------------------------------------------------
// Outer-loop fixed-gain ball PID
// ---------------------------------------------------------------------------

/// Hand-tuned (or genetically fitted) ball-position PID for one axis.
///
/// Scales the raw error triplet by the observation scalings, then
/// `command = tanh(kp·e + kd·de + ki·ie) · max_angle`, the same shape a
/// trained linear policy takes, so fitted weight vectors drop in directly.
#[derive(Debug, Clone)]
pub struct AxisPid {
    pub kp: f64,
    pub kd: f64,
    pub ki: f64,
    error_scaling: f64,
    d_error_scaling: f64,
    integral_error_scaling: f64,
    max_angle: f64,
}

impl AxisPid {
    pub fn new(kp: f64, kd: f64, ki: f64, config: &PlantConfig) -> Self {
        Self {
            kp,
            kd,
            ki,
            error_scaling: config.ball_error_scaling,
            d_error_scaling: config.ball_d_error_scaling,
            integral_error_scaling: config.ball_integral_error_scaling,
            max_angle: config.max_angle,
        }
    }
}

impl AxisController for AxisPid {
    fn step(&mut self, error: f64, d_error: f64, integral_error: f64) -> f64 {
        let z = self.kp * error * self.error_scaling
            + self.kd * d_error * self.d_error_scaling
            + self.ki * integral_error * self.integral_error_scaling;
        z.tanh() * self.max_angle
    }

    fn name(&self) -> &str {
        "AxisPid"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
