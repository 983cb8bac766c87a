use crate::config::{MotorCoefficients, MotorNetCoefficients, PlantConfig};

// ---------------------------------------------------------------------------
// Motor speed models
// ---------------------------------------------------------------------------

/// Discrete model of the servo speed response.
///
/// Maps the drive voltage and the current (pre-scaled) speed to the speed
/// at the next sample. Implementations are interchangeable behind this
/// trait: the identified linear model, or a net fitted to bench data.
pub trait MotorModel {
    fn next_speed(&self, u: f64, speed_scaled: f64) -> f64;
}

/// Identified linear servo model:
/// `speed' = u_coef · u + s_coef · speed_scaled`.
#[derive(Debug, Clone)]
pub struct PhysicalMotor {
    coefs: MotorCoefficients,
}

impl PhysicalMotor {
    pub fn new(coefs: MotorCoefficients) -> Self {
        Self { coefs }
    }
}

impl MotorModel for PhysicalMotor {
    fn next_speed(&self, u: f64, speed_scaled: f64) -> f64 {
        self.coefs.u_coef * u + self.coefs.s_coef * speed_scaled
    }
}

/// Motor model fitted to measured step responses: one hidden ReLU layer
/// over `(u, speed_scaled)`, linear output.
#[derive(Debug, Clone)]
pub struct LearnedMotor {
    net: MotorNetCoefficients,
}

impl LearnedMotor {
    pub fn new(net: MotorNetCoefficients) -> Self {
        Self { net }
    }
}

impl MotorModel for LearnedMotor {
    fn next_speed(&self, u: f64, speed_scaled: f64) -> f64 {
        let mut out = self.net.b2;
        for (row, (b, w_out)) in self
            .net
            .w1
            .iter()
            .zip(self.net.b1.iter().zip(self.net.w2.iter()))
        {
            let h = (row[0] * u + row[1] * speed_scaled + b).max(0.0);
            out += w_out * h;
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Motor state integration
// ---------------------------------------------------------------------------

/// One servo: a speed model plus the integrated, clamped shaft angle.
pub struct Motor {
    model: Box<dyn MotorModel>,
    dt: f64,
    speed_scaling: f64,
    /// Shaft angle, deg, always within ±180.
    pub angle: f64,
    /// Shaft speed, deg/s.
    pub speed: f64,
}

impl Motor {
    pub fn new(model: Box<dyn MotorModel>, config: &PlantConfig) -> Self {
        Self {
            model,
            dt: config.dt,
            speed_scaling: config.speed_scaling,
            angle: 0.0,
            speed: 0.0,
        }
    }

    pub fn physical(coefs: MotorCoefficients, config: &PlantConfig) -> Self {
        Self::new(Box::new(PhysicalMotor::new(coefs)), config)
    }

    pub fn learned(net: MotorNetCoefficients, config: &PlantConfig) -> Self {
        Self::new(Box::new(LearnedMotor::new(net)), config)
    }

    /// Advance one sample under drive voltage `u`.
    pub fn step(&mut self, u: f64) {
        self.speed = self.model.next_speed(u, self.speed / self.speed_scaling);
        self.angle = (self.angle + self.speed * self.dt).clamp(-180.0, 180.0);
    }

    /// Return the motor to the zero state.
    pub fn reset(&mut self) {
        self.angle = 0.0;
        self.speed = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
