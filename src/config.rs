use std::fmt;
use std::fs;
use std::path::Path;

use nalgebra::{SMatrix, Vector2};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Plant configuration: timestep, bounds, observation scaling
// ---------------------------------------------------------------------------

/// Fixed constants shared by every component of the simulation.
///
/// The timestep `dt` must match the sampling rate the physical
/// coefficients were calibrated at; changing one without the other
/// invalidates the discrete models.
#[derive(Debug, Clone)]
pub struct PlantConfig {
    /// Simulation timestep, s.
    pub dt: f64,
    /// Outer-loop command angle limit, deg.
    pub max_angle: f64,
    /// Motor drive voltage limit, V.
    pub max_motor_u: f64,
    /// Half plate width, the nominal ball position bound, m.
    pub max_x: f64,
    /// Divisor applied to motor speed before it enters the motor model.
    pub speed_scaling: f64,
    /// Period of the double-EMA position filter (alpha = 2 / (1 + period)).
    pub filtering_period: f64,
    /// Anti-windup clamp on the observation integral term, m·s.
    pub ball_max_integral: f64,
    /// Scaling applied to the error component of the observation.
    pub ball_error_scaling: f64,
    /// Scaling applied to the error-derivative component of the observation.
    pub ball_d_error_scaling: f64,
    /// Scaling applied to the integral component of the observation.
    pub ball_integral_error_scaling: f64,
    /// Ball position beyond which an episode terminates as diverged, m.
    pub escape_bound: f64,
    /// Steps between independent re-randomizations of each axis target.
    pub target_hold_steps: u32,
    /// Episode length bound.
    pub max_iter: u32,
}

impl Default for PlantConfig {
    fn default() -> Self {
        let dt = 0.007;
        let max_x = 0.1;
        Self {
            dt,
            max_angle: 25.0,
            max_motor_u: 10.0,
            max_x,
            speed_scaling: 100.0,
            filtering_period: 10.0,
            ball_max_integral: max_x / 2.0,
            ball_error_scaling: 5.0,
            ball_d_error_scaling: 50.0,
            ball_integral_error_scaling: 20.0,
            escape_bound: 2.0 * max_x,
            target_hold_steps: 200,
            max_iter: (10.0 / dt) as u32,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors raised while loading calibrated coefficient data.
/// All of these are fatal at startup; nothing retries mid-simulation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io { path: String, source: String },
    Parse { source: String },
    Shape { what: String, expected: usize, got: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read coefficient file '{}': {}", path, source)
            }
            ConfigError::Parse { source } => {
                write!(f, "failed to parse coefficient JSON: {}", source)
            }
            ConfigError::Shape { what, expected, got } => {
                write!(f, "{}: expected {} entries, got {}", what, expected, got)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Ball dynamics coefficients
// ---------------------------------------------------------------------------

/// On-disk form of the ball coefficients. The matrix is stored unscaled
/// next to the calibration scaling factors and pre-multiplied at load time.
#[derive(Debug, Deserialize)]
struct BallFile {
    phy_i_coef: Vec<Vec<f64>>,
    phy_i_bias: Vec<f64>,
    s_scaling: f64,
    sin_scaling: f64,
}

/// Discrete ball model coefficients, pre-scaled and ready to use:
/// `velocity' = velocity + a · [vx, vy, sin(ax), sin(ay)] + b`.
#[derive(Debug, Clone)]
pub struct BallCoefficients {
    /// Velocity-update matrix. Columns 0–1 act on velocity, 2–3 on the
    /// sine of the plate angles.
    pub a: SMatrix<f64, 2, 4>,
    /// Velocity-update bias.
    pub b: Vector2<f64>,
    /// Optional position saturation. The plant runs unclamped by default;
    /// this stays `None` unless a caller opts in.
    pub position_bound: Option<f64>,
}

impl BallCoefficients {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: BallFile = serde_json::from_str(json)
            .map_err(|e| ConfigError::Parse { source: e.to_string() })?;

        if raw.phy_i_coef.len() != 2 {
            return Err(ConfigError::Shape {
                what: "ball coefficient rows".into(),
                expected: 2,
                got: raw.phy_i_coef.len(),
            });
        }
        for row in &raw.phy_i_coef {
            if row.len() != 4 {
                return Err(ConfigError::Shape {
                    what: "ball coefficient columns".into(),
                    expected: 4,
                    got: row.len(),
                });
            }
        }
        if raw.phy_i_bias.len() != 2 {
            return Err(ConfigError::Shape {
                what: "ball bias".into(),
                expected: 2,
                got: raw.phy_i_bias.len(),
            });
        }

        let mut a = SMatrix::<f64, 2, 4>::zeros();
        for i in 0..2 {
            for j in 0..4 {
                // Velocity columns carry the speed scaling, sine columns
                // the tilt scaling, exactly as calibrated.
                let scale = if j < 2 { raw.s_scaling } else { raw.sin_scaling };
                a[(i, j)] = raw.phy_i_coef[i][j] * scale;
            }
        }
        let b = Vector2::new(raw.phy_i_bias[0], raw.phy_i_bias[1]);

        Ok(Self { a, b, position_bound: None })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_file(path.as_ref())?)
    }

    /// Extract the single-axis model for `axis` (0 = x, 1 = y):
    /// velocity coefficient, sine coefficient, bias.
    pub fn axis(&self, axis: usize) -> ([f64; 2], f64) {
        ([self.a[(axis, axis)], self.a[(axis, 2 + axis)]], self.b[axis])
    }
}

impl Default for BallCoefficients {
    /// Calibrated defaults for the reference platform: 0.2 m plate,
    /// rolling ball (7/5 inertia factor), sampled at 7 ms. Positive
    /// tilt rolls the ball toward negative position.
    fn default() -> Self {
        let mut a = SMatrix::<f64, 2, 4>::zeros();
        a[(0, 0)] = -0.005;
        a[(1, 1)] = -0.005;
        a[(0, 2)] = -0.04905;
        a[(1, 3)] = -0.04905;
        Self { a, b: Vector2::zeros(), position_bound: None }
    }
}

// ---------------------------------------------------------------------------
// Motor dynamics coefficients
// ---------------------------------------------------------------------------

/// Linear motor model coefficients:
/// `speed' = u_coef · u + s_coef · speed / speed_scaling`.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorCoefficients {
    pub u_coef: f64,
    pub s_coef: f64,
}

impl MotorCoefficients {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse { source: e.to_string() })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_file(path.as_ref())?)
    }
}

impl Default for MotorCoefficients {
    /// First-order servo lag (K = 1.53 rad/V·s, tau = 24.8 ms)
    /// discretized at 7 ms, with speed in deg/s scaled by 100.
    fn default() -> Self {
        Self { u_coef: 24.74, s_coef: 71.77 }
    }
}

/// Weights of the learned motor model: one hidden ReLU layer over the
/// normalized `(u, speed)` pair, linear output.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorNetCoefficients {
    pub w1: Vec<Vec<f64>>,
    pub b1: Vec<f64>,
    pub w2: Vec<f64>,
    pub b2: f64,
}

impl MotorNetCoefficients {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::Parse { source: e.to_string() })?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_file(path.as_ref())?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let hidden = self.w1.len();
        for row in &self.w1 {
            if row.len() != 2 {
                return Err(ConfigError::Shape {
                    what: "motor net input width".into(),
                    expected: 2,
                    got: row.len(),
                });
            }
        }
        if self.b1.len() != hidden {
            return Err(ConfigError::Shape {
                what: "motor net hidden bias".into(),
                expected: hidden,
                got: self.b1.len(),
            });
        }
        if self.w2.len() != hidden {
            return Err(ConfigError::Shape {
                what: "motor net output weights".into(),
                expected: hidden,
                got: self.w2.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inner-loop PID gains
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PidFile {
    weights: Vec<f64>,
    bias: f64,
}

/// Gain vector of the inner motor-angle PID.
#[derive(Debug, Clone)]
pub struct PidGains {
    /// [kp, kd, ki] applied to [error, d_error, i_error].
    pub weights: [f64; 3],
    pub bias: f64,
}

impl PidGains {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: PidFile = serde_json::from_str(json)
            .map_err(|e| ConfigError::Parse { source: e.to_string() })?;
        if raw.weights.len() != 3 {
            return Err(ConfigError::Shape {
                what: "pid weights".into(),
                expected: 3,
                got: raw.weights.len(),
            });
        }
        Ok(Self {
            weights: [raw.weights[0], raw.weights[1], raw.weights[2]],
            bias: raw.bias,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_file(path.as_ref())?)
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self { weights: [0.1, 0.001, 0.01], bias: 0.0 }
    }
}

// ---------------------------------------------------------------------------
// Calibration bundle
// ---------------------------------------------------------------------------

/// Everything the plant needs, loaded once and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    pub ball: BallCoefficients,
    pub motor: MotorCoefficients,
    pub pid: PidGains,
}

impl Calibration {
    /// Load `ball.json`, `motor.json` and `motor_pid.json` from a directory.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        Ok(Self {
            ball: BallCoefficients::from_file(dir.join("ball.json"))?,
            motor: MotorCoefficients::from_file(dir.join("motor.json"))?,
            pid: PidGains::from_file(dir.join("motor_pid.json"))?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_coefficients_prescaled_on_load() {
        let json = r#"{
            "phy_i_coef": [[1.0, 0.0, 2.0, 0.0], [0.0, 1.0, 0.0, 2.0]],
            "phy_i_bias": [0.1, -0.1],
            "s_scaling": 0.5,
            "sin_scaling": 0.25
        }"#;
        let c = BallCoefficients::from_json_str(json).unwrap();
        assert!((c.a[(0, 0)] - 0.5).abs() < 1e-12, "velocity column scaled by s_scaling");
        assert!((c.a[(0, 2)] - 0.5).abs() < 1e-12, "sine column scaled by sin_scaling");
        assert!((c.b[0] - 0.1).abs() < 1e-12);
        assert!(c.position_bound.is_none());
    }

    #[test]
    fn ball_row_count_mismatch_is_fatal() {
        let json = r#"{
            "phy_i_coef": [[1.0, 0.0, 2.0, 0.0]],
            "phy_i_bias": [0.1, -0.1],
            "s_scaling": 1.0,
            "sin_scaling": 1.0
        }"#;
        let err = BallCoefficients::from_json_str(json).unwrap_err();
        match err {
            ConfigError::Shape { expected, got, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected shape error, got {other}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = MotorCoefficients::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn pid_weight_count_checked() {
        let err = PidGains::from_json_str(r#"{"weights": [1.0, 2.0], "bias": 0.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Shape { expected: 3, got: 2, .. }));
    }

    #[test]
    fn axis_extraction_picks_diagonal_terms() {
        let ball = BallCoefficients::default();
        let ([s, sin], b) = ball.axis(1);
        assert!((s - ball.a[(1, 1)]).abs() < 1e-12);
        assert!((sin - ball.a[(1, 3)]).abs() < 1e-12);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn motor_net_shape_validated() {
        let json = r#"{
            "w1": [[0.1, 0.2], [0.3, 0.4]],
            "b1": [0.0],
            "w2": [1.0, -1.0],
            "b2": 0.0
        }"#;
        let err = MotorNetCoefficients::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Shape { expected: 2, got: 1, .. }));
    }
}
