use nalgebra::{SMatrix, Vector2, Vector4};

use crate::config::{BallCoefficients, PlantConfig};

// ---------------------------------------------------------------------------
// Ball dynamics: discrete state-space model with a sine tilt nonlinearity
// ---------------------------------------------------------------------------

/// Two-axis ball-on-plate model.
///
/// `velocity' = velocity + A · [vx, vy, sin(ax), sin(ay)] + b`
/// `position' = position + velocity' · dt`
///
/// The sine transform maps plate tilt to the gravity component along the
/// plate, the one nonlinearity of the plant. Position and velocity are
/// unclamped unless `position_bound` is set on the coefficients.
pub struct Ball {
    a: SMatrix<f64, 2, 4>,
    b: Vector2<f64>,
    dt: f64,
    position_bound: Option<f64>,
    /// Ball position on the plate, m.
    pub pos: Vector2<f64>,
    /// Ball velocity, m/s.
    pub vel: Vector2<f64>,
}

impl Ball {
    pub fn new(coefs: &BallCoefficients, config: &PlantConfig) -> Self {
        Self {
            a: coefs.a,
            b: coefs.b,
            dt: config.dt,
            position_bound: coefs.position_bound,
            pos: Vector2::zeros(),
            vel: Vector2::zeros(),
        }
    }

    /// Advance one sample given the current plate angles (deg).
    pub fn step(&mut self, angle_x: f64, angle_y: f64) {
        let x = Vector4::new(
            self.vel.x,
            self.vel.y,
            angle_x.to_radians().sin(),
            angle_y.to_radians().sin(),
        );
        self.vel += self.a * x + self.b;
        self.pos += self.vel * self.dt;

        if let Some(bound) = self.position_bound {
            self.pos.x = self.pos.x.clamp(-bound, bound);
            self.pos.y = self.pos.y.clamp(-bound, bound);
        }
    }

    /// Return the ball to the zero state.
    pub fn reset(&mut self) {
        self.pos = Vector2::zeros();
        self.vel = Vector2::zeros();
    }
}

// ---------------------------------------------------------------------------
// Single-axis variant
// ---------------------------------------------------------------------------

/// One-axis ball model: `velocity' = velocity + a·[v, sin(angle)] + b`.
pub struct Ball1d {
    a: [f64; 2],
    b: f64,
    dt: f64,
    position_bound: Option<f64>,
    pub pos: f64,
    pub vel: f64,
}

impl Ball1d {
    /// Build from the x row of the two-axis coefficients.
    pub fn new(coefs: &BallCoefficients, config: &PlantConfig) -> Self {
        let (a, b) = coefs.axis(0);
        Self {
            a,
            b,
            dt: config.dt,
            position_bound: coefs.position_bound,
            pos: 0.0,
            vel: 0.0,
        }
    }

    pub fn step(&mut self, angle: f64) {
        self.vel += self.a[0] * self.vel + self.a[1] * angle.to_radians().sin() + self.b;
        self.pos += self.vel * self.dt;
        if let Some(bound) = self.position_bound {
            self.pos = self.pos.clamp(-bound, bound);
        }
    }

    pub fn reset(&mut self) {
        self.pos = 0.0;
        self.vel = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball() -> Ball {
        Ball::new(&BallCoefficients::default(), &PlantConfig::default())
    }

    #[test]
    fn flat_plate_keeps_ball_still() {
        let mut b = ball();
        for _ in 0..100 {
            b.step(0.0, 0.0);
        }
        assert_eq!(b.pos, Vector2::zeros());
        assert_eq!(b.vel, Vector2::zeros());
    }

    #[test]
    fn positive_tilt_rolls_negative() {
        let mut b = ball();
        for _ in 0..50 {
            b.step(10.0, 0.0);
        }
        assert!(b.pos.x < 0.0, "Default calibration rolls against the tilt");
        assert_eq!(b.pos.y, 0.0, "Axes are independent");
    }

    #[test]
    fn unbounded_by_default() {
        let mut b = ball();
        for _ in 0..5_000 {
            b.step(25.0, 25.0);
        }
        // Far past the plate edge: no saturation unless opted in.
        assert!(b.pos.x.abs() > 0.2);
    }

    #[test]
    fn opt_in_position_bound_saturates() {
        let coefs = BallCoefficients { position_bound: Some(0.1), ..Default::default() };
        let mut b = Ball::new(&coefs, &PlantConfig::default());
        for _ in 0..5_000 {
            b.step(25.0, 25.0);
        }
        assert!(b.pos.x.abs() <= 0.1 + 1e-12);
        assert!(b.pos.y.abs() <= 0.1 + 1e-12);
    }

    #[test]
    fn one_axis_matches_x_axis_of_two_axis_model() {
        let coefs = BallCoefficients::default();
        let config = PlantConfig::default();
        let mut b2 = Ball::new(&coefs, &config);
        let mut b1 = Ball1d::new(&coefs, &config);
        for i in 0..200 {
            let angle = (i as f64 * 0.1).sin() * 15.0;
            b2.step(angle, 0.0);
            b1.step(angle);
        }
        assert!((b1.pos - b2.pos.x).abs() < 1e-12, "1D model is the x row of the 2D model");
    }

    #[test]
    fn reset_zeroes_state() {
        let mut b = ball();
        b.step(20.0, -20.0);
        b.reset();
        assert_eq!(b.pos, Vector2::zeros());
        assert_eq!(b.vel, Vector2::zeros());
    }
}
