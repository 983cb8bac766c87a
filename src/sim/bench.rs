use nalgebra::Vector2;

use crate::config::{Calibration, PlantConfig};
use crate::control::{AxisController, Policy};
use crate::dynamics::Motor;
use crate::sim::env::StepError;
use crate::sim::plant::PlantSim;

// ---------------------------------------------------------------------------
// Aggregate fitness
// ---------------------------------------------------------------------------

/// Negative mean squared error norm. Sign convention: higher is better,
/// so the value plugs straight into a fitness-maximizing optimizer.
fn position_loss(error: &[Vector2<f64>]) -> f64 {
    let n = error.len().max(1) as f64;
    -error.iter().map(|e| e.norm_squared()).sum::<f64>() / n
}

/// Negative RMS error for single-channel (motor) evaluation.
fn rms_loss(error: &[f64]) -> f64 {
    let n = error.len().max(1) as f64;
    -(error.iter().map(|e| e * e).sum::<f64>() / n).sqrt()
}

// ---------------------------------------------------------------------------
// Recorded runs
// ---------------------------------------------------------------------------

/// Every intermediate quantity of one benchmark run, for offline analysis.
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub target: Vec<Vector2<f64>>,
    /// Ball position at each sample.
    pub trajectory: Vec<Vector2<f64>>,
    /// Tracking error (position − target) at each sample.
    pub error: Vec<Vector2<f64>>,
    /// Commanded plate angle, deg.
    pub command: Vec<Vector2<f64>>,
    /// Realized motor angle, deg.
    pub angle: Vec<Vector2<f64>>,
    pub loss: f64,
}

/// A benchmark run of a gain-scheduling policy, with the per-step gains
/// it emitted recorded alongside the trajectory.
#[derive(Debug, Clone)]
pub struct PidBenchmarkRun {
    pub run: BenchmarkRun,
    pub kp: Vec<Vector2<f64>>,
    pub kd: Vec<Vector2<f64>>,
    pub ki: Vec<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// Ball benchmark
// ---------------------------------------------------------------------------

/// Drives a controller across a fixed reference trajectory.
///
/// Unlike the training environment there are no stochastic resets and no
/// target perturbation: every run starts from the zero state, so two runs
/// with the same controller weights are bit-identical.
pub struct BenchmarkEvaluator {
    plant: PlantSim,
    config: PlantConfig,
}

struct AxisSeries {
    error: Vector2<f64>,
    integral: Vector2<f64>,
}

impl BenchmarkEvaluator {
    pub fn new(calibration: &Calibration, config: PlantConfig) -> Self {
        Self { plant: PlantSim::new(calibration, &config), config }
    }

    fn start(&mut self, targets: &[Vector2<f64>]) -> (BenchmarkRun, AxisSeries) {
        self.plant.reset();
        let len = targets.len();
        let zero = vec![Vector2::zeros(); len];
        let mut run = BenchmarkRun {
            target: targets.to_vec(),
            trajectory: zero.clone(),
            error: zero.clone(),
            command: zero.clone(),
            angle: zero,
            loss: 0.0,
        };
        // Sample 0: ball at the center, so the error is minus the target.
        let error0 = if len > 0 { -targets[0] } else { Vector2::zeros() };
        if len > 0 {
            run.error[0] = error0;
        }
        let series = AxisSeries { error: error0, integral: error0 * self.config.dt };
        (run, series)
    }

    /// Record the pre-step quantities for sample `i`; returns the error
    /// triplets [e, de, ie] for both axes.
    fn observe(
        &mut self,
        run: &mut BenchmarkRun,
        s: &mut AxisSeries,
        i: usize,
    ) -> [[f64; 3]; 2] {
        let pos = self.plant.ball.pos;
        run.trajectory[i] = pos;

        let error = pos - run.target[i];
        let d_error = (error - s.error) / self.config.dt;
        s.integral += error * self.config.dt;
        let clamp = self.config.ball_max_integral;
        s.integral.x = s.integral.x.clamp(-clamp, clamp);
        s.integral.y = s.integral.y.clamp(-clamp, clamp);
        s.error = error;

        run.error[i] = error;
        run.angle[i] = Vector2::new(self.plant.motor_x.angle, self.plant.motor_y.angle);

        [
            [error.x, d_error.x, s.integral.x],
            [error.y, d_error.y, s.integral.y],
        ]
    }

    fn scaled_obs(&self, triplets: &[[f64; 3]; 2]) -> [f64; 6] {
        let c = &self.config;
        [
            triplets[0][0] * c.ball_error_scaling,
            triplets[1][0] * c.ball_error_scaling,
            triplets[0][1] * c.ball_d_error_scaling,
            triplets[1][1] * c.ball_d_error_scaling,
            triplets[0][2] * c.ball_integral_error_scaling,
            triplets[1][2] * c.ball_integral_error_scaling,
        ]
    }

    /// Benchmark a per-axis PID-style controller. The controller sees raw
    /// error triplets and returns a command angle per axis.
    pub fn simulate_axis(
        &mut self,
        controller: &mut dyn AxisController,
        targets: &[Vector2<f64>],
    ) -> BenchmarkRun {
        let (mut run, mut series) = self.start(targets);
        controller.reset();
        for i in 1..targets.len() {
            let t = self.observe(&mut run, &mut series, i);
            let u = Vector2::new(
                controller.step(t[0][0], t[0][1], t[0][2]),
                controller.step(t[1][0], t[1][1], t[1][2]),
            );
            run.command[i] = u;
            self.plant.step(u);
        }
        run.loss = position_loss(&run.error);
        run
    }

    /// Benchmark a vector policy over the scaled 6-dim observation.
    /// Actions are in [-1, 1] and scale to the plate angle limit.
    pub fn simulate_policy(
        &mut self,
        policy: &mut dyn Policy,
        targets: &[Vector2<f64>],
    ) -> Result<BenchmarkRun, StepError> {
        let (mut run, mut series) = self.start(targets);
        for i in 1..targets.len() {
            let t = self.observe(&mut run, &mut series, i);
            let action = policy.act(&self.scaled_obs(&t));
            if action.len() != 2 {
                return Err(StepError::DimensionMismatch { expected: 2, got: action.len() });
            }
            let u = Vector2::new(action[0], action[1]) * self.config.max_angle;
            run.command[i] = u;
            self.plant.step(u);
        }
        run.loss = position_loss(&run.error);
        Ok(run)
    }

    /// Benchmark a gain-scheduling policy: it emits per-axis {kp, kd, ki}
    /// weights each step, and the command angle is the weighted, scaled
    /// observation through a tanh. Records the gain time series.
    pub fn simulate_pid_policy(
        &mut self,
        policy: &mut dyn Policy,
        targets: &[Vector2<f64>],
    ) -> Result<PidBenchmarkRun, StepError> {
        let (mut run, mut series) = self.start(targets);
        let len = targets.len();
        let mut kp = vec![Vector2::zeros(); len];
        let mut kd = vec![Vector2::zeros(); len];
        let mut ki = vec![Vector2::zeros(); len];

        for i in 1..len {
            let t = self.observe(&mut run, &mut series, i);
            let sobs = self.scaled_obs(&t);
            let w = policy.act(&sobs);
            if w.len() != 6 {
                return Err(StepError::DimensionMismatch { expected: 6, got: w.len() });
            }
            kp[i] = Vector2::new(w[0], w[1]);
            kd[i] = Vector2::new(w[2], w[3]);
            ki[i] = Vector2::new(w[4], w[5]);

            let mut u = Vector2::zeros();
            for axis in 0..2 {
                let z: f64 = (0..3).map(|k| w[k * 2 + axis] * sobs[k * 2 + axis]).sum();
                u[axis] = z.tanh() * self.config.max_angle;
            }
            run.command[i] = u;
            self.plant.step(u);
        }
        run.loss = position_loss(&run.error);
        Ok(PidBenchmarkRun { run, kp, kd, ki })
    }

    /// Scalar fitness of an axis controller over the trajectory.
    pub fn evaluate(
        &mut self,
        controller: &mut dyn AxisController,
        targets: &[Vector2<f64>],
    ) -> f64 {
        self.simulate_axis(controller, targets).loss
    }
}

// ---------------------------------------------------------------------------
// Motor benchmark
// ---------------------------------------------------------------------------

/// Recorded motor-only run.
#[derive(Debug, Clone)]
pub struct MotorRun {
    pub trajectory: Vec<f64>,
    pub error: Vec<f64>,
    pub command: Vec<f64>,
    pub loss: f64,
}

/// Drives one motor (no ball) across an angle trajectory, used to fit
/// and verify inner-loop controllers in isolation.
pub struct MotorEvaluator {
    motor: Motor,
    dt: f64,
}

impl MotorEvaluator {
    pub fn new(calibration: &Calibration, config: &PlantConfig) -> Self {
        Self { motor: Motor::physical(calibration.motor.clone(), config), dt: config.dt }
    }

    pub fn with_motor(motor: Motor, config: &PlantConfig) -> Self {
        Self { motor, dt: config.dt }
    }

    /// Run the controller over the target angle trajectory. The error
    /// convention here is `target − angle` and the integral is unclamped,
    /// matching the inner loop the controller will actually serve.
    pub fn simulate(
        &mut self,
        controller: &mut dyn AxisController,
        targets: &[f64],
    ) -> MotorRun {
        self.motor.reset();
        controller.reset();
        let len = targets.len();
        let mut run = MotorRun {
            trajectory: vec![0.0; len],
            error: vec![0.0; len],
            command: vec![0.0; len],
            loss: 0.0,
        };
        if len == 0 {
            return run;
        }

        run.error[0] = targets[0];
        let mut integral = run.error[0] * self.dt;
        for i in 1..len {
            run.trajectory[i] = self.motor.angle;
            run.error[i] = targets[i] - self.motor.angle;
            let d_error = (run.error[i] - run.error[i - 1]) / self.dt;
            integral += run.error[i] * self.dt;

            run.command[i] = controller.step(run.error[i], d_error, integral);
            self.motor.step(run.command[i]);
        }
        run.loss = rms_loss(&run.error);
        run
    }

    pub fn evaluate(&mut self, controller: &mut dyn AxisController, targets: &[f64]) -> f64 {
        self.simulate(controller, targets).loss
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{AxisPid, LinearPolicy, MlpPolicy};
    use crate::sim::target::TargetGen;

    fn setup() -> (Calibration, PlantConfig) {
        (Calibration::default(), PlantConfig::default())
    }

    #[test]
    fn identical_runs_are_bit_identical() {
        let (cal, config) = setup();
        let targets = TargetGen::new(&config, 42).trajectory(400);
        let mut bench = BenchmarkEvaluator::new(&cal, config.clone());
        let mut pid_a = AxisPid::new(1.0, 0.2, 0.1, &config);
        let mut pid_b = AxisPid::new(1.0, 0.2, 0.1, &config);
        let a = bench.simulate_axis(&mut pid_a, &targets);
        let b = bench.simulate_axis(&mut pid_b, &targets);
        assert_eq!(a.trajectory, b.trajectory, "Benchmark must be deterministic");
        assert_eq!(a.command, b.command);
        assert_eq!(a.loss, b.loss);
    }

    #[test]
    fn pid_beats_no_control() {
        let (cal, config) = setup();
        let targets = TargetGen::new(&config, 7).trajectory(800);
        let mut bench = BenchmarkEvaluator::new(&cal, config.clone());
        let mut pid = AxisPid::new(1.0, 0.2, 0.1, &config);
        let mut idle = AxisPid::new(0.0, 0.0, 0.0, &config);
        let controlled = bench.evaluate(&mut pid, &targets);
        let uncontrolled = bench.evaluate(&mut idle, &targets);
        assert!(
            controlled > uncontrolled,
            "PID ({controlled}) should out-score no control ({uncontrolled})"
        );
    }

    #[test]
    fn loss_is_never_positive() {
        let (cal, config) = setup();
        let targets = TargetGen::new(&config, 3).trajectory(200);
        let mut bench = BenchmarkEvaluator::new(&cal, config.clone());
        let mut pid = AxisPid::new(0.5, 0.1, 0.05, &config);
        assert!(bench.evaluate(&mut pid, &targets) <= 0.0);
    }

    #[test]
    fn policy_action_length_checked() {
        let (cal, config) = setup();
        let targets = TargetGen::new(&config, 1).trajectory(10);
        let mut bench = BenchmarkEvaluator::new(&cal, config);
        // 3 outputs where the 2-axis benchmark expects 2.
        let mut bad = LinearPolicy::new(3, 6);
        let err = bench.simulate_policy(&mut bad, &targets).unwrap_err();
        assert!(matches!(err, StepError::DimensionMismatch { expected: 2, got: 3 }));
    }

    #[test]
    fn pid_policy_records_gain_series() {
        let (cal, config) = setup();
        let targets = TargetGen::new(&config, 5).trajectory(50);
        let mut bench = BenchmarkEvaluator::new(&cal, config);
        let mut policy = MlpPolicy::new(6, 4, 6);
        let out = bench.simulate_pid_policy(&mut policy, &targets).unwrap();
        assert_eq!(out.kp.len(), targets.len());
        // Zero policy emits zero gains and zero commands everywhere.
        assert!(out.kp.iter().all(|g| *g == Vector2::zeros()));
        assert!(out.run.command.iter().all(|u| *u == Vector2::zeros()));
    }

    #[test]
    fn motor_evaluator_tracks_step_target() {
        let (cal, config) = setup();
        let targets: Vec<f64> = vec![30.0; 1200];
        let mut bench = MotorEvaluator::new(&cal, &config);
        let mut pid = crate::control::MotorPid::new(crate::config::PidGains::default(), &config);
        let run = bench.simulate(&mut pid, &targets);
        let settled = run.trajectory.last().unwrap();
        assert!(
            (settled - 30.0).abs() < 3.0,
            "Motor should settle near 30 deg, got {settled}"
        );
        assert!(run.loss < 0.0);
    }

    #[test]
    fn motor_loss_is_negative_rms() {
        let (cal, config) = setup();
        let mut bench = MotorEvaluator::new(&cal, &config);
        // A controller that never acts leaves the full error in place.
        struct Inert;
        impl AxisController for Inert {
            fn step(&mut self, _e: f64, _de: f64, _ie: f64) -> f64 {
                0.0
            }
        }
        let targets = vec![10.0; 100];
        let run = bench.simulate(&mut Inert, &targets);
        assert!((run.loss + 10.0).abs() < 1e-9, "RMS of a constant 10 deg error");
    }
}
