use balancer_sim::config::{Calibration, PlantConfig};
use balancer_sim::control::{AxisController, AxisPid};
use balancer_sim::sim::{BenchmarkEvaluator, TargetGen};

/// A bang-bang controller: tilt the plate a fixed amount against the sign
/// of the error, with a deadband around the target.
struct BangBangController {
    tilt: f64,
    deadband: f64,
}

impl AxisController for BangBangController {
    fn step(&mut self, error: f64, _d_error: f64, _integral_error: f64) -> f64 {
        if error.abs() < self.deadband {
            0.0
        } else if error > 0.0 {
            self.tilt
        } else {
            -self.tilt
        }
    }

    fn name(&self) -> &str {
        "BangBang"
    }
}

fn main() {
    let calibration = Calibration::default();
    let config = PlantConfig::default();

    let targets = TargetGen::new(&config, 42).trajectory(1428);
    let mut bench = BenchmarkEvaluator::new(&calibration, config.clone());

    let mut bang = BangBangController { tilt: 5.0, deadband: 0.005 };
    let mut pid = AxisPid::new(1.0, 0.2, 0.1, &config);

    println!("Benchmarking {} controller...", bang.name());
    let bang_run = bench.simulate_axis(&mut bang, &targets);
    println!("Benchmarking {} controller...", pid.name());
    let pid_run = bench.simulate_axis(&mut pid, &targets);

    println!();
    println!("Fitness ({}): {:>12.6}", "BangBang", bang_run.loss);
    println!("Fitness ({}): {:>12.6}", "AxisPid", pid_run.loss);
    println!(
        "PID improvement: {:.1}%",
        (1.0 - pid_run.loss.abs() / bang_run.loss.abs()) * 100.0
    );
}
