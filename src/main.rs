use balancer_sim::config::{Calibration, PlantConfig};
use balancer_sim::control::AxisPid;
use balancer_sim::io;
use balancer_sim::sim::{
    ActionMode, AxisCount, BalancerEnv, BenchmarkEvaluator, Reward, RewardKind, TargetGen,
    Termination,
};

fn main() {
    // -----------------------------------------------------------------------
    // Plant: two-axis balancing platform, default bench calibration
    // -----------------------------------------------------------------------
    let calibration = Calibration::default();
    let config = PlantConfig::default();

    let kp = 1.0;
    let kd = 0.2;
    let ki = 0.1;
    let mut pid = AxisPid::new(kp, kd, ki, &config);

    // -----------------------------------------------------------------------
    // Benchmark over a seeded random-walk target trajectory
    // -----------------------------------------------------------------------
    let n_samples = 1428;
    let targets = TargetGen::new(&config, 42).trajectory(n_samples);
    let mut bench = BenchmarkEvaluator::new(&calibration, config.clone());
    let run = bench.simulate_axis(&mut pid, &targets);

    let rms_error = (run.error.iter().map(|e| e.norm_squared()).sum::<f64>()
        / run.error.len() as f64)
        .sqrt();
    let max_error = run.error.iter().map(|e| e.norm()).fold(0.0_f64, f64::max);
    let max_command = run
        .command
        .iter()
        .map(|u| u.x.abs().max(u.y.abs()))
        .fold(0.0_f64, f64::max);

    println!();
    println!("====================================================================");
    println!("  BALL BALANCER SIMULATION — cascaded PID benchmark");
    println!("====================================================================");
    println!();
    println!("  Plant Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Time step:       {:>8.4} s    Plate limit:   {:>6.1} deg",
        config.dt, config.max_angle
    );
    println!(
        "  Plate radius:    {:>8.3} m    Drive limit:   {:>6.1} V",
        config.max_x, config.max_motor_u
    );
    println!(
        "  Filter period:   {:>8} ticks  Escape bound:  {:>6.3} m",
        config.filtering_period, config.escape_bound
    );
    println!(
        "  Ball PID:        kp={:.2}  kd={:.2}  ki={:.2}",
        kp, kd, ki
    );
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Fitness:       {:>12.6}   (-mean squared error)", run.loss);
    println!(
        "  RMS error:     {:>12.2} mm   Max error:  {:>8.2} mm",
        rms_error * 1000.0,
        max_error * 1000.0
    );
    println!(
        "  Max command:   {:>12.2} deg  Duration:   {:>8.2} s",
        max_command,
        n_samples as f64 * config.dt
    );
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>9}  {:>9}  {:>8}",
        "t (s)", "tgt_x(mm)", "pos_x(mm)", "tgt_y(mm)", "pos_y(mm)", "cmd(deg)"
    );
    println!("  {}", "─".repeat(60));

    let sample_interval = (n_samples / 25).max(1);
    for i in (0..n_samples).step_by(sample_interval) {
        println!(
            "  {:>7.2}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9.2}  {:>8.2}",
            i as f64 * config.dt,
            run.target[i].x * 1000.0,
            run.trajectory[i].x * 1000.0,
            run.target[i].y * 1000.0,
            run.trajectory[i].y * 1000.0,
            run.command[i].x,
        );
    }
    println!();

    if let Err(e) = io::write_benchmark_file("benchmark.csv", &run, config.dt) {
        eprintln!("  warning: could not write benchmark.csv: {e}");
    } else {
        println!("  Full trajectory written to benchmark.csv");
    }

    // -----------------------------------------------------------------------
    // Training-environment episode with the same gains as a constant action
    // -----------------------------------------------------------------------
    let mut env = BalancerEnv::new(
        &calibration,
        config.clone(),
        AxisCount::Two,
        ActionMode::PidWeights,
        Reward::new(RewardKind::Linear, 0.1),
    );
    let action = [kp, kp, kd, kd, ki, ki];

    env.reset(Some(7));
    let mut total_reward = 0.0;
    let mut steps = 0usize;
    let termination = loop {
        match env.step(&action) {
            Ok(step) => {
                total_reward += step.reward;
                steps += 1;
                if step.done {
                    break step.info.termination;
                }
            }
            Err(e) => {
                eprintln!("  episode aborted: {e}");
                return;
            }
        }
    };

    println!();
    println!("  Training Episode (seed 7, gains as constant action)");
    println!("  ──────────────────────────────────────────────────────────────────");
    let outcome = match termination {
        Some(Termination::MaxIter) => "survived full episode",
        Some(Termination::Diverged) => "ball escaped the plate",
        None => "unterminated",
    };
    println!("  Steps:         {:>8}       Outcome: {}", steps, outcome);
    println!(
        "  Return:        {:>12.3}   Mean reward: {:>8.4}",
        total_reward,
        total_reward / steps.max(1) as f64
    );
    println!();
    println!("====================================================================");
    println!();
}
