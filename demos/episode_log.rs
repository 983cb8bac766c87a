use balancer_sim::config::{Calibration, PlantConfig};
use balancer_sim::logging::{FileSink, StepSink};
use balancer_sim::sim::{ActionMode, AxisCount, BalancerEnv, Reward, RewardKind};

/// Rolls one seeded training episode with constant PID-weight actions and
/// streams every step to `episode.jsonl`.
fn main() -> std::io::Result<()> {
    let calibration = Calibration::default();
    let config = PlantConfig::default();

    let mut env = BalancerEnv::new(
        &calibration,
        config,
        AxisCount::Two,
        ActionMode::PidWeights,
        Reward::new(RewardKind::Quadratic, 0.1),
    );
    let action = [1.0, 1.0, 0.2, 0.2, 0.1, 0.1];

    let mut sink = FileSink::create("episode.jsonl")?;
    env.reset(Some(3));

    let mut total = 0.0;
    let mut steps = 0;
    loop {
        let step = match env.step(&action) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("step failed: {e}");
                break;
            }
        };
        total += step.reward;
        steps += 1;
        let done = step.done;
        sink.log_step(&step);
        if done {
            break;
        }
    }
    sink.flush();

    println!("Episode: {} steps, return {:.3}, log in episode.jsonl", steps, total);
    Ok(())
}
