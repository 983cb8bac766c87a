pub mod bench;
pub mod env;
pub mod plant;
pub mod reward;
pub mod target;

pub use bench::{BenchmarkEvaluator, BenchmarkRun, MotorEvaluator, MotorRun, PidBenchmarkRun};
pub use env::{ActionMode, AxisCount, BalancerEnv, StepError, StepInfo, StepResult, Termination};
pub use plant::{PlantSim, PlantSim1d};
pub use reward::{Reward, RewardKind};
pub use target::TargetGen;
