pub mod config;
pub mod control;
pub mod dynamics;
pub mod filter;
pub mod io;
pub mod logging;
pub mod sim;

// Convenience re-exports for downstream callers
pub mod types {
    pub use crate::config::{Calibration, PlantConfig};
    pub use crate::control::{AxisController, AxisPid, MotorPid, Policy};
    pub use crate::filter::Dema;
    pub use crate::sim::{
        ActionMode, AxisCount, BalancerEnv, BenchmarkEvaluator, MotorEvaluator, Reward,
        RewardKind, StepResult, TargetGen, Termination,
    };
}
