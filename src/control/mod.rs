pub mod controller;
pub mod pid;
pub mod policy;

pub use controller::{AxisController, Policy};
pub use pid::{AxisPid, MotorPid};
pub use policy::{LinearPolicy, MlpPolicy, WeightCountMismatch};
