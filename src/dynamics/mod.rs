pub mod motor;
pub mod ball;

pub use motor::{LearnedMotor, Motor, MotorModel, PhysicalMotor};
pub use ball::{Ball, Ball1d};
