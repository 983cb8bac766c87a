pub mod csv;

pub use csv::{write_benchmark, write_benchmark_file, write_motor_run, write_motor_run_file};
