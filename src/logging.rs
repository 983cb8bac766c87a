//! Telemetry sinks for episode runs.
//!
//! - `StepSink`: trait the environment driver feeds each step into
//! - `NoopSink`: discards everything
//! - `FileSink`: one JSON object per step, for offline analysis

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::sim::StepResult;

/// Abstract sink for per-step telemetry.
pub trait StepSink {
    fn log_step(&mut self, step: &StepResult);

    /// Force buffered output to disk. Default is a no-op.
    fn flush(&mut self) {}
}

/// Sink that discards all steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StepSink for NoopSink {
    fn log_step(&mut self, _step: &StepResult) {}
}

/// JSONL file sink: each step is one JSON object on its own line.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: BufWriter::new(file) })
    }
}

impl StepSink for FileSink {
    fn log_step(&mut self, step: &StepResult) {
        // A failed write should never take the episode down with it.
        if let Ok(line) = serde_json::to_string(step) {
            let _ = self.writer.write_all(line.as_bytes());
            let _ = self.writer.write_all(b"\n");
        }
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

/// In-memory sink, handy in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub steps: Vec<StepResult>,
}

impl StepSink for MemorySink {
    fn log_step(&mut self, step: &StepResult) {
        self.steps.push(step.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Calibration, PlantConfig};
    use crate::sim::{ActionMode, AxisCount, BalancerEnv, Reward, RewardKind};

    fn one_step() -> StepResult {
        let mut env = BalancerEnv::new(
            &Calibration::default(),
            PlantConfig::default(),
            AxisCount::Two,
            ActionMode::DirectAngle,
            Reward::new(RewardKind::Linear, 0.1),
        );
        env.reset(Some(1));
        env.step(&[0.0, 0.0]).unwrap()
    }

    #[test]
    fn file_sink_writes_one_line_per_step() {
        let path = std::env::temp_dir().join("balancer_sink_test.jsonl");
        let step = one_step();
        {
            let mut sink = FileSink::create(&path).unwrap();
            sink.log_step(&step);
            sink.log_step(&step);
            sink.flush();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert!(parsed.get("reward").is_some(), "Each line is a full step record");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn memory_sink_collects_steps() {
        let mut sink = MemorySink::default();
        sink.log_step(&one_step());
        assert_eq!(sink.steps.len(), 1);
    }
}
