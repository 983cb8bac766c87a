// ---------------------------------------------------------------------------
// Controller capability traits
// ---------------------------------------------------------------------------

/// Vector-valued policy: maps a (scaled) observation to an action vector.
///
/// Implement this for black-box controllers driven by the environment or
/// the benchmark: trained nets, hand-wired linear maps, anything that
/// consumes the full observation at once.
pub trait Policy {
    /// Compute the action for the given observation.
    fn act(&mut self, observation: &[f64]) -> Vec<f64>;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Scalar per-axis controller: maps one axis' error triplet to a command.
///
/// This is the PID-shaped capability; the benchmark calls it once per
/// axis per sample. The call site picks which of the two capabilities it
/// drives; nothing probes for them at runtime.
pub trait AxisController {
    /// Compute the command from the error, its derivative and its integral.
    fn step(&mut self, error: f64, d_error: f64, integral_error: f64) -> f64;

    /// Reset internal state, if any.
    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "unnamed"
    }
}
