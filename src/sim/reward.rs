use crate::config::PlantConfig;

// ---------------------------------------------------------------------------
// Reward shaping
// ---------------------------------------------------------------------------

/// Tracking-error term of the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    /// Mean absolute error, normalized by the plate half-width.
    Linear,
    /// Mean squared normalized error; punishes large excursions harder.
    Quadratic,
    /// Error-derivative shaping: rewards moving toward the target now,
    /// rather than being close to it. Denser early-training signal than
    /// the distance terms.
    Derivative,
}

/// Reward function: a tracking term plus an optional actuation penalty,
/// squashed so every variant stays within [-1, 1].
///
/// `reward = -tanh(tracking + weight · mean(|angle| / max_angle))`
///
/// The penalty trades tracking error against actuation magnitude; a
/// `weight` of zero disables it. The reward always consumes the *raw*
/// error pair, never the filtered observation.
#[derive(Debug, Clone)]
pub struct Reward {
    pub kind: RewardKind,
    /// Actuation penalty weight; 0 disables the penalty term.
    pub weight: f64,
}

impl Reward {
    pub fn new(kind: RewardKind, weight: f64) -> Self {
        Self { kind, weight }
    }

    /// Compute the step reward from raw per-axis errors, their
    /// derivatives and the commanded plate angles.
    pub fn compute(
        &self,
        config: &PlantConfig,
        error: &[f64],
        d_error: &[f64],
        angles: &[f64],
    ) -> f64 {
        let n = error.len() as f64;
        let tracking = match self.kind {
            RewardKind::Linear => {
                error.iter().map(|e| e.abs() / config.max_x).sum::<f64>() / n
            }
            RewardKind::Quadratic => {
                error.iter().map(|e| (e / config.max_x).powi(2)).sum::<f64>() / n
            }
            RewardKind::Derivative => error
                .iter()
                .zip(d_error)
                .map(|(e, de)| e.signum() * de * config.ball_d_error_scaling)
                .sum::<f64>(),
        };

        let penalty = if self.weight != 0.0 {
            self.weight * angles.iter().map(|a| a.abs() / config.max_angle).sum::<f64>()
                / angles.len() as f64
        } else {
            0.0
        };

        -(tracking + penalty).tanh()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PlantConfig {
        PlantConfig::default()
    }

    #[test]
    fn reward_bounded_over_swept_inputs() {
        let config = cfg();
        for kind in [RewardKind::Linear, RewardKind::Quadratic, RewardKind::Derivative] {
            for weight in [0.0, 0.5, 10.0, -3.0] {
                let r = Reward::new(kind, weight);
                for mag in [0.0, 1e-6, 0.05, 1.0, 1e9] {
                    for sign in [-1.0, 1.0] {
                        let e = [sign * mag, -sign * mag];
                        let de = [sign * mag, sign * mag];
                        let a = [sign * mag, 0.0];
                        let v = r.compute(&config, &e, &de, &a);
                        assert!(
                            (-1.0..=1.0).contains(&v),
                            "{kind:?} w={weight} mag={mag}: reward {v} escaped [-1,1]"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn on_target_and_idle_is_zero() {
        let r = Reward::new(RewardKind::Linear, 1.0);
        assert_eq!(r.compute(&cfg(), &[0.0, 0.0], &[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn larger_error_never_pays_more() {
        let config = cfg();
        let r = Reward::new(RewardKind::Quadratic, 0.0);
        let small = r.compute(&config, &[0.01, 0.0], &[0.0, 0.0], &[0.0, 0.0]);
        let large = r.compute(&config, &[0.08, 0.0], &[0.0, 0.0], &[0.0, 0.0]);
        assert!(large < small, "Quadratic reward must fall with error");
        assert!(small < 0.0);
    }

    #[test]
    fn derivative_kind_rewards_closing_the_gap() {
        let config = cfg();
        let r = Reward::new(RewardKind::Derivative, 0.0);
        // Positive error shrinking (negative derivative): positive reward.
        let closing = r.compute(&config, &[0.05], &[-0.01], &[0.0]);
        let opening = r.compute(&config, &[0.05], &[0.01], &[0.0]);
        assert!(closing > 0.0);
        assert!(opening < 0.0);
    }

    #[test]
    fn actuation_penalty_only_with_nonzero_weight() {
        let config = cfg();
        let free = Reward::new(RewardKind::Linear, 0.0);
        let taxed = Reward::new(RewardKind::Linear, 1.0);
        let e = [0.02, 0.0];
        let de = [0.0, 0.0];
        let idle = [0.0, 0.0];
        let busy = [25.0, 25.0];
        assert_eq!(
            free.compute(&config, &e, &de, &idle),
            free.compute(&config, &e, &de, &busy),
            "Zero weight must ignore actuation"
        );
        assert!(
            taxed.compute(&config, &e, &de, &busy) < taxed.compute(&config, &e, &de, &idle),
            "Actuation must cost reward when weighted"
        );
    }
}
