use std::fmt;

use crate::control::controller::Policy;

// ---------------------------------------------------------------------------
// Hand-rolled policies: linear map and one-hidden-layer MLP
// ---------------------------------------------------------------------------

/// Raised when a flat weight vector does not match the network size.
#[derive(Debug, Clone)]
pub struct WeightCountMismatch {
    pub expected: usize,
    pub got: usize,
}

impl fmt::Display for WeightCountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weight vector length {} does not match network size {}", self.got, self.expected)
    }
}

impl std::error::Error for WeightCountMismatch {}

/// Linear policy: `action = tanh(W · observation)`, one output row per
/// action component, no bias. Outputs land in [-1, 1], matching the
/// direct-angle action convention.
#[derive(Debug, Clone)]
pub struct LinearPolicy {
    /// Row-major weights, `act_dim` rows of `obs_dim` entries.
    w: Vec<Vec<f64>>,
}

impl LinearPolicy {
    pub fn new(act_dim: usize, obs_dim: usize) -> Self {
        Self { w: vec![vec![0.0; obs_dim]; act_dim] }
    }

    pub fn from_weights(w: Vec<Vec<f64>>) -> Self {
        Self { w }
    }

    pub fn n_params(&self) -> usize {
        self.w.iter().map(|row| row.len()).sum()
    }

    /// Load a flat parameter vector (row-major), as emitted by external
    /// genetic optimizers.
    pub fn set_flat(&mut self, flat: &[f64]) -> Result<(), WeightCountMismatch> {
        if flat.len() != self.n_params() {
            return Err(WeightCountMismatch { expected: self.n_params(), got: flat.len() });
        }
        let mut it = flat.iter();
        for row in &mut self.w {
            for w in row.iter_mut() {
                *w = *it.next().unwrap();
            }
        }
        Ok(())
    }
}

impl Policy for LinearPolicy {
    fn act(&mut self, observation: &[f64]) -> Vec<f64> {
        self.w
            .iter()
            .map(|row| {
                let z: f64 = row.iter().zip(observation).map(|(w, o)| w * o).sum();
                z.tanh()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "LinearPolicy"
    }
}

/// One-hidden-layer tanh MLP with no output bias:
/// `action = tanh(W2 · tanh(W1 · obs + b1))`.
///
/// The layout of `set_flat`/`flat` is W1 row-major, then b1, then W2
/// row-major, so an external optimizer can treat the whole policy as one
/// parameter vector.
#[derive(Debug, Clone)]
pub struct MlpPolicy {
    w1: Vec<Vec<f64>>,
    b1: Vec<f64>,
    w2: Vec<Vec<f64>>,
}

impl MlpPolicy {
    pub fn new(obs_dim: usize, hidden: usize, act_dim: usize) -> Self {
        Self {
            w1: vec![vec![0.0; obs_dim]; hidden],
            b1: vec![0.0; hidden],
            w2: vec![vec![0.0; hidden]; act_dim],
        }
    }

    pub fn n_params(&self) -> usize {
        let n1: usize = self.w1.iter().map(|r| r.len()).sum();
        let n2: usize = self.w2.iter().map(|r| r.len()).sum();
        n1 + self.b1.len() + n2
    }

    pub fn set_flat(&mut self, flat: &[f64]) -> Result<(), WeightCountMismatch> {
        if flat.len() != self.n_params() {
            return Err(WeightCountMismatch { expected: self.n_params(), got: flat.len() });
        }
        let mut it = flat.iter();
        for row in &mut self.w1 {
            for w in row.iter_mut() {
                *w = *it.next().unwrap();
            }
        }
        for b in &mut self.b1 {
            *b = *it.next().unwrap();
        }
        for row in &mut self.w2 {
            for w in row.iter_mut() {
                *w = *it.next().unwrap();
            }
        }
        Ok(())
    }

    pub fn from_flat(
        obs_dim: usize,
        hidden: usize,
        act_dim: usize,
        flat: &[f64],
    ) -> Result<Self, WeightCountMismatch> {
        let mut net = Self::new(obs_dim, hidden, act_dim);
        net.set_flat(flat)?;
        Ok(net)
    }
}

impl Policy for MlpPolicy {
    fn act(&mut self, observation: &[f64]) -> Vec<f64> {
        let hidden: Vec<f64> = self
            .w1
            .iter()
            .zip(&self.b1)
            .map(|(row, b)| {
                let z: f64 = row.iter().zip(observation).map(|(w, o)| w * o).sum();
                (z + b).tanh()
            })
            .collect();

        self.w2
            .iter()
            .map(|row| {
                let z: f64 = row.iter().zip(&hidden).map(|(w, h)| w * h).sum();
                z.tanh()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "MlpPolicy"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_policy_acts_zero() {
        let mut p = MlpPolicy::new(6, 8, 2);
        let a = p.act(&[1.0; 6]);
        assert_eq!(a, vec![0.0, 0.0]);
    }

    #[test]
    fn actions_bounded_by_tanh() {
        let flat: Vec<f64> = (0..MlpPolicy::new(3, 4, 1).n_params())
            .map(|i| (i as f64 - 5.0) * 3.0)
            .collect();
        let mut p = MlpPolicy::from_flat(3, 4, 1, &flat).unwrap();
        let a = p.act(&[100.0, -100.0, 50.0]);
        assert!(a[0].abs() <= 1.0);
    }

    #[test]
    fn flat_roundtrip_layout() {
        // 1 hidden unit, 2 obs, 1 act: [w1_00, w1_01, b1_0, w2_00]
        let mut p = MlpPolicy::new(2, 1, 1);
        p.set_flat(&[1.0, 0.0, 0.0, 10.0]).unwrap();
        let a = p.act(&[0.5, 99.0]);
        // tanh(10·tanh(0.5))
        let expected = (10.0 * 0.5_f64.tanh()).tanh();
        assert!((a[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn wrong_flat_length_rejected() {
        let mut p = MlpPolicy::new(6, 8, 2);
        let err = p.set_flat(&[0.0; 3]).unwrap_err();
        assert_eq!(err.expected, p.n_params());
        assert_eq!(err.got, 3);
    }

    #[test]
    fn linear_policy_rows_are_independent() {
        let mut p = LinearPolicy::from_weights(vec![vec![1.0, 0.0], vec![0.0, -1.0]]);
        let a = p.act(&[0.3, 0.3]);
        assert!((a[0] - 0.3_f64.tanh()).abs() < 1e-12);
        assert!((a[1] + 0.3_f64.tanh()).abs() < 1e-12);
    }
}
