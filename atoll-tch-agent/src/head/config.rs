use crate::util::OutDim;
use serde::{Deserialize, Serialize};

/// Configuration of the distribution heads.
///
/// Shared by [`DuelingDistributionHead`](super::DuelingDistributionHead)
/// and [`MlpDistributionHead`](super::MlpDistributionHead).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DistributionHeadConfig {
    /// Dimension of the input feature vectors.
    pub in_dim: i64,

    /// Dimension of the hidden layer of each stream.
    pub hidden_dim: i64,

    /// Number of discrete actions.
    pub n_actions: i64,

    /// Number of atoms of the return distribution.
    pub n_atoms: i64,
}

impl DistributionHeadConfig {
    /// Constructs a configuration of a distribution head.
    pub fn new(in_dim: i64, hidden_dim: i64, n_actions: i64, n_atoms: i64) -> Self {
        Self {
            in_dim,
            hidden_dim,
            n_actions,
            n_atoms,
        }
    }
}

impl OutDim for DistributionHeadConfig {
    /// Gets the number of actions.
    fn get_out_dim(&self) -> i64 {
        self.n_actions
    }

    /// Sets the number of actions.
    fn set_out_dim(&mut self, v: i64) {
        self.n_actions = v;
    }
}
