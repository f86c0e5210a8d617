use serde::{Deserialize, Serialize};

/// Configuration of [`NatureCnn`](super::NatureCnn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NatureCnnConfig {
    /// Number of stacked frames, the channel count of the input.
    pub n_stack: i64,

    /// Dimension of the flattened feature vector (3136 for 84x84 inputs).
    pub feature_dim: i64,
}

impl NatureCnnConfig {
    /// Constructs a configuration of [`NatureCnn`](super::NatureCnn).
    pub fn new(n_stack: i64, feature_dim: i64) -> Self {
        Self {
            n_stack,
            feature_dim,
        }
    }
}
