//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum AtollError {
    /// Invalid configuration, detected at construction.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A batch was requested from a buffer holding fewer transitions.
    ///
    /// The trainer gates optimization on the warmup period, so hitting
    /// this during training indicates a broken cadence configuration.
    #[error("Requested a batch of {requested} transitions from a buffer of length {len}")]
    InsufficientSamples {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions in the buffer.
        len: usize,
    },

    /// Tensor shape disagreement, fatal and not retried.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<i64>,
        /// Actual shape.
        got: Vec<i64>,
    },

    /// The loss became NaN or infinite.
    ///
    /// Training halts rather than skipping the batch; a non-finite loss
    /// means the targets are already corrupted.
    #[error("Non-finite loss ({loss}) at optimization step {opt_steps}")]
    NumericalInstability {
        /// Optimization steps completed when the loss diverged.
        opt_steps: usize,
        /// The loss value.
        loss: f32,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
