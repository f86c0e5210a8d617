//! Evaluate a policy.
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a policy.
///
/// The caller of [`Evaluator::evaluate`] needs to handle the internal
/// state of the policy, like switching between training and evaluation
/// mode.
pub trait Evaluator<E: Env> {
    /// Runs evaluation episodes and returns a [`Record`] of statistics
    /// over the episode returns.
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>;
}
