//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Observations are expected to be fully preprocessed (frame stacking,
/// reward clipping and the like are the environment's concern); the agent
/// consumes them as-is.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performs an environment step.
    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment and returns an initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step and resets the environment if the
    /// episode ends, filling [`Step::init_obs`] with the observation of
    /// the next episode.
    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, commonly as a random seed.
    /// [`DefaultEvaluator`](crate::DefaultEvaluator) calls this once per
    /// evaluation episode.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
