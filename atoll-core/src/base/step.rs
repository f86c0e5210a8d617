//! Environment step.
use super::Env;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
/// It is used to create transitions `(o_t, a_t, o_t+1, r_t)`.
pub struct Step<E: Env> {
    /// Action taken at this step.
    pub act: E::Act,

    /// Observation after taking the action.
    pub obs: E::Obs,

    /// Reward of this step.
    pub reward: f32,

    /// If the episode terminated at this step.
    pub is_done: bool,

    /// Information defined by user.
    pub info: E::Info,

    /// Initial observation of the next episode. Only used when
    /// `is_done` is true and the environment was reset.
    pub init_obs: Option<E::Obs>,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_done: bool,
        info: E::Info,
        init_obs: Option<E::Obs>,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_done,
            info,
            init_obs,
        }
    }
}

/// Processes [`Step`] and outputs an item [`Self::Output`].
///
/// This trait is used in [`Trainer`](crate::Trainer). A [`Step`] object is
/// transformed to [`Self::Output`], which will be pushed into a replay
/// buffer implementing [`ExperienceBufferBase`].
///
/// [`Self::Output`]: StepProcessor::Output
/// [`ExperienceBufferBase`]: crate::ExperienceBufferBase
pub trait StepProcessor<E: Env> {
    /// Configuration.
    type Config: Clone;

    /// The type of transitions produced by this trait.
    type Output;

    /// Builds a processor.
    fn build(config: &Self::Config) -> Self;

    /// Resets the object with an initial observation.
    fn reset(&mut self, init_obs: E::Obs);

    /// Processes a [`Step`] object.
    fn process(&mut self, step: Step<E>) -> Self::Output;
}
