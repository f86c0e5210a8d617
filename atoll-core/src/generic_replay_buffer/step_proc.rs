//! Converts environment steps into transitions.
use super::{BatchBase, GenericTransitionBatch};
use crate::{Env, Obs, StepProcessor};
use std::{default::Default, marker::PhantomData};

/// Configuration of [`SimpleStepProcessor`].
#[derive(Clone, Debug)]
pub struct SimpleStepProcessorConfig {}

impl Default for SimpleStepProcessorConfig {
    fn default() -> Self {
        Self {}
    }
}

/// Converts [`Step`](crate::Step) objects into transitions for 1-step TD
/// backup.
///
/// The previous observation `o_t` is kept in the processor between calls,
/// while the remaining elements of the transition come from the given
/// step. When an episode ends, the processor re-arms itself with the
/// initial observation of the next episode.
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + From<E::Obs>,
    A: BatchBase + From<E::Act>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    /// Processes a step into a transition of batch size 1.
    ///
    /// # Panics
    ///
    /// Panics if [`reset`](StepProcessor::reset) has not been called, or
    /// if the step is terminal but carries no initial observation of the
    /// next episode.
    fn process(&mut self, step: crate::Step<E>) -> Self::Output {
        assert_eq!(step.obs.len(), 1);

        if self.prev_obs.is_none() {
            panic!("prev_obs is not set. Forgot to call reset()?");
        }

        let is_done = step.is_done;
        let next_obs = step.obs.clone().into();
        let obs = self.prev_obs.replace(step.obs.into()).unwrap();
        let act = step.act.into();
        let reward = vec![step.reward];
        let is_done = vec![is_done as i8];

        if step.is_done {
            self.prev_obs
                .replace(step.init_obs.expect("Failed to unwrap init_obs").into());
        }

        GenericTransitionBatch {
            obs,
            act,
            next_obs,
            reward,
            is_done,
        }
    }
}
