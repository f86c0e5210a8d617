//! Generic transition batches.
use crate::TransitionBatch;

/// Basic operations of fixed-capacity batch storage.
///
/// Implementors back the observation and action arenas of
/// [`SimpleReplayBuffer`](super::SimpleReplayBuffer): `push` writes at an
/// index (wrapping is handled by the buffer), `sample` gathers rows by
/// index.
pub trait BatchBase {
    /// Creates a new batch with the specified capacity.
    fn new(capacity: usize) -> Self;

    /// Adds data at the specified index.
    fn push(&mut self, ix: usize, data: Self);

    /// Retrieves samples of the specified indices.
    fn sample(&self, ixs: &Vec<usize>) -> Self;
}

/// A generic transition batch `(o_t, a_t, o_t+1, r_t, done_t)`.
///
/// Both single transitions (pushed by the step processor) and sampled
/// minibatches are represented by this type; a single transition is a
/// batch of length 1.
#[derive(Debug)]
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Episode termination flags.
    pub is_done: Vec<i8>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
    ) {
        (self.obs, self.act, self.next_obs, self.reward, self.is_done)
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}

impl<O, A> GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Creates a new batch with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
        }
    }
}
