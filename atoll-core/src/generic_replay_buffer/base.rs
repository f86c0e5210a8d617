//! Arena replay buffer with uniform sampling.
use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::AtollError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// A generic replay buffer with FIFO eviction and uniform sampling.
///
/// Transitions are written into fixed-size arenas at a cursor wrapping
/// modulo the capacity, so once the buffer is full the oldest entries are
/// overwritten first. [`batch`](ReplayBufferBase::batch) draws indices
/// uniformly at random with replacement; repeated storage of identical
/// transitions is legal and sampling ignores insertion order.
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Current insertion index.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_done: Vec<i8>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_reward(&mut self, i: usize, b: &Vec<f32>) {
        let mut j = i;
        for r in b.iter() {
            self.reward[j] = *r;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    #[inline]
    fn push_is_done(&mut self, i: usize, b: &Vec<i8>) {
        let mut j = i;
        for d in b.iter() {
            self.is_done[j] = *d;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    fn sample_reward(&self, ixs: &Vec<usize>) -> Vec<f32> {
        ixs.iter().map(|ix| self.reward[*ix]).collect()
    }

    fn sample_is_done(&self, ixs: &Vec<usize>) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_done[*ix]).collect()
    }

    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of termination flags set in the buffer.
    pub fn num_done_flags(&self) -> usize {
        self.is_done.iter().map(|is_done| *is_done as usize).sum()
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.reward.iter().sum()
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len(); // batch size
        let (obs, act, next_obs, reward, is_done) = tr.unpack();
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        self.push_reward(self.i, &reward);
        self.push_is_done(self.i, &is_done);

        self.i = (self.i + len) % self.capacity;
        self.size += len;
        if self.size >= self.capacity {
            self.size = self.capacity;
        }

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_done: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if size > self.size {
            return Err(AtollError::InsufficientSamples {
                requested: size,
                len: self.size,
            }
            .into());
        }

        let ixs = (0..size)
            .map(|_| (self.rng.next_u32() as usize) % self.size)
            .collect::<Vec<_>>();

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.sample_reward(&ixs),
            is_done: self.sample_is_done(&ixs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtollError;

    /// Scalar storage, sufficient to track transition identities.
    #[derive(Debug)]
    struct VecBatch(Vec<f32>);

    impl BatchBase for VecBatch {
        fn new(capacity: usize) -> Self {
            Self(vec![0.; capacity])
        }

        fn push(&mut self, ix: usize, data: Self) {
            let capacity = self.0.len();
            for (j, v) in data.0.iter().enumerate() {
                self.0[(ix + j) % capacity] = *v;
            }
        }

        fn sample(&self, ixs: &Vec<usize>) -> Self {
            Self(ixs.iter().map(|ix| self.0[*ix]).collect())
        }
    }

    fn transition(id: f32) -> GenericTransitionBatch<VecBatch, VecBatch> {
        GenericTransitionBatch {
            obs: VecBatch(vec![id]),
            act: VecBatch(vec![id]),
            next_obs: VecBatch(vec![id]),
            reward: vec![id],
            is_done: vec![0],
        }
    }

    fn build(capacity: usize) -> SimpleReplayBuffer<VecBatch, VecBatch> {
        let config = SimpleReplayBufferConfig::default().capacity(capacity).seed(0);
        SimpleReplayBuffer::build(&config)
    }

    #[test]
    fn fifo_eviction_drops_oldest() -> Result<()> {
        let capacity = 8;
        let k = 3;
        let mut buffer = build(capacity);

        for id in 0..(capacity + k) {
            buffer.push(transition(id as f32))?;
        }
        assert_eq!(buffer.len(), capacity);

        // The arenas hold exactly the most recent `capacity` transitions;
        // the oldest `k` were overwritten in insertion order.
        let survivors = buffer.reward.clone();
        for id in 0..k {
            assert!(!survivors.contains(&(id as f32)));
        }
        for id in k..(capacity + k) {
            assert!(survivors.contains(&(id as f32)));
        }
        Ok(())
    }

    #[test]
    fn batch_is_uniform_over_contents() -> Result<()> {
        let mut buffer = build(16);
        for id in 0..16 {
            buffer.push(transition(id as f32))?;
        }

        let batch = buffer.batch(64)?;
        assert_eq!(batch.len(), 64);
        for r in batch.reward.iter() {
            assert!(*r >= 0.0 && *r < 16.0);
        }
        Ok(())
    }

    #[test]
    fn batch_fails_on_insufficient_samples() -> Result<()> {
        let mut buffer = build(16);
        for id in 0..4 {
            buffer.push(transition(id as f32))?;
        }

        let err = buffer.batch(32).unwrap_err();
        match err.downcast_ref::<AtollError>() {
            Some(AtollError::InsufficientSamples { requested, len }) => {
                assert_eq!(*requested, 32);
                assert_eq!(*len, 4);
            }
            _ => panic!("expected InsufficientSamples, got {:?}", err),
        }
        Ok(())
    }
}
