//! Replay buffer interfaces.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// This trait covers the storage side of a replay buffer and is what the
/// [`Sampler`](crate::Sampler) pushes transitions into.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a transition into the buffer, evicting the oldest entry
    /// once the buffer is at capacity.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of transitions in the buffer.
    fn len(&self) -> usize;
}

/// Interface for replay buffers that generate batches for training.
///
/// Independent of [`ExperienceBufferBase`]; this side is what agents
/// sample from.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Samples a batch of transitions for training.
    ///
    /// Fails with
    /// [`AtollError::InsufficientSamples`](crate::error::AtollError) if
    /// the buffer holds fewer than `size` transitions.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
