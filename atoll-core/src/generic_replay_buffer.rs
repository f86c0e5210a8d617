//! Generic implementation of replay buffers.
//!
//! [`SimpleReplayBuffer`] stores transitions of arbitrary observation and
//! action types in fixed-size arenas with a wrapping write cursor, so the
//! oldest transitions are evicted first once the buffer is full. Sampling
//! is uniform with replacement. [`SimpleStepProcessor`] converts
//! environment steps into transitions suitable for pushing.
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::SimpleReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
