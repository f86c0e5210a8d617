//! Types for recording scalar metrics during training and evaluation.
//!
//! [`Record`] is a map from metric names to [`RecordValue`]s, produced by
//! agents, environments and the trainer. [`Recorder`] is the seam towards
//! concrete sinks (stdout, tensorboard and the like), which are outside
//! this crate. [`RecordStorage`] aggregates stored scalars into
//! min/max/mean/median statistics between flushes.
mod base;
mod null_recorder;
mod recorder;
mod storage;
pub use base::{Record, RecordValue};
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
