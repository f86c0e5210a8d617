#![warn(missing_docs)]
//! Core abstractions for categorical distributional reinforcement learning.
//!
//! This crate defines the seams between an agent and its collaborators:
//! environments ([`Env`]), replay buffers ([`ReplayBufferBase`]), metric
//! sinks ([`record::Recorder`]) and evaluators ([`Evaluator`]). It also
//! provides a generic arena replay buffer with uniform sampling and the
//! [`Trainer`] that coordinates experience collection, batched learning
//! and periodic evaluation.
pub mod error;
pub mod generic_replay_buffer;
pub mod record;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase, Step,
    StepProcessor, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig};
