//! C51 agent: categorical distributional Q-learning.
//!
//! The agent learns, for every action, a probability distribution over a
//! fixed [`Support`] of return values instead of a scalar Q-value. The
//! training target of a transition is obtained by shifting and scaling
//! the next-state distribution through the Bellman operator and
//! projecting it back onto the support ([`project_to_support`]); the loss
//! is the cross-entropy between the projected target and the online
//! network's prediction for the taken action.
mod base;
mod config;
mod explorer;
mod model;
mod projection;
mod support;
pub use base::C51;
pub use config::C51Config;
pub use explorer::{C51Explorer, ConstantEpsilonGreedy, EpsilonGreedy};
pub use model::{C51Model, C51ModelConfig};
pub use projection::project_to_support;
pub use support::Support;
