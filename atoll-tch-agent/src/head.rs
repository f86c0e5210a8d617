//! Distribution heads mapping feature vectors to per-action logits over
//! the atoms of the support.
mod base;
mod config;
pub use base::{DuelingDistributionHead, MlpDistributionHead};
pub use config::DistributionHeadConfig;
