//! Categorical distributional RL agents implemented with [tch](https://crates.io/crates/tch).
//!
//! The centerpiece is the [`C51`](c51::C51) agent: a dueling
//! value-distribution network over a fixed support of return values
//! ([`c51::Support`]), trained with the categorical Bellman backup
//! ([`c51::project_to_support`]).
pub mod c51;
pub mod cnn;
pub mod head;
pub mod model;
pub mod opt;
pub mod util;

mod tensor_batch;
pub use tensor_batch::TensorBatch;

use serde::{Deserialize, Serialize};

/// Device for tch.
///
/// This enum is added because [`tch::Device`] does not support serde.
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl From<tch::Device> for Device {
    fn from(device: tch::Device) -> Self {
        match device {
            tch::Device::Cpu => Self::Cpu,
            tch::Device::Cuda(n) => Self::Cuda(n),
            _ => unimplemented!(),
        }
    }
}

impl From<Device> for tch::Device {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => Self::Cpu,
            Device::Cuda(n) => Self::Cuda(n),
        }
    }
}
