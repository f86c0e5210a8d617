//! Configuration of the C51 agent.
use super::{
    explorer::{C51Explorer, EpsilonGreedy},
    C51ModelConfig, Support,
};
use crate::{model::SubModel, util::{BatchAccumulator, OutDim}, Device};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};
use tch::Tensor;

/// Configuration of [`C51`](super::C51).
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct C51Config<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
{
    pub(super) model_config: C51ModelConfig<F::Config, M::Config>,
    pub(super) support: Support,
    pub(super) discount_factor: f64,
    pub(super) batch_size: usize,
    pub(super) min_transitions_warmup: usize,
    pub(super) target_update_interval: usize,
    pub(super) n_updates_per_opt: usize,
    #[serde(default)]
    pub(super) double_dqn: bool,
    pub(super) batch_accumulator: BatchAccumulator,
    pub(super) explorer: C51Explorer,
    pub(super) eval_epsilon: f64,
    pub(super) train: bool,
    /// Device on which the networks live.
    pub device: Option<Device>,
    phantom: PhantomData<(F, M)>,
}

impl<F, M> Clone for C51Config<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + Clone,
    M::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn clone(&self) -> Self {
        Self {
            model_config: self.model_config.clone(),
            support: self.support.clone(),
            discount_factor: self.discount_factor,
            batch_size: self.batch_size,
            min_transitions_warmup: self.min_transitions_warmup,
            target_update_interval: self.target_update_interval,
            n_updates_per_opt: self.n_updates_per_opt,
            double_dqn: self.double_dqn,
            batch_accumulator: self.batch_accumulator.clone(),
            explorer: self.explorer.clone(),
            eval_epsilon: self.eval_epsilon,
            train: self.train,
            device: self.device.clone(),
            phantom: PhantomData,
        }
    }
}

impl<F, M> Default for C51Config<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
{
    /// Constructs a C51 configuration with default parameters.
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            support: Default::default(),
            discount_factor: 0.99,
            batch_size: 1,
            min_transitions_warmup: 1,
            target_update_interval: 1,
            n_updates_per_opt: 1,
            double_dqn: false,
            batch_accumulator: BatchAccumulator::Sum,
            explorer: C51Explorer::EpsilonGreedy(EpsilonGreedy::new()),
            eval_epsilon: 0.05,
            train: false,
            device: None,
            phantom: PhantomData,
        }
    }
}

impl<F, M> C51Config<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: C51ModelConfig<F::Config, M::Config>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the support of the return distribution.
    pub fn support(mut self, support: Support) -> Self {
        self.support = support;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Number of transitions required before optimization starts.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Sets the interval of hard target updates in optimization steps.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the number of parameter update steps per optimization step.
    pub fn n_updates_per_opt(mut self, v: usize) -> Self {
        self.n_updates_per_opt = v;
        self
    }

    /// Selects the action of the projection target with the online
    /// network instead of the target network ("double" variant).
    pub fn double_dqn(mut self, v: bool) -> Self {
        self.double_dqn = v;
        self
    }

    /// How the cross-entropy terms of a minibatch are reduced.
    pub fn batch_accumulator(mut self, v: BatchAccumulator) -> Self {
        self.batch_accumulator = v;
        self
    }

    /// Explorer used in training mode.
    pub fn explorer(mut self, v: C51Explorer) -> Self {
        self.explorer = v;
        self
    }

    /// Probability of random actions in evaluation mode.
    pub fn eval_epsilon(mut self, v: f64) -> Self {
        self.eval_epsilon = v;
        self
    }

    /// Sets the number of actions of the distribution head.
    pub fn out_dim(mut self, out_dim: i64) -> Self {
        let model_config = self.model_config;
        self.model_config = model_config.out_dim(out_dim);
        self
    }

    /// Device.
    pub fn device(mut self, device: tch::Device) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Loads [`C51Config`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of C51 agent from {}", path_.to_str().unwrap());
        Ok(b)
    }

    /// Saves [`C51Config`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of C51 agent into {}", path_.to_str().unwrap());
        Ok(())
    }
}
