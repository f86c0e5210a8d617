//! Value-distribution model of the C51 agent.
use crate::{
    model::{ModelBase, SubModel},
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};
use tch::{nn, Device, Kind, Tensor};

/// Configuration of [`C51Model`].
///
/// The type parameters are the configurations of the feature extractor
/// and of the distribution head.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(bound(
    serialize = "F: DeserializeOwned + Serialize, M: DeserializeOwned + Serialize + OutDim",
    deserialize = "F: DeserializeOwned + Serialize, M: DeserializeOwned + Serialize + OutDim"
))]
pub struct C51ModelConfig<F, M>
where
    F: DeserializeOwned + Serialize,
    M: DeserializeOwned + Serialize + OutDim,
{
    pub(super) f_config: Option<F>,
    pub(super) m_config: Option<M>,
    pub(super) opt_config: OptimizerConfig,
}

impl<F, M> Default for C51ModelConfig<F, M>
where
    F: DeserializeOwned + Serialize,
    M: DeserializeOwned + Serialize + OutDim,
{
    fn default() -> Self {
        Self {
            f_config: None,
            m_config: None,
            opt_config: OptimizerConfig::Adam { lr: 0.0 },
        }
    }
}

impl<F, M> C51ModelConfig<F, M>
where
    F: DeserializeOwned + Serialize,
    M: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the feature extractor.
    pub fn f_config(mut self, v: F) -> Self {
        self.f_config = Some(v);
        self
    }

    /// Sets the configuration of the distribution head.
    pub fn m_config(mut self, v: M) -> Self {
        self.m_config = Some(v);
        self
    }

    /// Sets the number of actions of the distribution head.
    pub fn out_dim(mut self, v: i64) -> Self {
        match &mut self.m_config {
            None => {}
            Some(m_config) => m_config.set_out_dim(v),
        };
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`C51ModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`C51ModelConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Value-distribution network with its optimizer.
///
/// Composes a feature extractor `F` and a distribution head `M` sharing
/// one [`nn::VarStore`]. Two independent instances exist in a [`C51`]
/// agent: the online model, updated by gradient steps, and the target
/// model, refreshed by a hard parameter copy.
///
/// [`C51`]: super::C51
pub struct C51Model<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
{
    device: Device,
    var_store: nn::VarStore,

    // Number of actions.
    pub(super) out_dim: i64,

    // Feature extractor
    psi: F,

    // Distribution head
    head: M,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,

    phantom: PhantomData<(F, M)>,
}

impl<F, M> C51Model<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
{
    /// Constructs a [`C51Model`] on the given device.
    pub fn build(config: C51ModelConfig<F::Config, M::Config>, device: Device) -> Result<Self> {
        let f_config = config.f_config.context("f_config is not set.")?;
        let m_config = config.m_config.context("m_config is not set.")?;
        let out_dim = m_config.get_out_dim();
        let opt_config = config.opt_config;
        let var_store = nn::VarStore::new(device);

        // Feature extractor
        let psi = F::build(&var_store, f_config);

        // Distribution head
        let head = M::build(&var_store, m_config);

        // Optimizer
        let opt = opt_config.build(&var_store)?;

        Ok(Self {
            device,
            var_store,
            out_dim,
            psi,
            head,
            opt_config,
            opt,
            phantom: PhantomData,
        })
    }
}

impl<F, M> C51Model<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
{
    /// Returns the raw per-(action, atom) logits for a batch of
    /// observations, `[batch_size, n_actions, n_atoms]`.
    ///
    /// The loss path consumes these through `log_softmax` rather than
    /// taking the logarithm of the probabilities.
    pub fn forward_logits(&self, x: &F::Input) -> Tensor {
        let feature = self.psi.forward(x);
        let logits = self.head.forward(&feature);

        let batch_size = logits.size()[0];
        debug_assert_eq!(logits.size().len(), 3);
        debug_assert_eq!(&logits.size()[..2], &[batch_size, self.out_dim][..]);

        logits
    }

    /// Returns the return distributions for a batch of observations,
    /// `[batch_size, n_actions, n_atoms]`.
    ///
    /// Each action's vector over atoms is a valid probability
    /// distribution (non-negative, sums to 1).
    pub fn forward(&self, x: &F::Input) -> Tensor {
        self.forward_logits(x).softmax(-1, Kind::Float)
    }
}

impl<F, M> Clone for C51Model<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
{
    fn clone(&self) -> Self {
        let device = self.device;
        let out_dim = self.out_dim;
        let opt_config = self.opt_config.clone();
        let mut var_store = nn::VarStore::new(device);

        // Submodels attached to the fresh var_store
        let psi = self.psi.clone_with_var_store(&var_store);
        let head = self.head.clone_with_var_store(&var_store);

        // Optimizer
        let opt = opt_config.build(&var_store).unwrap();

        var_store.copy(&self.var_store).unwrap();

        Self {
            device,
            var_store,
            out_dim,
            psi,
            head,
            opt_config,
            opt,
            phantom: PhantomData,
        }
    }
}

impl<F, M> ModelBase for C51Model<F, M>
where
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
{
    fn backward_step(&mut self, loss: &Tensor) {
        self.opt.backward_step(loss);
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.var_store.save(&path)?;
        info!("Save C51 model to {:?}", path.as_ref());
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load C51 model from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::{DistributionHeadConfig, DuelingDistributionHead};
    use std::convert::TryFrom;

    #[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
    struct IdentityConfig {}

    /// Passes feature vectors through unchanged.
    struct Identity {}

    impl SubModel for Identity {
        type Config = IdentityConfig;
        type Input = Tensor;
        type Output = Tensor;

        fn build(_var_store: &nn::VarStore, _config: Self::Config) -> Self {
            Self {}
        }

        fn clone_with_var_store(&self, _var_store: &nn::VarStore) -> Self {
            Self {}
        }

        fn forward(&self, input: &Self::Input) -> Self::Output {
            input.copy()
        }
    }

    fn model(
        in_dim: i64,
        n_actions: i64,
        n_atoms: i64,
    ) -> C51Model<Identity, DuelingDistributionHead> {
        let config = C51ModelConfig::default()
            .f_config(IdentityConfig {})
            .m_config(DistributionHeadConfig::new(in_dim, 32, n_actions, n_atoms))
            .opt_config(OptimizerConfig::Adam { lr: 1e-4 });
        C51Model::build(config, Device::Cpu).unwrap()
    }

    #[test]
    fn forward_emits_probability_distributions_per_action() {
        let (batch_size, in_dim, n_actions, n_atoms) = (6, 12, 4, 51);
        let model = model(in_dim, n_actions, n_atoms);

        let x = Tensor::rand(&[batch_size, in_dim], tch::kind::FLOAT_CPU);
        let probs = model.forward(&x);
        assert_eq!(probs.size(), &[batch_size, n_actions, n_atoms]);

        let flat = Vec::<f32>::try_from(&probs.flatten(0, -1)).unwrap();
        assert!(flat.iter().all(|p| *p >= 0.0));

        let sums = Vec::<f32>::try_from(
            &probs.sum_dim_intlist(&[-1][..], false, Kind::Float).flatten(0, -1),
        )
        .unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn clone_is_an_independent_snapshot() {
        let model = model(8, 3, 11);
        let model_tgt = model.clone();

        let x = Tensor::rand(&[2, 8], tch::kind::FLOAT_CPU);
        let p = model.forward(&x);
        let p_tgt = model_tgt.forward(&x);
        assert!(p.allclose(&p_tgt, 1e-6, 1e-7, false));
    }
}
