use super::DistributionHeadConfig;
use crate::model::SubModel;
use tch::{nn, nn::Module, Kind, Tensor};

fn stream(p: &nn::Path, prefix: &str, in_dim: i64, hidden_dim: i64, out_dim: i64) -> nn::Sequential {
    nn::seq()
        .add(nn::linear(
            p / format!("{}1", prefix),
            in_dim,
            hidden_dim,
            Default::default(),
        ))
        .add_fn(|xs| xs.relu())
        .add(nn::linear(
            p / format!("{}2", prefix),
            hidden_dim,
            out_dim,
            Default::default(),
        ))
}

/// Dueling head of a value-distribution network.
///
/// Two independent streams consume the feature vector: the advantage
/// stream outputs `n_actions * n_atoms` values, the value stream outputs
/// `n_atoms` values shared by all actions. They are combined per atom as
///
/// `combined[a, i] = value[i] + advantage[a, i] - mean_a(advantage[:, i])`
///
/// The mean subtraction makes the decomposition identifiable: any
/// constant added to the value stream and subtracted from all advantages
/// leaves the combined output unchanged, so the advantage is constrained
/// to be zero-mean across actions. The output is raw logits of shape
/// `[batch, n_actions, n_atoms]`; the softmax over atoms belongs to the
/// consumer.
pub struct DuelingDistributionHead {
    in_dim: i64,
    hidden_dim: i64,
    n_actions: i64,
    n_atoms: i64,
    a_stream: nn::Sequential,
    v_stream: nn::Sequential,
}

impl DuelingDistributionHead {
    fn _build(var_store: &nn::VarStore, config: DistributionHeadConfig) -> Self {
        let p = &var_store.root();
        let a_stream = stream(
            p,
            "a",
            config.in_dim,
            config.hidden_dim,
            config.n_actions * config.n_atoms,
        );
        let v_stream = stream(p, "v", config.in_dim, config.hidden_dim, config.n_atoms);

        Self {
            in_dim: config.in_dim,
            hidden_dim: config.hidden_dim,
            n_actions: config.n_actions,
            n_atoms: config.n_atoms,
            a_stream,
            v_stream,
        }
    }

    fn config(&self) -> DistributionHeadConfig {
        DistributionHeadConfig::new(self.in_dim, self.hidden_dim, self.n_actions, self.n_atoms)
    }
}

impl SubModel for DuelingDistributionHead {
    type Config = DistributionHeadConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, feature: &Self::Input) -> Self::Output {
        let batch_size = feature.size()[0];
        debug_assert_eq!(feature.size().as_slice(), &[batch_size, self.in_dim]);

        // Advantage, zero-mean across actions per atom
        let ya = self
            .a_stream
            .forward(feature)
            .view((batch_size, self.n_actions, self.n_atoms));
        let mean = ya.mean_dim(&[1][..], true, Kind::Float);
        let ya = ya - mean;

        // State value, broadcast across actions
        let ys = self
            .v_stream
            .forward(feature)
            .view((batch_size, 1, self.n_atoms));

        ya + ys
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        Self::_build(var_store, config)
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::_build(var_store, self.config())
    }
}

/// Plain (non-dueling) head of a value-distribution network.
///
/// A single MLP outputting `n_actions * n_atoms` logits, reshaped to
/// `[batch, n_actions, n_atoms]`.
pub struct MlpDistributionHead {
    in_dim: i64,
    hidden_dim: i64,
    n_actions: i64,
    n_atoms: i64,
    seq: nn::Sequential,
}

impl MlpDistributionHead {
    fn _build(var_store: &nn::VarStore, config: DistributionHeadConfig) -> Self {
        let p = &var_store.root();
        let seq = stream(
            p,
            "l",
            config.in_dim,
            config.hidden_dim,
            config.n_actions * config.n_atoms,
        );

        Self {
            in_dim: config.in_dim,
            hidden_dim: config.hidden_dim,
            n_actions: config.n_actions,
            n_atoms: config.n_atoms,
            seq,
        }
    }
}

impl SubModel for MlpDistributionHead {
    type Config = DistributionHeadConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, feature: &Self::Input) -> Self::Output {
        let batch_size = feature.size()[0];
        debug_assert_eq!(feature.size().as_slice(), &[batch_size, self.in_dim]);

        self.seq
            .forward(feature)
            .view((batch_size, self.n_actions, self.n_atoms))
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        Self::_build(var_store, config)
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::_build(
            var_store,
            DistributionHeadConfig::new(self.in_dim, self.hidden_dim, self.n_actions, self.n_atoms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device};

    #[test]
    /// The mean over actions of the combined logits recovers the value
    /// stream for every atom.
    fn dueling_mean_over_actions_is_value() {
        let (batch_size, in_dim, n_actions, n_atoms) = (7, 16, 5, 11);
        let var_store = VarStore::new(Device::Cpu);
        let config = DistributionHeadConfig::new(in_dim, 32, n_actions, n_atoms);
        let head = DuelingDistributionHead::build(&var_store, config);

        let feature = Tensor::rand(&[batch_size, in_dim], tch::kind::FLOAT_CPU);
        let combined = head.forward(&feature);
        assert_eq!(combined.size(), &[batch_size, n_actions, n_atoms]);

        let mean = combined.mean_dim(&[1][..], false, Kind::Float);
        let value = head.v_stream.forward(&feature);
        assert!(mean.allclose(&value, 1e-5, 1e-6, false));
    }

    #[test]
    fn mlp_head_logits_shape() {
        let (batch_size, in_dim, n_actions, n_atoms) = (3, 8, 4, 51);
        let var_store = VarStore::new(Device::Cpu);
        let config = DistributionHeadConfig::new(in_dim, 32, n_actions, n_atoms);
        let head = MlpDistributionHead::build(&var_store, config);

        let feature = Tensor::rand(&[batch_size, in_dim], tch::kind::FLOAT_CPU);
        assert_eq!(head.forward(&feature).size(), &[batch_size, n_actions, n_atoms]);
    }
}
