use super::NatureCnnConfig;
use crate::model::SubModel;
use tch::{nn, nn::Module, Device, Kind, Tensor};

/// Convolutional feature encoder with the architecture of the DQN paper.
///
/// Maps a batch of stacked grayscale frames `[batch, n_stack, 84, 84]`
/// (`u8`) to feature vectors `[batch, feature_dim]`. Scaling of the pixel
/// values to `[0, 1]` happens inside the encoder; the hidden layers on
/// top of the features belong to the distribution head.
pub struct NatureCnn {
    n_stack: i64,
    feature_dim: i64,
    device: Device,
    seq: nn::Sequential,
}

impl NatureCnn {
    fn stride(s: i64) -> nn::ConvConfig {
        nn::ConvConfig {
            stride: s,
            ..Default::default()
        }
    }

    fn create_net(var_store: &nn::VarStore, n_stack: i64) -> nn::Sequential {
        let p = &var_store.root();
        nn::seq()
            .add_fn(|xs| xs.to_kind(Kind::Float) / 255)
            .add(nn::conv2d(p / "c1", n_stack, 32, 8, Self::stride(4)))
            .add_fn(|xs| xs.relu())
            .add(nn::conv2d(p / "c2", 32, 64, 4, Self::stride(2)))
            .add_fn(|xs| xs.relu())
            .add(nn::conv2d(p / "c3", 64, 64, 3, Self::stride(1)))
            .add_fn(|xs| xs.relu().flat_view())
    }
}

impl SubModel for NatureCnn {
    type Config = NatureCnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        debug_assert_eq!(x.size()[1], self.n_stack);

        let feature = self.seq.forward(&x.to(self.device));
        debug_assert_eq!(feature.size().as_slice()[1], self.feature_dim);
        feature
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let n_stack = config.n_stack;
        let feature_dim = config.feature_dim;
        let device = var_store.device();
        let seq = Self::create_net(var_store, n_stack);

        Self {
            n_stack,
            feature_dim,
            device,
            seq,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        let seq = Self::create_net(var_store, self.n_stack);

        Self {
            n_stack: self.n_stack,
            feature_dim: self.feature_dim,
            device: var_store.device(),
            seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::nn::VarStore;

    #[test]
    fn feature_shape_for_dqn_input() {
        let var_store = VarStore::new(Device::Cpu);
        let cnn = NatureCnn::build(&var_store, NatureCnnConfig::new(4, 3136));

        let x = Tensor::zeros(&[2, 4, 84, 84], (Kind::Uint8, Device::Cpu));
        let feature = cnn.forward(&x);
        assert_eq!(feature.size(), &[2, 3136]);
    }
}
