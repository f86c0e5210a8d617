//! Utilities.
use crate::model::ModelBase;
use anyhow::Result;
use atoll_core::record::{Record, RecordValue};
use log::trace;
use num_traits::cast::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use tch::{nn::VarStore, Tensor};

/// How the cross-entropy terms of a minibatch are reduced into the loss.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum BatchAccumulator {
    /// Sum over the minibatch.
    Sum,

    /// Mean over the minibatch.
    Mean,
}

/// Copies all variables of `src` into `dest`.
///
/// Variables are identified by their names. This is a hard update: the
/// destination becomes a full snapshot of the source, used to refresh a
/// target network from the online network.
pub fn sync<M: ModelBase>(dest: &mut M, src: &M) -> Result<()> {
    let src = src.get_var_store();
    dest.get_var_store_mut().copy(src)?;
    trace!("hard update");
    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Returns the mean and standard deviation of the parameters.
pub fn param_stats(var_store: &VarStore) -> Record {
    let mut record = Record::empty();

    for (k, v) in var_store.variables() {
        let m = f32::try_from(v.mean(tch::Kind::Float)).expect("Failed to convert Tensor to f32");
        let k_mean = format!("{}_mean", &k);
        record.insert(k_mean, RecordValue::Scalar(m));

        let m = f32::try_from(v.std(false)).expect("Failed to convert Tensor to f32");
        let k_std = format!("{}_std", k);
        record.insert(k_std, RecordValue::Scalar(m));
    }

    record
}

/// Converts a [`Vec`] to [`Tensor`].
pub fn vec_to_tensor<T1, T2>(v: Vec<T1>, add_batch_dim: bool) -> Tensor
where
    T1: AsPrimitive<T2>,
    T2: Copy + 'static + tch::kind::Element,
{
    let v = v.iter().map(|e| e.as_()).collect::<Vec<_>>();
    let t: Tensor = TryFrom::<Vec<T2>>::try_from(v).unwrap();

    match add_batch_dim {
        true => t.unsqueeze(0),
        false => t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn, Device};

    #[test]
    fn vec_to_tensor_adds_batch_dim() {
        let t = vec_to_tensor::<f32, f32>(vec![1.0, 2.0, 3.0], true);
        assert_eq!(t.size(), &[1, 3]);
    }

    #[test]
    fn param_stats_reports_mean_and_std_per_variable() {
        let var_store = nn::VarStore::new(Device::Cpu);
        let _ = nn::linear(&var_store.root() / "l1", 4, 2, Default::default());

        let record = param_stats(&var_store);
        assert!(record.get_scalar("l1.weight_mean").is_ok());
        assert!(record.get_scalar("l1.weight_std").is_ok());
    }
}
