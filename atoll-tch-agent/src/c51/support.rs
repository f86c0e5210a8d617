//! Fixed support of the return distribution.
use anyhow::Result;
use atoll_core::error::AtollError;
use serde::{Deserialize, Serialize};
use tch::{Device, Kind, Tensor};

/// The fixed, ordered set of return values (atoms) over which return
/// distributions are represented.
///
/// The atoms are `n_atoms` equally spaced values from `v_min` to `v_max`
/// inclusive, with spacing [`delta_z`](Support::delta_z). The support is
/// created once at construction and never mutated.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Support {
    v_min: f64,
    v_max: f64,
    n_atoms: i64,
}

impl Default for Support {
    /// The 51-atom support on `[-10, 10]` of the C51 paper.
    fn default() -> Self {
        Self {
            v_min: -10.0,
            v_max: 10.0,
            n_atoms: 51,
        }
    }
}

impl Support {
    /// Constructs a support of `n_atoms` values spanning `[v_min, v_max]`.
    pub fn new(v_min: f64, v_max: f64, n_atoms: i64) -> Result<Self> {
        let support = Self {
            v_min,
            v_max,
            n_atoms,
        };
        support.validate()?;
        Ok(support)
    }

    /// Checks the construction invariants of the support.
    ///
    /// Called by [`Support::new`]; also applied to deserialized
    /// configurations before a model is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.n_atoms < 2 {
            return Err(
                AtollError::ConfigError(format!("n_atoms must be >= 2, got {}", self.n_atoms))
                    .into(),
            );
        }
        if self.v_min >= self.v_max {
            return Err(AtollError::ConfigError(format!(
                "v_min ({}) must be less than v_max ({})",
                self.v_min, self.v_max
            ))
            .into());
        }
        Ok(())
    }

    /// Minimum return value.
    pub fn v_min(&self) -> f64 {
        self.v_min
    }

    /// Maximum return value.
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// Number of atoms.
    pub fn n_atoms(&self) -> i64 {
        self.n_atoms
    }

    /// Spacing between neighboring atoms.
    pub fn delta_z(&self) -> f64 {
        (self.v_max - self.v_min) / (self.n_atoms - 1) as f64
    }

    /// Returns the atoms as a `[n_atoms]` tensor on the given device.
    pub fn atoms(&self, device: Device) -> Tensor {
        Tensor::linspace(self.v_min, self.v_max, self.n_atoms, (Kind::Float, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn atoms_are_strictly_increasing_with_uniform_spacing() -> Result<()> {
        let support = Support::new(-10.0, 10.0, 51)?;
        let z = Vec::<f32>::try_from(&support.atoms(Device::Cpu)).unwrap();

        assert_eq!(z.len(), 51);
        assert_eq!(z[0], support.v_min() as f32);
        assert_eq!(z[50], support.v_max() as f32);

        let delta_z = support.delta_z() as f32;
        for w in z.windows(2) {
            assert!(w[1] > w[0]);
            assert!((w[1] - w[0] - delta_z).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn rejects_invalid_configurations() {
        assert!(Support::new(-1.0, 1.0, 1).is_err());
        assert!(Support::new(1.0, 1.0, 51).is_err());
        assert!(Support::new(2.0, -2.0, 51).is_err());
        assert!(Support::new(-1.0, 1.0, 2).is_ok());
    }
}
