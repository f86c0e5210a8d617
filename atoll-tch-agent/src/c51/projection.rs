//! Categorical projection of the Bellman backup onto a fixed support.
use super::Support;
use tch::{Kind, Tensor};

/// Projects the distributional Bellman backup onto the fixed support.
///
/// Given the next-state return distribution `next_probs` of the greedy
/// next action, the backup shifts every atom `z[j]` to
/// `Tz[j] = r + gamma * z[j]` (only `r` when the transition is terminal)
/// and redistributes its probability mass onto the fixed atoms: `Tz[j]`
/// is clipped into `[v_min, v_max]`, located at the fractional index
/// `b = (Tz[j] - v_min) / delta_z`, and its mass is split between the
/// neighboring atoms `floor(b)` and `ceil(b)` proportionally to
/// proximity. An exact hit puts the whole mass into the single atom, so
/// total mass is preserved and clipping saturates the edge atoms.
///
/// * `next_probs` - Target distributions, `[batch_size, n_atoms]`.
/// * `reward` - Rewards, `[batch_size, 1]`.
/// * `not_done` - `1 - done` flags, `[batch_size, 1]`.
///
/// Returns the projected distributions, `[batch_size, n_atoms]`.
pub fn project_to_support(
    next_probs: &Tensor,
    reward: &Tensor,
    not_done: &Tensor,
    gamma: f64,
    support: &Support,
) -> Tensor {
    let z = support.atoms(next_probs.device());
    let n_atoms = support.n_atoms();
    debug_assert_eq!(next_probs.size().len(), 2);
    debug_assert_eq!(next_probs.size()[1], n_atoms);

    // Shifted atom values, clipped into the support
    let tz = (reward + not_done * (gamma * &z).unsqueeze(0))
        .clamp(support.v_min(), support.v_max());

    // Fractional position of each shifted atom on the support. The
    // clamp guards against floating-point overshoot past the last atom.
    let b = ((tz - support.v_min()) / support.delta_z()).clamp(0.0, (n_atoms - 1) as f64);
    let lo = b.floor();
    let hi = b.ceil();

    // Proximity-weighted mass splitting. When lo == hi (exact hit), both
    // weights vanish, so the mask routes the full mass to the single bin.
    let eq = hi.eq_tensor(&lo).to_kind(Kind::Float);
    let m_lo = next_probs * (&hi - &b + eq);
    let m_hi = next_probs * (&b - &lo);

    Tensor::zeros_like(next_probs)
        .scatter_add(-1, &lo.to_kind(Kind::Int64), &m_lo)
        .scatter_add(-1, &hi.to_kind(Kind::Int64), &m_hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::convert::TryFrom;

    fn project(
        next_probs: &[f32],
        reward: f32,
        done: bool,
        gamma: f64,
        support: &Support,
    ) -> Vec<f32> {
        let p = Tensor::from_slice(next_probs).unsqueeze(0);
        let r = Tensor::from_slice(&[reward]).unsqueeze(0);
        let nd = Tensor::from_slice(&[1.0f32 - done as i64 as f32]).unsqueeze(0);
        let m = project_to_support(&p, &r, &nd, gamma, support);
        Vec::<f32>::try_from(&m.squeeze_dim(0)).unwrap()
    }

    fn assert_close(got: &[f32], want: &[f32]) {
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < 1e-6, "got {:?}, want {:?}", got, want);
        }
    }

    #[test]
    fn exact_hit_is_not_smoothed() -> Result<()> {
        let support = Support::new(-1.0, 1.0, 3)?;
        let m = project(&[0.0, 1.0, 0.0], 0.0, false, 1.0, &support);
        assert_close(&m, &[0.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn fractional_position_splits_mass() -> Result<()> {
        let support = Support::new(-1.0, 1.0, 3)?;
        // Tz = 0.5 lands between z[1] = 0 and z[2] = 1 at b = 1.5
        let m = project(&[0.0, 1.0, 0.0], 0.5, false, 1.0, &support);
        assert_close(&m, &[0.0, 0.5, 0.5]);
        Ok(())
    }

    #[test]
    fn preserves_total_mass() -> Result<()> {
        let support = Support::new(-10.0, 10.0, 51)?;
        let batch_size = 32;
        let p = Tensor::rand(&[batch_size, 51], tch::kind::FLOAT_CPU).softmax(-1, Kind::Float);
        let r = Tensor::rand(&[batch_size, 1], tch::kind::FLOAT_CPU) * 4.0 - 2.0;
        let nd = Tensor::ones(&[batch_size, 1], tch::kind::FLOAT_CPU);

        let m = project_to_support(&p, &r, &nd, 0.99, &support);
        let sums = Vec::<f32>::try_from(&m.sum_dim_intlist(&[-1][..], false, Kind::Float)).unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn saturates_at_the_boundary_atoms() -> Result<()> {
        let support = Support::new(-1.0, 1.0, 3)?;
        let p = [0.3f32, 0.4, 0.3];

        // r + gamma * z[j] > v_max for all j: everything clips to the top atom
        let m = project(&p, 10.0, false, 1.0, &support);
        assert_close(&m, &[0.0, 0.0, 1.0]);

        // symmetric at the bottom
        let m = project(&p, -10.0, false, 1.0, &support);
        assert_close(&m, &[1.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn terminal_projection_ignores_future_atoms() -> Result<()> {
        let support = Support::new(-1.0, 1.0, 3)?;

        // done = true: Tz = r for every atom, so the result depends only
        // on the reward, not on p' or gamma
        let m1 = project(&[1.0, 0.0, 0.0], 0.3, true, 0.9, &support);
        let m2 = project(&[0.1, 0.2, 0.7], 0.3, true, 0.0, &support);
        assert_close(&m1, &m2);
        assert_close(&m1, &[0.0, 0.7, 0.3]);
        Ok(())
    }
}
