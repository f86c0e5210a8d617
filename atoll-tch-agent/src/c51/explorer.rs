//! Exploration strategies of the C51 agent.
use serde::{Deserialize, Serialize};
use tch::Tensor;

/// Explorers for the C51 agent.
///
/// Both variants select the greedy action given the expected action
/// values, replacing it with a uniformly random action with probability
/// epsilon. Epsilon is a pure function of the call counter owned by the
/// explorer; there is no global schedule state.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum C51Explorer {
    /// Epsilon-greedy with linearly decaying epsilon.
    EpsilonGreedy(EpsilonGreedy),

    /// Epsilon-greedy with a fixed epsilon.
    ConstantEpsilonGreedy(ConstantEpsilonGreedy),
}

fn random_actions(q: &Tensor) -> Tensor {
    let n_procs = q.size()[0] as u32;
    let n_actions = q.size()[1] as u32;
    Tensor::from_slice(
        (0..n_procs)
            .map(|_| fastrand::u32(..n_actions) as i32)
            .collect::<Vec<_>>()
            .as_slice(),
    )
}

/// Epsilon-greedy explorer with linear decay.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Monotonic counter of [`EpsilonGreedy::action`] calls.
    pub n_calls: usize,
    /// Epsilon at the first call.
    pub eps_start: f64,
    /// Epsilon held after `final_step` calls.
    pub eps_final: f64,
    /// Number of calls over which epsilon decays.
    pub final_step: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs an epsilon-greedy explorer with default parameters.
    pub fn new() -> Self {
        Self {
            n_calls: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 100_000,
        }
    }

    /// Constructs an epsilon-greedy explorer with the given schedule.
    pub fn with_params(eps_start: f64, eps_final: f64, final_step: usize) -> C51Explorer {
        C51Explorer::EpsilonGreedy(Self {
            n_calls: 0,
            eps_start,
            eps_final,
            final_step,
        })
    }

    /// Epsilon at the given call count.
    ///
    /// Linear interpolation from `eps_start` to `eps_final` over
    /// `final_step` calls, constant afterwards.
    pub fn epsilon_at(&self, n_calls: usize) -> f64 {
        let fraction = (n_calls as f64 / self.final_step as f64).min(1.0);
        self.eps_start + fraction * (self.eps_final - self.eps_start)
    }

    /// Takes an action given the expected action values.
    pub fn action(&mut self, q: &Tensor) -> Tensor {
        let eps = self.epsilon_at(self.n_calls);
        self.n_calls += 1;

        if fastrand::f64() < eps {
            random_actions(q)
        } else {
            q.argmax(-1, true)
        }
    }
}

/// Epsilon-greedy explorer with a fixed epsilon, used during evaluation.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ConstantEpsilonGreedy {
    /// The probability of taking a random action.
    pub eps: f64,
}

impl ConstantEpsilonGreedy {
    /// Constructs a constant epsilon-greedy explorer.
    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    /// Takes an action given the expected action values.
    pub fn action(&mut self, q: &Tensor) -> Tensor {
        if fastrand::f64() < self.eps {
            random_actions(q)
        } else {
            q.argmax(-1, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_decay_endpoints_and_monotonicity() {
        let egreedy = EpsilonGreedy {
            n_calls: 0,
            eps_start: 1.0,
            eps_final: 0.1,
            final_step: 1000,
        };

        assert_eq!(egreedy.epsilon_at(0), 1.0);
        assert_eq!(egreedy.epsilon_at(1000), 0.1);
        assert_eq!(egreedy.epsilon_at(10_000), 0.1);

        let mut prev = egreedy.epsilon_at(0);
        for n in 1..=1000 {
            let eps = egreedy.epsilon_at(n);
            assert!(eps <= prev);
            prev = eps;
        }
    }

    #[test]
    fn zero_epsilon_is_greedy() {
        let mut explorer = ConstantEpsilonGreedy::new(0.0);
        let q = Tensor::from_slice(&[0.1f32, 0.9, 0.3]).unsqueeze(0);
        for _ in 0..20 {
            let a = explorer.action(&q);
            assert_eq!(a.int64_value(&[0, 0]), 1);
        }
    }

    #[test]
    fn unit_epsilon_is_uniformly_random() {
        let mut explorer = ConstantEpsilonGreedy::new(1.0);
        let q = Tensor::from_slice(&[0.1f32, 0.9, 0.3]).unsqueeze(0);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let a = explorer.action(&q);
            let a = a.int64_value(&[0]) as usize;
            assert!(a < 3);
            seen[a] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
