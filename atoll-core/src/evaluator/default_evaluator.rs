//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;

/// Runs a fixed number of episodes and reports return statistics.
///
/// The evaluator owns its environment instance, independent from the one
/// used for training, and each evaluation runs to completion before
/// control returns to the trainer. Per-episode returns are summarized as
/// mean, median and standard deviation.
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>,
    {
        let mut rs = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;

            loop {
                let act = policy.sample(&prev_obs);
                let (step, _) = self.env.step(&act);
                r_total += step.reward;
                if step.is_done {
                    break;
                }
                prev_obs = step.obs;
            }

            rs.push(r_total);
        }

        let mean = rs.iter().sum::<f32>() / rs.len() as f32;
        let median = {
            let mut sorted = rs.clone();
            sorted.sort_by(|x, y| x.total_cmp(y));
            sorted[sorted.len() / 2]
        };
        let stdev = (rs.iter().map(|r| (r - mean) * (r - mean)).sum::<f32>() / rs.len() as f32)
            .sqrt();

        let mut record = Record::from_slice(&[
            ("eval_return_mean", RecordValue::Scalar(mean)),
            ("eval_return_median", RecordValue::Scalar(median)),
            ("eval_return_stdev", RecordValue::Scalar(stdev)),
        ]);
        record.insert("eval_returns", RecordValue::Array1(rs));

        Ok(record)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a [`DefaultEvaluator`].
    ///
    /// `config` and `seed` are used to build the evaluation environment,
    /// `n_episodes` is the number of episodes per evaluation.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}
