//! C51 agent implemented with tch-rs.
use super::{config::C51Config, explorer::C51Explorer, model::C51Model, project_to_support, Support};
use crate::{
    model::{ModelBase, SubModel},
    util::{sync, BatchAccumulator, OutDim},
};
use anyhow::Result;
use atoll_core::{
    error::AtollError,
    record::{Record, RecordValue},
    Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryFrom, fs, marker::PhantomData, path::Path};
use tch::{no_grad, Device, Kind, Tensor};

/// C51 agent implemented with tch-rs.
///
/// The type parameter `F` is the feature extractor, mapping `F::Input`
/// to feature vectors; `M` is the distribution head, mapping feature
/// vectors to per-(action, atom) logits. The agent owns two
/// [`C51Model`]s: the online model trained by gradient steps, and the
/// target model, a lagged hard copy used only to compute backup targets.
pub struct C51<E, F, M, R>
where
    E: Env,
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<F::Input>,
    E::Act: From<Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<F::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    pub(in crate::c51) model: C51Model<F, M>,
    pub(in crate::c51) model_tgt: C51Model<F, M>,
    pub(in crate::c51) support: Support,
    pub(in crate::c51) z: Tensor,
    pub(in crate::c51) discount_factor: f64,
    pub(in crate::c51) batch_size: usize,
    pub(in crate::c51) min_transitions_warmup: usize,
    pub(in crate::c51) target_update_interval: usize,
    pub(in crate::c51) target_update_counter: usize,
    pub(in crate::c51) n_updates_per_opt: usize,
    pub(in crate::c51) double_dqn: bool,
    pub(in crate::c51) batch_accumulator: BatchAccumulator,
    pub(in crate::c51) explorer: C51Explorer,
    pub(in crate::c51) eval_epsilon: f64,
    pub(in crate::c51) train: bool,
    pub(in crate::c51) device: Device,
    pub(in crate::c51) n_opts: usize,
    pub(in crate::c51) phantom: PhantomData<(E, R)>,
}

impl<E, F, M, R> C51<E, F, M, R>
where
    E: Env,
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<F::Input>,
    E::Act: From<Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<F::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    /// Expected action values under the given distributions.
    ///
    /// `probs` has the shape `[batch_size, n_actions, n_atoms]`; the
    /// result is `[batch_size, n_actions]`.
    fn expected_values(&self, probs: &Tensor) -> Tensor {
        (probs * self.z.view((1, 1, -1))).sum_dim_intlist(&[-1][..], false, Kind::Float)
    }

    fn update_critic(&mut self, buffer: &mut R) -> Result<f32> {
        trace!("C51::update_critic()");
        let batch = buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_done) = batch.unpack();
        let obs = obs.into();
        let act = act.into().to(self.device);
        let next_obs = next_obs.into();
        let reward = Tensor::from_slice(&reward[..]).to(self.device).unsqueeze(-1);
        let is_done = Tensor::from_slice(&is_done[..])
            .to_kind(Kind::Float)
            .to(self.device)
            .unsqueeze(-1);
        let not_done: Tensor = 1 - is_done;

        let batch_size = self.batch_size as i64;
        let n_atoms = self.support.n_atoms();

        debug_assert_eq!(reward.size().as_slice(), &[batch_size, 1]);
        debug_assert_eq!(not_done.size().as_slice(), &[batch_size, 1]);
        debug_assert_eq!(act.size().as_slice(), &[batch_size, 1]);

        // Projected target distribution over the support
        let m = no_grad(|| {
            let probs_tgt = self.model_tgt.forward(&next_obs);

            // Greedy next action by expected value; the distribution is
            // always taken from the target network.
            let a_next = if self.double_dqn {
                let probs_online = self.model.forward(&next_obs);
                self.expected_values(&probs_online).argmax(-1, false)
            } else {
                self.expected_values(&probs_tgt).argmax(-1, false)
            };
            let ix = a_next.view((batch_size, 1, 1)).repeat(&[1, 1, n_atoms]);
            let next_probs = probs_tgt.gather(1, &ix, false).squeeze_dim(1);
            debug_assert_eq!(next_probs.size().as_slice(), &[batch_size, n_atoms]);

            project_to_support(
                &next_probs,
                &reward,
                &not_done,
                self.discount_factor,
                &self.support,
            )
        });

        // Log-probabilities of the taken actions under the online network
        let log_p = self.model.forward_logits(&obs).log_softmax(-1, Kind::Float);
        let ix = act.view((batch_size, 1, 1)).repeat(&[1, 1, n_atoms]);
        let log_p_a = log_p.gather(1, &ix, false).squeeze_dim(1);
        debug_assert_eq!(log_p_a.size().as_slice(), &[batch_size, n_atoms]);

        // Cross-entropy against the projected target
        let ce = -(m * log_p_a).sum_dim_intlist(&[-1][..], false, Kind::Float);
        let loss = match self.batch_accumulator {
            BatchAccumulator::Sum => ce.sum(Kind::Float),
            BatchAccumulator::Mean => ce.mean(Kind::Float),
        };

        self.model.backward_step(&loss);

        let loss = f32::try_from(&loss)?;
        if !loss.is_finite() {
            return Err(AtollError::NumericalInstability {
                opt_steps: self.n_opts,
                loss,
            }
            .into());
        }

        Ok(loss)
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let mut loss_critic = 0f32;

        for _ in 0..self.n_updates_per_opt {
            loss_critic += self.update_critic(buffer)?;
        }

        self.target_update_counter += 1;
        if self.target_update_counter == self.target_update_interval {
            self.target_update_counter = 0;
            sync(&mut self.model_tgt, &self.model)?;
            trace!("hard update of the target model");
        }

        loss_critic /= self.n_updates_per_opt as f32;

        self.n_opts += 1;

        Ok(Record::from_slice(&[(
            "loss_critic",
            RecordValue::Scalar(loss_critic),
        )]))
    }
}

impl<E, F, M, R> Policy<E> for C51<E, F, M, R>
where
    E: Env,
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<F::Input>,
    E::Act: From<Tensor>,
    F::Config: DeserializeOwned + Serialize,
    M::Config: DeserializeOwned + Serialize + OutDim,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<F::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    /// Samples an action for the given observation.
    ///
    /// The greedy action maximizes the expected value of the learned
    /// return distribution. In training mode the explorer may replace it
    /// with a random action; in evaluation mode a fixed small epsilon is
    /// used.
    fn sample(&mut self, obs: &E::Obs) -> E::Act {
        no_grad(|| {
            let probs = self.model.forward(&obs.clone().into());
            let q = self.expected_values(&probs);

            let a = if self.train {
                match &mut self.explorer {
                    C51Explorer::EpsilonGreedy(egreedy) => egreedy.action(&q),
                    C51Explorer::ConstantEpsilonGreedy(egreedy) => egreedy.action(&q),
                }
            } else {
                if fastrand::f64() < self.eval_epsilon {
                    let n_actions = q.size()[1];
                    Tensor::from(fastrand::i64(0..n_actions))
                } else {
                    q.argmax(-1, true)
                }
            };

            a.into()
        })
    }
}

impl<E, F, M, R> Configurable<E> for C51<E, F, M, R>
where
    E: Env,
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<F::Input>,
    E::Act: From<Tensor>,
    F::Config: DeserializeOwned + Serialize + Clone,
    M::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<F::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    type Config = C51Config<F, M>;

    /// Constructs a C51 agent.
    fn build(config: Self::Config) -> Self {
        let device: Device = config
            .device
            .expect("No device is given for C51 agent")
            .into();
        config
            .support
            .validate()
            .expect("Invalid support configuration");
        let model =
            C51Model::build(config.model_config, device).expect("Failed to build C51 model");
        let model_tgt = model.clone();
        let z = config.support.atoms(device);

        C51 {
            model,
            model_tgt,
            support: config.support,
            z,
            discount_factor: config.discount_factor,
            batch_size: config.batch_size,
            min_transitions_warmup: config.min_transitions_warmup,
            target_update_interval: config.target_update_interval,
            target_update_counter: 0,
            n_updates_per_opt: config.n_updates_per_opt,
            double_dqn: config.double_dqn,
            batch_accumulator: config.batch_accumulator,
            explorer: config.explorer,
            eval_epsilon: config.eval_epsilon,
            train: config.train,
            device,
            n_opts: 0,
            phantom: PhantomData,
        }
    }
}

impl<E, F, M, R> Agent<E, R> for C51<E, F, M, R>
where
    E: Env,
    F: SubModel<Output = Tensor>,
    M: SubModel<Input = Tensor, Output = Tensor>,
    R: ExperienceBufferBase + ReplayBufferBase,
    E::Obs: Into<F::Input>,
    E::Act: From<Tensor>,
    F::Config: DeserializeOwned + Serialize + Clone,
    M::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<F::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record> {
        if buffer.len() >= self.min_transitions_warmup {
            self.opt_(buffer)
        } else {
            Ok(Record::empty())
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.model.save(&path.join("model.pt").as_path())?;
        self.model_tgt
            .save(&path.join("model_tgt.pt").as_path())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.model.load(&path.join("model.pt").as_path())?;
        self.model_tgt
            .load(&path.join("model_tgt.pt").as_path())?;
        Ok(())
    }
}
