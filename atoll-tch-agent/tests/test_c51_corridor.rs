//! Drives the C51 agent end-to-end on a deterministic toy environment.
use anyhow::Result;
use atoll_core::{
    generic_replay_buffer::{
        SimpleReplayBuffer, SimpleReplayBufferConfig, SimpleStepProcessor,
        SimpleStepProcessorConfig,
    },
    record::{AggregateRecorder, NullRecorder, Record},
    Act, Agent, Configurable, DefaultEvaluator, Env, Evaluator, Obs, Policy, Step, Trainer,
    TrainerConfig,
};
use atoll_tch_agent::{
    c51::{C51, C51Config, C51ModelConfig, EpsilonGreedy, Support},
    head::{DistributionHeadConfig, DuelingDistributionHead},
    model::SubModel,
    opt::OptimizerConfig,
    util::vec_to_tensor,
    TensorBatch,
};
use serde::{Deserialize, Serialize};
use tch::{nn, Tensor};

const LENGTH: i64 = 8;
const MAX_STEPS: usize = 32;

#[derive(Clone, Debug)]
struct CorridorObs(Vec<f32>);

impl Obs for CorridorObs {
    fn len(&self) -> usize {
        1
    }
}

impl From<CorridorObs> for Tensor {
    fn from(obs: CorridorObs) -> Tensor {
        vec_to_tensor::<f32, f32>(obs.0, true)
    }
}

impl From<CorridorObs> for TensorBatch<f32> {
    fn from(obs: CorridorObs) -> Self {
        TensorBatch::from_tensor(obs.into())
    }
}

#[derive(Clone, Debug)]
struct CorridorAct(i64);

impl Act for CorridorAct {
    fn len(&self) -> usize {
        1
    }
}

impl From<Tensor> for CorridorAct {
    fn from(t: Tensor) -> Self {
        Self(t.flatten(0, -1).int64_value(&[0]))
    }
}

impl From<CorridorAct> for TensorBatch<i64> {
    fn from(act: CorridorAct) -> Self {
        TensorBatch::from_tensor(Tensor::from_slice(&[act.0]).unsqueeze(0))
    }
}

#[derive(Clone)]
struct CorridorConfig;

/// A 1-dimensional corridor. Action 1 moves right, action 0 moves left;
/// reaching the right end yields reward 1 and terminates the episode.
struct CorridorEnv {
    pos: i64,
    steps: usize,
}

impl CorridorEnv {
    fn obs(&self) -> CorridorObs {
        let mut one_hot = vec![0f32; LENGTH as usize];
        one_hot[self.pos as usize] = 1.0;
        CorridorObs(one_hot)
    }
}

impl Env for CorridorEnv {
    type Config = CorridorConfig;
    type Obs = CorridorObs;
    type Act = CorridorAct;
    type Info = ();

    fn build(_config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self { pos: 0, steps: 0 })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.pos = 0;
        self.steps = 0;
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        self.pos = (self.pos + if a.0 == 1 { 1 } else { -1 }).clamp(0, LENGTH - 1);
        self.steps += 1;

        let reached = self.pos == LENGTH - 1;
        let reward = if reached { 1.0 } else { 0.0 };
        let is_done = reached || self.steps >= MAX_STEPS;

        let step = Step::new(self.obs(), a.clone(), reward, is_done, (), None);
        (step, Record::empty())
    }

    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (mut step, record) = self.step(a);
        if step.is_done {
            step.init_obs = Some(self.reset().expect("Failed to reset CorridorEnv"));
        }
        (step, record)
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
struct IdentityEncoderConfig {}

/// Passes the one-hot observation through as the feature vector.
struct IdentityEncoder {}

impl SubModel for IdentityEncoder {
    type Config = IdentityEncoderConfig;
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

type ObsBatch = TensorBatch<f32>;
type ActBatch = TensorBatch<i64>;
type ReplayBuffer = SimpleReplayBuffer<ObsBatch, ActBatch>;
type StepProc = SimpleStepProcessor<CorridorEnv, ObsBatch, ActBatch>;
type Agent_ = C51<CorridorEnv, IdentityEncoder, DuelingDistributionHead, ReplayBuffer>;

fn agent_config() -> C51Config<IdentityEncoder, DuelingDistributionHead> {
    let model_config = C51ModelConfig::default()
        .f_config(IdentityEncoderConfig {})
        .m_config(DistributionHeadConfig::new(LENGTH, 32, 2, 11))
        .opt_config(OptimizerConfig::Adam { lr: 1e-3 });

    C51Config::default()
        .model_config(model_config)
        .support(Support::new(0.0, 1.0, 11).unwrap())
        .discount_factor(0.95)
        .batch_size(8)
        .min_transitions_warmup(16)
        .target_update_interval(4)
        .explorer(EpsilonGreedy::with_params(1.0, 0.1, 100))
        .eval_epsilon(0.0)
        .device(tch::Device::Cpu)
}

#[test]
fn train_c51_on_corridor() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let env_config = CorridorConfig;
    let trainer_config = TrainerConfig::default()
        .max_opts(50)
        .opt_interval(1)
        .eval_interval(25)
        .record_agent_info_interval(10)
        .flush_record_interval(25)
        .warmup_period(16);

    let mut trainer = Trainer::<CorridorEnv, StepProc, ReplayBuffer>::build(
        trainer_config,
        env_config.clone(),
        SimpleStepProcessorConfig::default(),
        SimpleReplayBufferConfig::default().capacity(256).seed(42),
    );

    let mut agent = Agent_::build(agent_config());
    let mut recorder: Box<dyn AggregateRecorder> = Box::new(NullRecorder {});
    let mut evaluator = DefaultEvaluator::<CorridorEnv>::new(&env_config, 0, 2)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;
    Ok(())
}

#[test]
fn evaluation_reports_return_statistics() -> Result<()> {
    let env_config = CorridorConfig;
    let mut agent = Agent_::build(agent_config());
    agent.eval();

    let mut evaluator = DefaultEvaluator::<CorridorEnv>::new(&env_config, 0, 3)?;
    let record = evaluator.evaluate(&mut agent)?;

    let mean = record.get_scalar("eval_return_mean")?;
    let median = record.get_scalar("eval_return_median")?;
    let stdev = record.get_scalar("eval_return_stdev")?;
    let returns = record.get_array1("eval_returns")?;

    assert_eq!(returns.len(), 3);
    // The corridor pays at most 1 per episode
    assert!(mean >= 0.0 && mean <= 1.0);
    assert!(median >= 0.0 && median <= 1.0);
    assert!(stdev >= 0.0);
    Ok(())
}

#[test]
fn sampled_actions_are_in_the_action_space() -> Result<()> {
    let mut agent = Agent_::build(agent_config());
    agent.train();

    let mut env = CorridorEnv::build(&CorridorConfig, 0)?;
    let mut obs = env.reset()?;
    for _ in 0..20 {
        let act = agent.sample(&obs);
        assert!(act.0 == 0 || act.0 == 1);
        let (step, _) = env.step_with_reset(&act);
        obs = match step.is_done {
            true => step.init_obs.unwrap(),
            false => step.obs,
        };
    }
    Ok(())
}
