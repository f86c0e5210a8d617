//! Samples experiences from the environment and pushes them into a
//! replay buffer.
use crate::{record::Record, Env, ExperienceBufferBase, Policy, StepProcessor};
use anyhow::Result;
use std::time::SystemTime;

/// Drives the interaction of a policy with the environment.
///
/// At every call of [`Sampler::sample_and_push`], the policy observes the
/// current state, selects an action, the environment steps, and the
/// resulting [`Step`](crate::Step) is converted into a transition by the
/// [`StepProcessor`] and pushed into the buffer. Episode boundaries are
/// handled internally: the environment is reset lazily and the processor
/// is re-armed with the initial observation of the next episode.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,

    /// Number of environment steps for computing frames per second.
    n_frames: usize,

    /// Time of the last reset of the fps counter.
    time: SystemTime,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler for the given environment and step processor.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            n_frames: 0,
            time: SystemTime::now(),
        }
    }

    /// Samples a transition and pushes it to the replay buffer.
    ///
    /// The return value is a [`Record`] with metrics the environment
    /// emitted at this step.
    pub fn sample_and_push<P_, R_>(&mut self, policy: &mut P_, buffer: &mut R_) -> Result<Record>
    where
        P_: Policy<E>,
        R_: ExperienceBufferBase<Item = P::Output>,
    {
        // Reset the environment if the episode was done in the previous step
        if self.prev_obs.is_none() {
            self.prev_obs = Some(self.env.reset()?);
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
        }

        // Sample an action and apply it to the environment
        let (step, record, is_done) = {
            let act = policy.sample(self.prev_obs.as_ref().unwrap());
            let (step, record) = self.env.step_with_reset(&act);
            let is_done = step.is_done;
            (step, record, is_done)
        };

        // Update previous observation
        self.prev_obs = match is_done {
            true => Some(step.init_obs.clone().expect("Failed to unwrap init_obs")),
            false => Some(step.obs.clone()),
        };

        // Produce and push the transition
        let transition = self.step_processor.process(step);
        buffer.push(transition)?;

        // Reset the step processor at an episode boundary
        if is_done {
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
        }

        self.n_frames += 1;

        Ok(record)
    }

    /// Returns frames per second since the last reset of the counter.
    pub fn fps(&self) -> f32 {
        match self.time.elapsed() {
            Ok(elapsed) => 1000. * self.n_frames as f32 / (elapsed.as_millis() as f32),
            Err(_) => 0.,
        }
    }

    /// Resets the fps counter.
    pub fn reset_fps_counter(&mut self) {
        self.n_frames = 0;
        self.time = SystemTime::now();
    }
}
