//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes without learning.
///
/// The returned record holds the cumulative reward of each episode as
/// `"episode_rewards"` and their mean as `"mean_reward"`.
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self::from_env(E::build(config, seed)?, n_episodes))
    }

    /// Constructs a new [`DefaultEvaluator`] with an existing environment.
    pub fn from_env(env: E, n_episodes: usize) -> Self {
        Self { n_episodes, env }
    }

    /// Returns the environment used for evaluation.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn run_episode<P: Policy<E>>(&mut self, policy: &mut P) -> Result<f32> {
        self.env.reset()?;
        let mut cum_reward = 0f32;

        loop {
            let state = self.env.high_level_state()?;
            let act = policy.sample(&state)?;
            let (step, _) = self.env.step(&act)?;
            cum_reward += step.reward;
            if step.is_done() {
                break;
            }
        }

        Ok(cum_reward)
    }
}

impl<E: Env, P: Policy<E>> Evaluator<E, P> for DefaultEvaluator<E> {
    fn evaluate(&mut self, policy: &mut P) -> Result<Record> {
        let mut rewards = Vec::with_capacity(self.n_episodes);

        for episode in 0..self.n_episodes {
            let cum_reward = self.run_episode(policy)?;
            info!("Episode={}, reward={}", episode, cum_reward);
            rewards.push(cum_reward);
        }

        let mean = if rewards.is_empty() {
            0.0
        } else {
            rewards.iter().sum::<f32>() / rewards.len() as f32
        };
        let mut record = Record::from_scalar("mean_reward", mean);
        record.insert("episode_rewards", RecordValue::Array1(rewards));
        Ok(record)
    }
}
