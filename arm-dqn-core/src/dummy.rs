//! A stub environment used for tests.
//!
//! [`CountdownEnv`] runs episodes of a fixed number of steps. Its state is a
//! vector filled with the fraction of the episode still remaining, and the
//! reward is `1` when the action equals `rewarded_action`, `0` otherwise.
use crate::{record::Record, DiscreteAct, Env, Step, VecObs};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration of [`CountdownEnv`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountdownEnvConfig {
    /// The number of steps after which an episode is truncated.
    pub episode_len: usize,

    /// Dimension of the state.
    pub state_dim: usize,

    /// The action for which the environment returns a reward of `1`.
    pub rewarded_action: usize,
}

impl Default for CountdownEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 50,
            state_dim: 6,
            rewarded_action: 0,
        }
    }
}

impl CountdownEnvConfig {
    /// Sets the length of an episode.
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the dimension of the state.
    pub fn state_dim(mut self, v: usize) -> Self {
        self.state_dim = v;
        self
    }

    /// Sets the rewarded action.
    pub fn rewarded_action(mut self, v: usize) -> Self {
        self.rewarded_action = v;
        self
    }
}

/// An environment with fixed-length episodes.
pub struct CountdownEnv {
    config: CountdownEnvConfig,
    t: usize,
    n_resets: usize,
}

impl CountdownEnv {
    /// Returns how many times the environment has been reset.
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }
}

impl Env for CountdownEnv {
    type Config = CountdownEnvConfig;
    type Obs = VecObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            n_resets: 0,
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.t = 0;
        self.n_resets += 1;
        Ok(())
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        let reward = if a.0 == self.config.rewarded_action {
            1.0
        } else {
            0.0
        };
        let is_truncated = self.t >= self.config.episode_len;
        let obs = self.high_level_state()?;
        let step = Step::new(obs, *a, reward, false, is_truncated, ());
        Ok((step, Record::empty()))
    }

    fn high_level_state(&self) -> Result<Self::Obs> {
        let len = self.config.episode_len.max(1) as f32;
        let remaining = self.config.episode_len.saturating_sub(self.t) as f32;
        Ok(VecObs(vec![remaining / len; self.config.state_dim]))
    }
}
