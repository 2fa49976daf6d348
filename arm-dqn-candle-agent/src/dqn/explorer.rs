//! Exploration strategy of DQN.
use anyhow::Result;
use candle_core::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How epsilon decreases at each decay event.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum EpsilonDecay {
    /// `epsilon <- epsilon * rate`
    Exponential {
        /// Multiplicative decay rate.
        rate: f64,
    },

    /// `epsilon <- epsilon - step`
    Linear {
        /// Subtracted amount.
        step: f64,
    },
}

impl Default for EpsilonDecay {
    fn default() -> Self {
        Self::Exponential { rate: 0.999 }
    }
}

/// Epsilon-greedy explorer for DQN.
///
/// `epsilon` starts from `eps_start` and never goes below `eps_min`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Current probability of taking a random action.
    pub epsilon: f64,

    /// Lower bound of epsilon.
    pub eps_min: f64,

    /// Decay strategy.
    pub decay: EpsilonDecay,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            eps_min: 0.1,
            decay: EpsilonDecay::default(),
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.epsilon = v.min(1.0).max(self.eps_min);
        self
    }

    /// Set the lower bound of epsilon.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self.epsilon = self.epsilon.max(v);
        self
    }

    /// Set the decay strategy.
    pub fn decay(mut self, v: EpsilonDecay) -> Self {
        self.decay = v;
        self
    }

    /// Decays epsilon once, clamped at `eps_min`.
    pub fn decay_epsilon(&mut self) {
        let eps = match self.decay {
            EpsilonDecay::Exponential { rate } => self.epsilon * rate,
            EpsilonDecay::Linear { step } => self.epsilon - step,
        };
        self.epsilon = eps.max(self.eps_min);
    }

    /// Sets epsilon to its lower bound.
    pub fn set_epsilon_min(&mut self) {
        self.epsilon = self.eps_min;
    }

    /// Takes an action based on the action values of a single state.
    ///
    /// * `q` - action values with `n_actions` elements, in any shape.
    pub fn action(&self, q: &Tensor, rng: &mut impl Rng) -> Result<usize> {
        let q = q.flatten_all()?;
        let n_actions = q.dims1()?;

        if rng.gen::<f64>() < self.epsilon {
            Ok(rng.gen_range(0..n_actions))
        } else {
            Ok(q.argmax(0)?.to_scalar::<u32>()? as usize)
        }
    }
}
