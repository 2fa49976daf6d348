//! Configuration of DQN agent.
use super::{explorer::EpsilonGreedy, DqnModelConfig};
use crate::{
    util::{CriticLoss, OutDim},
    Device,
};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// How the target network follows the online network at each sync event.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum TargetUpdate {
    /// Copy all parameters.
    Hard,

    /// `target <- tau * online + (1 - tau) * target`
    Polyak {
        /// Interpolation coefficient.
        tau: f64,
    },
}

impl Default for TargetUpdate {
    fn default() -> Self {
        Self::Hard
    }
}

/// How a sampled batch is turned into gradient steps.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum UpdateMode {
    /// One gradient step on the mean loss over the batch.
    Batch,

    /// One gradient step per transition of the batch.
    PerTransition,
}

impl Default for UpdateMode {
    fn default() -> Self {
        Self::Batch
    }
}

/// Configuration of [`Dqn`](super::Dqn) agent.
///
/// `Q` is the configuration of the action-value function, e.g.
/// [`MlpConfig`](crate::mlp::MlpConfig).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q>
where
    Q: OutDim,
{
    /// Configuration of the online and target networks.
    pub model_config: DqnModelConfig<Q>,

    /// The number of transitions in a batch.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Epsilon-greedy explorer.
    pub explorer: EpsilonGreedy,

    /// Strategy of target network updates.
    pub target_update: TargetUpdate,

    /// Interval of target network updates in optimization steps.
    pub target_update_interval: usize,

    /// Interval of epsilon decay in optimization steps.
    pub decay_interval: usize,

    /// How a batch is used for gradient steps.
    pub update_mode: UpdateMode,

    /// Loss function of the action values.
    pub critic_loss: CriticLoss,

    /// Device on which the networks are placed.
    pub device: Device,

    /// Seed of the random number generator for exploration.
    pub seed: u64,
}

impl<Q> Default for DqnConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 64,
            discount_factor: 0.99,
            explorer: EpsilonGreedy::default(),
            target_update: TargetUpdate::default(),
            target_update_interval: 1000,
            decay_interval: 10,
            update_mode: UpdateMode::default(),
            critic_loss: CriticLoss::default(),
            device: Device::default(),
            seed: 42,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: DqnModelConfig<Q>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the number of transitions in a batch.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the strategy of target network updates.
    pub fn target_update(mut self, v: TargetUpdate) -> Self {
        self.target_update = v;
        self
    }

    /// Sets the interval of target network updates.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the interval of epsilon decay.
    pub fn decay_interval(mut self, v: usize) -> Self {
        self.decay_interval = v;
        self
    }

    /// Sets the update mode.
    pub fn update_mode(mut self, v: UpdateMode) -> Self {
        self.update_mode = v;
        self
    }

    /// Sets critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Sets the random seed for exploration.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`DqnConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}
