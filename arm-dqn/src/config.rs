//! Run configuration of the `arm-dqn` binary.
use anyhow::Result;
use arm_dqn_candle_agent::{
    dqn::{DqnConfig, DqnModelConfig},
    mlp::MlpConfig,
    opt::OptimizerConfig,
};
use arm_dqn_core::{replay_buffer::ReplayBufferConfig, TrainerConfig};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Everything needed to train and evaluate an agent on an environment
/// configured by `C`.
///
/// The defaults reproduce the reference training run: a 6-dimensional state,
/// 8 actions, three hidden layers of 64 units, Adam with learning rate
/// `0.001`, a replay buffer of 10,000 transitions and 5,000 episodes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ArmDqnConfig<C> {
    /// Configuration of the environment used for training.
    pub env_config: C,

    /// Configuration of the agent.
    pub agent_config: DqnConfig<MlpConfig>,

    /// Configuration of the replay buffer.
    pub replay_buffer_config: ReplayBufferConfig,

    /// Configuration of the training loop.
    pub trainer_config: TrainerConfig,

    /// The number of episodes run by evaluation.
    pub n_eval_episodes: usize,

    /// Directory of the trained parameters, the reward history and the plots.
    pub model_dir: String,
}

impl<C: Default> Default for ArmDqnConfig<C> {
    fn default() -> Self {
        let model_config = DqnModelConfig::default()
            .q_config(MlpConfig::default())
            .opt_config(OptimizerConfig::Adam { lr: 0.001 });

        Self {
            env_config: C::default(),
            agent_config: DqnConfig::default().model_config(model_config),
            replay_buffer_config: ReplayBufferConfig::default(),
            trainer_config: TrainerConfig::default(),
            n_eval_episodes: 100,
            model_dir: "./model".to_string(),
        }
    }
}

impl<C> ArmDqnConfig<C>
where
    C: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the environment.
    pub fn env_config(mut self, v: C) -> Self {
        self.env_config = v;
        self
    }

    /// Sets the configuration of the agent.
    pub fn agent_config(mut self, v: DqnConfig<MlpConfig>) -> Self {
        self.agent_config = v;
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn replay_buffer_config(mut self, v: ReplayBufferConfig) -> Self {
        self.replay_buffer_config = v;
        self
    }

    /// Sets the configuration of the training loop.
    pub fn trainer_config(mut self, v: TrainerConfig) -> Self {
        self.trainer_config = v;
        self
    }

    /// Sets the number of evaluation episodes.
    pub fn n_eval_episodes(mut self, v: usize) -> Self {
        self.n_eval_episodes = v;
        self
    }

    /// Sets the output directory.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = v.into();
        self
    }

    /// Constructs [`ArmDqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load run config from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`ArmDqnConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save run config into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}
