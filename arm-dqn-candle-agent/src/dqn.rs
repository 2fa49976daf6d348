//! Double DQN agent.
mod base;
mod config;
mod explorer;
mod model;
pub use base::{Dqn, QNET_FILE_NAME};
pub use config::{DqnConfig, TargetUpdate, UpdateMode};
pub use explorer::{EpsilonDecay, EpsilonGreedy};
pub use model::{DqnModel, DqnModelConfig};
