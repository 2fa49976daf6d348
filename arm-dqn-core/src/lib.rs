#![warn(missing_docs)]
//! Core abstractions for training a Double DQN agent on a simulated robotic arm.
//!
//! The crate does not depend on any tensor backend. It defines the interfaces
//! between an environment ([`Env`]), a policy ([`Policy`]), a trainable agent
//! ([`Agent`]) and a replay buffer ([`ReplayBufferBase`]), together with the
//! episodic training driver ([`Trainer`]) and the evaluation driver
//! ([`DefaultEvaluator`]).
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, DiscreteAct, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase,
    Step, VecObs,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{EpisodeSummary, Trainer, TrainerConfig};
