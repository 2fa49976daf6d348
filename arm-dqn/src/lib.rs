//! Double DQN training for a simulated robotic arm.
//!
//! The workspace consists of the following crates:
//!
//! * [arm-dqn-core](arm_dqn_core) provides the traits shared by environments and
//!   agents, the bounded replay buffer, and the episodic training and evaluation
//!   drivers.
//! * [arm-dqn-candle-agent](arm_dqn_candle_agent) implements the Double DQN agent
//!   with [candle](https://crates.io/crates/candle-core).
//! * [arm-dqn-tensorboard](arm_dqn_tensorboard) writes training records which can be
//!   shown in Tensorboard.
//! * `arm-dqn-py-env` wraps the Python simulation of the arm. It is enabled with
//!   the `py-env` feature, which is also required by the `arm-dqn` binary.
//!
//! This crate bundles the configuration of a run ([`ArmDqnConfig`]), the
//! training and evaluation entry points ([`train`], [`eval`]), and the reward
//! history with its plots ([`RewardHistory`]).
pub mod config;
pub mod report;
pub mod run;

pub use config::ArmDqnConfig;
pub use report::RewardHistory;
pub use run::{eval, train, ArmDqnAgent, ArmReplayBuffer};
