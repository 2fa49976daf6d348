//! Bounded FIFO replay buffer with uniform sampling.
mod base;
mod batch;
mod config;
pub use base::ReplayBuffer;
pub use batch::{Transition, TransitionBatch};
pub use config::ReplayBufferConfig;
