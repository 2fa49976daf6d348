//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::Policy;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Observations handled in this crate are flat real vectors, e.g. the
/// high-level state of the arm simulation consisting of the end-effector,
/// object and goal positions.
pub trait Obs: Clone + Debug {
    /// Returns the elements of the observation.
    fn as_slice(&self) -> &[f32];

    /// Returns the dimension of the observation.
    fn dim(&self) -> usize {
        self.as_slice().len()
    }
}

/// A discrete action of an environment.
pub trait Act: Clone + Debug {
    /// Returns the index of the action.
    fn index(&self) -> usize;

    /// Constructs an action from its index.
    fn from_index(ix: usize) -> Self;
}

/// An observation represented as a vector of `f32`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VecObs(pub Vec<f32>);

impl Obs for VecObs {
    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for VecObs {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// A discrete action, the index of a control command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteAct(pub usize);

impl Act for DiscreteAct {
    fn index(&self) -> usize {
        self.0
    }

    fn from_index(ix: usize) -> Self {
        Self(ix)
    }
}
