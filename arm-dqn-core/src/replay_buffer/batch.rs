//! Transitions and batches of transitions.
use crate::{Env, Step};
use std::slice::Iter;

/// A transition `(o_t, a_t, r_t, o_t+1)` of one environment step.
///
/// The fields are not mutable once the transition is created.
/// The termination flags of the step are kept for diagnostics; the DQN target
/// computation does not use them.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    state: O,
    action: A,
    reward: f32,
    next_state: O,
    is_terminated: bool,
    is_truncated: bool,
}

impl<O, A> Transition<O, A> {
    /// Constructs a transition.
    pub fn new(state: O, action: A, reward: f32, next_state: O) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            is_terminated: false,
            is_truncated: false,
        }
    }

    /// Constructs a transition from the state before the step and the step itself.
    pub fn from_step<E>(state: O, step: Step<E>) -> Self
    where
        E: Env<Obs = O, Act = A>,
    {
        Self {
            state,
            action: step.act,
            reward: step.reward,
            next_state: step.obs,
            is_terminated: step.is_terminated,
            is_truncated: step.is_truncated,
        }
    }

    /// Returns `o_t`.
    pub fn state(&self) -> &O {
        &self.state
    }

    /// Returns `a_t`.
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Returns `r_t`.
    pub fn reward(&self) -> f32 {
        self.reward
    }

    /// Returns `o_t+1`.
    pub fn next_state(&self) -> &O {
        &self.next_state
    }

    /// Returns if the episode terminated at this step.
    pub fn is_terminated(&self) -> bool {
        self.is_terminated
    }

    /// Returns if the episode was truncated at this step.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }
}

/// A batch of transitions sampled from a replay buffer.
#[derive(Clone, Debug)]
pub struct TransitionBatch<O, A> {
    transitions: Vec<Transition<O, A>>,
}

impl<O, A> TransitionBatch<O, A> {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Returns an iterator over the transitions.
    pub fn iter(&self) -> Iter<'_, Transition<O, A>> {
        self.transitions.iter()
    }

    /// Returns the transitions as a slice.
    pub fn as_slice(&self) -> &[Transition<O, A>] {
        &self.transitions
    }

    /// Returns the rewards `r_t`.
    pub fn rewards(&self) -> Vec<f32> {
        self.transitions.iter().map(|tr| tr.reward).collect()
    }
}

impl<O, A> From<Vec<Transition<O, A>>> for TransitionBatch<O, A> {
    fn from(transitions: Vec<Transition<O, A>>) -> Self {
        Self { transitions }
    }
}

impl<O, A> IntoIterator for TransitionBatch<O, A> {
    type Item = Transition<O, A>;
    type IntoIter = std::vec::IntoIter<Transition<O, A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.into_iter()
    }
}
