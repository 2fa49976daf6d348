//! Wrapper of the robotic arm simulation implemented in Python.
//!
//! [`Hw2Env`] drives a Python object exposing `reset()`, `step(action)` and
//! `high_level_state()`, by default the class `Hw2Env` of module `homework2`.
//! `step` returns a tuple `(next_state, reward, is_terminal, is_truncated)`;
//! states are array-likes convertible with `numpy.asarray`.
mod base;
mod config;
pub use base::Hw2Env;
pub use config::Hw2EnvConfig;
