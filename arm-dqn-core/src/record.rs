//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - An enum representing the types of values in a record
//! * [`Recorder`] - A trait for writing records to an output destination
//! * [`BufferedRecorder`] - A recorder that keeps records in memory
//!
//! # Basic Usage
//!
//! ```rust
//! use arm_dqn_core::record::{Record, RecordValue};
//!
//! // following values are obtained with some process in reality
//! let episode = 1;
//! let reward = -1f32;
//! let state = vec![1f32, 2.0, 3.0, 4.0, 5.0, 6.0];
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(episode as f32));
//! record.insert("reward", RecordValue::Scalar(reward));
//! record.insert("state", RecordValue::Array1(state));
//! ```
mod base;
mod buffered_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use recorder::Recorder;
