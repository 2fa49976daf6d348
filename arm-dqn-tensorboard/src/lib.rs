//! Writes training records to TFRecord files readable by Tensorboard.
use arm_dqn_core::record::{Record, RecordValue, Recorder};
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Key of the step value in records.
pub const STEP_KEY: &str = "episode";

/// Write records to TFRecord.
///
/// Each record must contain a scalar under [`STEP_KEY`], which is used as the
/// step of the other scalars in the record.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [`Record`] into a TFRecord.
    ///
    /// Only [`RecordValue::Scalar`] values are written.
    fn write(&mut self, record: Record) {
        let step = match record.get_scalar(STEP_KEY) {
            Ok(v) => v as usize,
            Err(e) => {
                warn!("Record without step is discarded: {}", e);
                return;
            }
        };

        for (k, v) in record.iter() {
            if k == STEP_KEY {
                continue;
            }
            if let RecordValue::Scalar(v) = v {
                self.writer.add_scalar(k, *v, step);
            }
        }
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}
