//! Writes records of foosball experiments to TFRecord files read by Tensorboard.
use foosball_rl_core::record::{Record, RecordStorage, RecordValue, Recorder};
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
    storage: RecordStorage,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: "step".to_string(),
            storage: RecordStorage::new(),
        }
    }

    fn write_with_step(&mut self, record: &Record, step: usize) {
        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                // Infos like observations and timestamps are not plotted
                RecordValue::DateTime(_) | RecordValue::Array1(_) | RecordValue::String(_) => {}
            }
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write the scalar values of a [`Record`] with the step under the key `step`.
    ///
    /// Other variants are ignored.
    fn write(&mut self, record: Record) {
        match record.get_scalar(&self.step_key) {
            Ok(step) => self.write_with_step(&record, step as usize),
            Err(e) => warn!("Record without step is not written to Tensorboard: {}", e),
        }
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if !record.is_empty() {
            self.write_with_step(&record, step.max(0) as usize);
        }
        self.writer.flush();
    }
}
