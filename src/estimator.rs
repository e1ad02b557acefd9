//! The seam to the external inference engine.
//!
//! The model architecture, checkpoint tensors and forward pass live behind
//! `Estimator`; this tool only consumes the per-example prediction records
//! a frozen run exports. `ExportedPredictions` is the concrete backend:
//! it streams the records the training side wrote next to the snapshot.

use anyhow::{bail, Result};

use crate::config::RunConfig;
use crate::records::{RecordFile, RecordStream};

/// Input split designators understood by `input_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Eval,
    Predict,
}

/// The record store backing one input split.
pub fn input_source(config: &RunConfig, split: Split) -> Result<RecordFile> {
    match split {
        Split::Predict => Ok(RecordFile::open(&config.predict_input_path)),
        other => bail!("no input source for split {other:?} in a frozen run"),
    }
}

/// Lazy, finite, single-pass sequence of prediction records.
pub type PredictionStream = RecordStream;

/// A frozen model queried one example at a time.
pub trait Estimator {
    fn predict(&self, source: RecordFile) -> Result<PredictionStream>;
}

/// Backend that replays the prediction records exported by the training
/// run. Slotting a live inference engine in here is a matter of
/// implementing `Estimator` for it.
#[derive(Debug, Default)]
pub struct ExportedPredictions;

impl Estimator for ExportedPredictions {
    fn predict(&self, source: RecordFile) -> Result<PredictionStream> {
        source.stream()
    }
}

pub fn get_estimator(_config: &RunConfig) -> Result<Box<dyn Estimator>> {
    Ok(Box::new(ExportedPredictions))
}
