//! Dataset splits and batch sources
//!
//! A run consumes three splits: one training split per source task, the
//! few-shot target training split, and the target test split. Each split is
//! an ordered list of [`Batch`]es.

mod classes;
mod file;
mod synthetic;

pub use classes::{lookup_class_names, parse_class_names};
pub use file::{load_split, save_split, SafeTensorsDataset};
pub use synthetic::SyntheticClusters;

use ndarray::{concatenate, Array2, ArrayView2, Axis};

use crate::config::ExperimentConfig;
use crate::error::{Error, Result};

/// A batch of inputs with aligned integer labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Input rows, one example per row
    pub inputs: Array2<f32>,
    /// Class label per row
    pub labels: Vec<usize>,
}

impl Batch {
    /// Create a batch, checking that labels align with input rows.
    pub fn new(inputs: Array2<f32>, labels: Vec<usize>) -> Result<Self> {
        if inputs.nrows() != labels.len() {
            return Err(Error::shape("batch labels", &[inputs.nrows()], &[labels.len()]));
        }
        Ok(Self { inputs, labels })
    }

    /// Number of examples in the batch.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the batch has no examples.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of each input row.
    pub fn input_dim(&self) -> usize {
        self.inputs.ncols()
    }

    /// Input view for passing to an extractor.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.inputs.view()
    }
}

/// Concatenate batches into one, preserving row order.
///
/// Used to build the single-pass statistics batch from the target training
/// split.
pub fn concat_batches(batches: &[Batch]) -> Result<Batch> {
    let first = batches
        .first()
        .ok_or_else(|| Error::InvalidParameter("cannot concatenate an empty split".into()))?;

    let views: Vec<ArrayView2<'_, f32>> = batches.iter().map(Batch::view).collect();
    let inputs = concatenate(Axis(0), &views).map_err(|_| {
        let widths: Vec<usize> = batches.iter().map(Batch::input_dim).collect();
        Error::shape("split input width", &[first.input_dim()], &widths)
    })?;
    let labels = batches.iter().flat_map(|b| b.labels.iter().copied()).collect();

    Batch::new(inputs, labels)
}

/// Split one batch into consecutive batches of at most `batch_size` rows.
pub fn rebatch(batch: &Batch, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(Error::InvalidParameter("batch_size must be positive".into()));
    }

    batch
        .inputs
        .axis_chunks_iter(Axis(0), batch_size)
        .zip(batch.labels.chunks(batch_size))
        .map(|(inputs, labels)| Batch::new(inputs.to_owned(), labels.to_vec()))
        .collect()
}

/// Total number of rows across a split.
pub fn split_len(batches: &[Batch]) -> usize {
    batches.iter().map(Batch::len).sum()
}

/// All labels of a split in row order.
pub fn split_labels(batches: &[Batch]) -> Vec<usize> {
    batches.iter().flat_map(|b| b.labels.iter().copied()).collect()
}

/// The three splits of one experiment.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    /// One training split per source task
    pub source_train: Vec<Vec<Batch>>,
    /// Few-shot target training split
    pub target_train: Vec<Batch>,
    /// Target test split
    pub test: Vec<Batch>,
}

impl DatasetSplits {
    /// Number of source tasks.
    pub fn num_source_tasks(&self) -> usize {
        self.source_train.len()
    }

    /// Check that every label in the target splits is in `[0, num_classes)`.
    pub fn check_labels(&self, num_classes: usize) -> Result<()> {
        let labels = self.target_train.iter().chain(&self.test).flat_map(|b| b.labels.iter());
        for &label in labels {
            if label >= num_classes {
                return Err(Error::LabelOutOfRange { label, num_classes });
            }
        }
        Ok(())
    }
}

/// Dataset capability: produces the three splits for a configuration.
pub trait DatasetSource {
    /// Load or generate all splits.
    fn load(&self, config: &ExperimentConfig) -> Result<DatasetSplits>;
}
