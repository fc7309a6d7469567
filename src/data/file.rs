//! Pre-extracted splits stored as SafeTensors files.
//!
//! Each file holds an `inputs` tensor (N×I, float) and a `labels` tensor
//! (N, integer or float holding integral values).

use ndarray::Array2;
use std::path::{Path, PathBuf};

use super::{rebatch, Batch, DatasetSource, DatasetSplits};
use crate::config::{DataConfig, ExperimentConfig};
use crate::error::{Error, Result};
use crate::io::{read_tensors, write_tensors, TensorData};

const INPUTS: &str = "inputs";
const LABELS: &str = "labels";

/// Load one split from a SafeTensors file and cut it into batches.
pub fn load_split(path: impl AsRef<Path>, batch_size: usize) -> Result<Vec<Batch>> {
    let path = path.as_ref();
    let mut tensors = read_tensors(path)?;

    let missing = |name: &str| Error::Serialization {
        message: format!("{} has no '{name}' tensor", path.display()),
    };
    let inputs = tensors.remove(INPUTS).ok_or_else(|| missing(INPUTS))?;
    let labels = tensors.remove(LABELS).ok_or_else(|| missing(LABELS))?;

    let [rows, cols] = inputs.shape[..] else {
        return Err(Error::shape(format!("{} inputs", path.display()), &[0, 0], &inputs.shape));
    };
    let inputs = Array2::from_shape_vec((rows, cols), inputs.data.into_f32())
        .map_err(|e| Error::Serialization { message: format!("inputs tensor: {e}") })?;

    let not_index = |v: &dyn std::fmt::Display| Error::Serialization {
        message: format!("{}: label {v} is not a class index", path.display()),
    };
    let labels = match labels.data {
        TensorData::I64(values) => values
            .into_iter()
            .map(|v| usize::try_from(v).map_err(|_| not_index(&v)))
            .collect::<Result<Vec<_>>>()?,
        TensorData::F32(values) => values
            .into_iter()
            .map(|v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(not_index(&v))
                }
            })
            .collect::<Result<Vec<_>>>()?,
    };

    rebatch(&Batch::new(inputs, labels)?, batch_size)
}

/// Write a split to a SafeTensors file.
pub fn save_split(path: impl AsRef<Path>, batch: &Batch) -> Result<()> {
    let shape = vec![batch.inputs.nrows(), batch.inputs.ncols()];
    let inputs: Vec<f32> = batch.inputs.iter().copied().collect();
    let labels: Vec<i64> = batch.labels.iter().map(|&l| l as i64).collect();

    write_tensors(
        path,
        &[
            (INPUTS.to_string(), shape, TensorData::F32(inputs)),
            (LABELS.to_string(), vec![batch.len()], TensorData::I64(labels)),
        ],
    )
}

/// Dataset source reading each split from its own file.
#[derive(Debug, Clone)]
pub struct SafeTensorsDataset {
    source_train: Vec<PathBuf>,
    target_train: PathBuf,
    test: PathBuf,
}

impl SafeTensorsDataset {
    /// Create a dataset source from explicit paths.
    pub fn new(source_train: Vec<PathBuf>, target_train: PathBuf, test: PathBuf) -> Self {
        Self { source_train, target_train, test }
    }

    /// Build from the `data` section of a configuration.
    pub fn from_config(data: &DataConfig) -> Option<Self> {
        match data {
            DataConfig::Safetensors { source_train, target_train, test } => {
                Some(Self::new(source_train.clone(), target_train.clone(), test.clone()))
            }
            DataConfig::Synthetic => None,
        }
    }
}

impl DatasetSource for SafeTensorsDataset {
    fn load(&self, config: &ExperimentConfig) -> Result<DatasetSplits> {
        let source_train = self
            .source_train
            .iter()
            .map(|p| load_split(p, config.batch_size))
            .collect::<Result<Vec<_>>>()?;
        let target_train = load_split(&self.target_train, config.batch_size)?;
        let test = load_split(&self.test, config.batch_size)?;

        tracing::info!(
            target_train = %self.target_train.display(),
            test = %self.test.display(),
            "loaded splits from disk"
        );

        Ok(DatasetSplits { source_train, target_train, test })
    }
}
