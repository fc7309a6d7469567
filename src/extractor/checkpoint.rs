//! Per-task extractor checkpoints.
//!
//! Checkpoints live in one directory as `{mode}_net{task}.safetensors`,
//! holding `layers.{i}.weight` (in×out) and `layers.{i}.bias` (out) for each
//! layer `i` starting at zero.

use ndarray::{Array1, Array2};
use std::path::{Path, PathBuf};

use super::dense::{DenseExtractor, DenseLayer};
use crate::config::DatasetMode;
use crate::error::{Error, Result};
use crate::io::{read_tensors, write_tensors, LoadedTensor, TensorData};

/// Directory of frozen extractor checkpoints.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checkpoint path for a source task.
    pub fn path_for(&self, mode: DatasetMode, task: usize) -> PathBuf {
        self.dir.join(format!("{}_net{task}.safetensors", mode.tag()))
    }

    /// Load the frozen extractor for a source task.
    pub fn load(&self, mode: DatasetMode, task: usize) -> Result<DenseExtractor> {
        let path = self.path_for(mode, task);
        if !path.exists() {
            return Err(Error::CheckpointNotFound { path });
        }

        let mut tensors = read_tensors(&path)?;
        let mut layers = Vec::new();
        while let Some(weight) = tensors.remove(&format!("layers.{}.weight", layers.len())) {
            let index = layers.len();
            let bias = tensors.remove(&format!("layers.{index}.bias")).ok_or_else(|| {
                Error::Serialization {
                    message: format!("{}: layer {index} has no bias", path.display()),
                }
            })?;
            layers.push(DenseLayer::new(to_matrix(weight, index)?, to_vector(bias, index)?)?);
        }

        tracing::debug!(task, path = %path.display(), layers = layers.len(), "loaded checkpoint");
        DenseExtractor::new(layers)
    }

    /// Save an extractor as the checkpoint for a source task.
    pub fn save(
        &self,
        mode: DatasetMode,
        task: usize,
        extractor: &DenseExtractor,
    ) -> Result<PathBuf> {
        let mut tensors = Vec::with_capacity(extractor.layers().len() * 2);
        for (i, layer) in extractor.layers().iter().enumerate() {
            tensors.push((
                format!("layers.{i}.weight"),
                vec![layer.in_dim(), layer.out_dim()],
                TensorData::F32(layer.weight.iter().copied().collect()),
            ));
            tensors.push((
                format!("layers.{i}.bias"),
                vec![layer.out_dim()],
                TensorData::F32(layer.bias.to_vec()),
            ));
        }

        let path = self.path_for(mode, task);
        write_tensors(&path, &tensors)?;
        Ok(path)
    }

    /// Write seeded random extractors for tasks `0..num_tasks`.
    ///
    /// Task `i` is initialized from `seed + i`.
    pub fn export_random(
        &self,
        mode: DatasetMode,
        num_tasks: usize,
        dims: &[usize],
        seed: u64,
    ) -> Result<Vec<PathBuf>> {
        (0..num_tasks)
            .map(|task| {
                let extractor = DenseExtractor::random(dims, seed.wrapping_add(task as u64))?;
                self.save(mode, task, &extractor)
            })
            .collect()
    }
}

fn to_matrix(tensor: LoadedTensor, layer: usize) -> Result<Array2<f32>> {
    match tensor.shape[..] {
        [rows, cols] => Array2::from_shape_vec((rows, cols), tensor.data.into_f32()).map_err(|e| {
            Error::Serialization { message: format!("layer {layer} weight: {e}") }
        }),
        _ => Err(Error::shape(format!("layer {layer} weight"), &[0, 0], &tensor.shape)),
    }
}

fn to_vector(tensor: LoadedTensor, layer: usize) -> Result<Array1<f32>> {
    match tensor.shape[..] {
        [_] => Ok(Array1::from_vec(tensor.data.into_f32())),
        _ => Err(Error::shape(format!("layer {layer} bias"), &[0], &tensor.shape)),
    }
}
