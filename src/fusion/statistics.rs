//! Maximal-correlation statistics for one source task.
//!
//! From a batch of target-domain embeddings and labels this computes
//!
//! - `g`: C×D class-conditional means of the normalized embedding
//! - `sigma`: D-length correlation strength, `mean_n E[n,d] · g[label[n], d]`
//!
//! `g` and `sigma` are only defined up to a joint sign flip per dimension.
//! The canonical orientation keeps every `sigma[d] >= 0`.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::extractor::{embed, FeatureExtractor};

/// Degenerate conditions found while computing statistics.
///
/// None of these are fatal: the zero-variance guard and zero rows of `g`
/// keep the output finite. They are reported so callers can see them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsDiagnostics {
    /// Dimensions whose embedding was constant across the batch
    pub zero_variance_dims: Vec<usize>,
    /// Classes with no example in the batch (their row of `g` is zero)
    pub empty_classes: Vec<usize>,
}

impl StatisticsDiagnostics {
    /// Whether any degenerate condition was found.
    pub fn is_degenerate(&self) -> bool {
        !self.zero_variance_dims.is_empty() || !self.empty_classes.is_empty()
    }
}

/// Per-task `(sigma, g)` pair plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatistics {
    /// Correlation strength per embedding dimension, all `>= 0`
    pub sigma: Array1<f32>,
    /// Class-conditional direction, C×D
    pub g: Array2<f32>,
    /// Degenerate conditions found in the statistics batch
    pub diagnostics: StatisticsDiagnostics,
}

impl TaskStatistics {
    /// Embedding width D.
    pub fn embedding_dim(&self) -> usize {
        self.sigma.len()
    }

    /// Number of classes C.
    pub fn num_classes(&self) -> usize {
        self.g.nrows()
    }

    /// Mean correlation strength across dimensions.
    pub fn mean_strength(&self) -> f32 {
        self.sigma.mean().unwrap_or(0.0)
    }
}

/// Run the extractor on `inputs` and compute statistics from its embedding.
pub fn compute(
    extractor: &dyn FeatureExtractor,
    inputs: ArrayView2<'_, f32>,
    labels: &[usize],
    num_classes: usize,
) -> Result<TaskStatistics> {
    let embedding = embed(extractor, inputs)?;
    from_embedding(embedding, labels, num_classes)
}

/// Compute statistics from an N×D embedding matrix.
///
/// The matrix is normalized in place: each column is centered by its batch
/// mean and divided by its population standard deviation. A column whose
/// standard deviation is exactly zero is divided by 1 instead, so it stays
/// all zero and contributes `sigma[d] = 0` and a zero column of `g`.
pub fn from_embedding(
    mut embedding: Array2<f32>,
    labels: &[usize],
    num_classes: usize,
) -> Result<TaskStatistics> {
    let (n, dim) = embedding.dim();
    if n == 0 {
        return Err(Error::shape("statistics batch", &[1, dim], &[0, dim]));
    }
    if labels.len() != n {
        return Err(Error::shape("statistics labels", &[n], &[labels.len()]));
    }
    if num_classes == 0 {
        return Err(Error::InvalidParameter("num_classes must be positive".into()));
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= num_classes) {
        return Err(Error::LabelOutOfRange { label, num_classes });
    }

    let zero_variance_dims = normalize_columns(&mut embedding);

    let mut g = Array2::<f32>::zeros((num_classes, dim));
    let mut counts = vec![0usize; num_classes];
    for (row, &label) in embedding.rows().into_iter().zip(labels) {
        let mut target = g.row_mut(label);
        target += &row;
        counts[label] += 1;
    }
    for (mut row, &count) in g.rows_mut().into_iter().zip(&counts) {
        if count > 0 {
            row /= count as f32;
        }
    }

    let mut sigma = Array1::<f32>::zeros(dim);
    for (row, &label) in embedding.rows().into_iter().zip(labels) {
        Zip::from(&mut sigma)
            .and(&row)
            .and(g.row(label))
            .for_each(|s, &x, &gy| *s += x * gy);
    }
    sigma /= n as f32;

    orient(&mut sigma, &mut g);

    let empty_classes: Vec<usize> =
        counts.iter().enumerate().filter(|&(_, &c)| c == 0).map(|(c, _)| c).collect();

    let diagnostics = StatisticsDiagnostics { zero_variance_dims, empty_classes };
    if !diagnostics.zero_variance_dims.is_empty() {
        tracing::warn!(
            dims = ?diagnostics.zero_variance_dims,
            "zero-variance embedding dimensions; sigma and g are zero there"
        );
    }
    if !diagnostics.empty_classes.is_empty() {
        tracing::warn!(
            classes = ?diagnostics.empty_classes,
            "classes absent from statistics batch; their g rows are zero"
        );
    }

    Ok(TaskStatistics { sigma, g, diagnostics })
}

/// Center and scale every column; returns the zero-variance columns.
fn normalize_columns(embedding: &mut Array2<f32>) -> Vec<usize> {
    let n = embedding.nrows() as f32;
    let mut zero_variance = Vec::new();

    for (d, mut column) in embedding.axis_iter_mut(Axis(1)).enumerate() {
        // `sum / n` of a constant column can round away from the value itself,
        // leaving a uniform residual that would normalize to ±1.
        let first = column[0];
        if column.iter().all(|&v| v == first) {
            column.fill(0.0);
            zero_variance.push(d);
            continue;
        }

        let mean = column.sum() / n;
        column -= mean;

        let std = (column.dot(&column) / n).sqrt();
        if std == 0.0 {
            zero_variance.push(d);
        } else {
            column /= std;
        }
    }

    zero_variance
}

/// Flip `sigma[d]` and column `d` of `g` together wherever `sigma[d] < 0`.
fn orient(sigma: &mut Array1<f32>, g: &mut Array2<f32>) {
    for (s, mut column) in sigma.iter_mut().zip(g.axis_iter_mut(Axis(1))) {
        if *s < 0.0 {
            *s = -*s;
            column.mapv_inplace(|v| -v);
        }
    }
}
