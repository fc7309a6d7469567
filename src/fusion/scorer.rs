//! Correlation-weighted class scores.
//!
//! `score[n, c] = Σ_d (f[n,d] - μ[d]) · sigma[d] · g[c,d]`
//!
//! `μ` is the mean of the batch being scored, recomputed on every call. The
//! mean seen while computing statistics is not carried over, so the score of
//! an example depends on the other rows of its batch. [`class_projection`]
//! takes an explicit mean vector for callers that want a frozen one.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::extractor::{embed, FeatureExtractor};

/// Score a batch: run the extractor, then weight by `sigma` and project on `g`.
///
/// Returns an N×C matrix.
pub fn score(
    extractor: &dyn FeatureExtractor,
    sigma: ArrayView1<'_, f32>,
    g: ArrayView2<'_, f32>,
    inputs: ArrayView2<'_, f32>,
) -> Result<Array2<f32>> {
    let embedding = embed(extractor, inputs)?;
    score_embedding(embedding, sigma, g)
}

/// Score an N×D embedding that has already been extracted.
pub fn score_embedding(
    mut embedding: Array2<f32>,
    sigma: ArrayView1<'_, f32>,
    g: ArrayView2<'_, f32>,
) -> Result<Array2<f32>> {
    let dim = embedding.ncols();
    if sigma.len() != dim {
        return Err(Error::shape("sigma", &[dim], &[sigma.len()]));
    }
    if g.ncols() != dim {
        return Err(Error::shape("g", &[g.nrows(), dim], g.shape()));
    }

    if let Some(mean) = embedding.mean_axis(Axis(0)) {
        embedding -= &mean;
    }
    embedding *= &sigma;

    Ok(embedding.dot(&g.t()))
}

/// Column means of the extractor's embedding over `inputs`.
pub fn feature_means(
    extractor: &dyn FeatureExtractor,
    inputs: ArrayView2<'_, f32>,
) -> Result<Array1<f32>> {
    let embedding = embed(extractor, inputs)?;
    embedding.mean_axis(Axis(0)).ok_or_else(|| {
        Error::InvalidParameter("cannot take feature means of an empty batch".into())
    })
}

/// Unweighted projection onto one class direction with a fixed mean.
///
/// Returns `Σ_d (f[n,d] - means[d]) · g[class,d]` for every row.
pub fn class_projection(
    extractor: &dyn FeatureExtractor,
    means: ArrayView1<'_, f32>,
    g: ArrayView2<'_, f32>,
    inputs: ArrayView2<'_, f32>,
    class: usize,
) -> Result<Array1<f32>> {
    let mut embedding = embed(extractor, inputs)?;
    let dim = embedding.ncols();
    if means.len() != dim {
        return Err(Error::shape("feature means", &[dim], &[means.len()]));
    }
    if g.ncols() != dim {
        return Err(Error::shape("g", &[g.nrows(), dim], g.shape()));
    }
    if class >= g.nrows() {
        return Err(Error::LabelOutOfRange { label: class, num_classes: g.nrows() });
    }

    embedding -= &means;
    Ok(embedding.dot(&g.row(class)))
}
