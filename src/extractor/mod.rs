//! Frozen feature extractors
//!
//! A source task contributes one extractor: a deterministic, side-effect
//! free map from an input batch (N×I) to an embedding matrix (N×D). The
//! statistics engine only ever sees the embedding.
//!
//! - [`IdentityExtractor`]: passes inputs through unchanged
//! - [`DenseExtractor`]: dense layers with ReLU, loaded from a checkpoint
//! - [`CheckpointStore`]: per-task checkpoint files indexed by dataset mode

mod checkpoint;
mod dense;

pub use checkpoint::CheckpointStore;
pub use dense::{DenseExtractor, DenseLayer};

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// Frozen map from an input batch to an embedding matrix.
pub trait FeatureExtractor: Send + Sync {
    /// Width of each embedding row (D).
    fn embedding_dim(&self) -> usize;

    /// Width of each input row this extractor accepts.
    fn input_dim(&self) -> usize;

    /// Run the extractor on a batch, returning an N×D matrix.
    fn extract(&self, inputs: ArrayView2<'_, f32>) -> Result<Array2<f32>>;
}

impl<T: FeatureExtractor + ?Sized> FeatureExtractor for Box<T> {
    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }

    fn input_dim(&self) -> usize {
        (**self).input_dim()
    }

    fn extract(&self, inputs: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        (**self).extract(inputs)
    }
}

/// Extractor that returns its input as the embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityExtractor {
    dim: usize,
}

impl IdentityExtractor {
    /// Identity over `dim`-wide inputs.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl FeatureExtractor for IdentityExtractor {
    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn input_dim(&self) -> usize {
        self.dim
    }

    fn extract(&self, inputs: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        check_input_width(inputs, self.dim)?;
        Ok(inputs.to_owned())
    }
}

pub(crate) fn check_input_width(inputs: ArrayView2<'_, f32>, expected: usize) -> Result<()> {
    if inputs.ncols() != expected {
        return Err(Error::shape(
            "extractor input",
            &[inputs.nrows(), expected],
            &[inputs.nrows(), inputs.ncols()],
        ));
    }
    Ok(())
}

/// Run an extractor and verify the embedding shape it returns.
pub fn embed(
    extractor: &dyn FeatureExtractor,
    inputs: ArrayView2<'_, f32>,
) -> Result<Array2<f32>> {
    let embedding = extractor.extract(inputs)?;
    let expected = [inputs.nrows(), extractor.embedding_dim()];
    if embedding.dim() != (expected[0], expected[1]) {
        return Err(Error::shape("extractor output", &expected, embedding.shape()));
    }
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Truncating;

    impl FeatureExtractor for Truncating {
        fn embedding_dim(&self) -> usize {
            3
        }

        fn input_dim(&self) -> usize {
            3
        }

        fn extract(&self, inputs: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
            Ok(inputs.slice(ndarray::s![.., ..2]).to_owned())
        }
    }

    #[test]
    fn test_identity_passes_through() {
        let x = array![[1.0, -2.0], [3.0, 4.0]];
        let out = IdentityExtractor::new(2).extract(x.view()).unwrap();
        assert_eq!(out, x);
    }

    #[test]
    fn test_identity_rejects_wrong_width() {
        let x = array![[1.0, 2.0, 3.0]];
        let err = IdentityExtractor::new(2).extract(x.view()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_embed_checks_output_width() {
        let x = array![[1.0, 2.0, 3.0]];
        let err = embed(&Truncating, x.view()).unwrap_err();
        assert!(err.to_string().contains("extractor output"));
    }

    #[test]
    fn test_boxed_extractor_delegates() {
        let boxed: Box<dyn FeatureExtractor> = Box::new(IdentityExtractor::new(4));
        assert_eq!(boxed.embedding_dim(), 4);
        assert_eq!(boxed.input_dim(), 4);
    }
}
