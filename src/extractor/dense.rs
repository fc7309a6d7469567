//! Dense-layer feature extractor.

use ndarray::{Array1, Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{check_input_width, FeatureExtractor};
use crate::error::{Error, Result};

/// One fully connected layer, `y = relu(x · W + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    /// Weight matrix, in × out
    pub weight: Array2<f32>,
    /// Bias vector, out
    pub bias: Array1<f32>,
}

impl DenseLayer {
    /// Create a layer, checking that the bias matches the output width.
    pub fn new(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if weight.ncols() != bias.len() {
            return Err(Error::shape("dense layer bias", &[weight.ncols()], &[bias.len()]));
        }
        Ok(Self { weight, bias })
    }

    /// Input width.
    pub fn in_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Output width.
    pub fn out_dim(&self) -> usize {
        self.weight.ncols()
    }

    fn forward(&self, x: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut y = x.dot(&self.weight);
        y += &self.bias;
        y.mapv_inplace(|v| v.max(0.0));
        y
    }
}

/// Stack of dense layers; the last layer's activations are the embedding.
///
/// This is the penultimate-layer feature map of a source network: the
/// classification head is not part of the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseExtractor {
    layers: Vec<DenseLayer>,
}

impl DenseExtractor {
    /// Create an extractor, checking that consecutive layer widths chain.
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidParameter("extractor needs at least one layer".into()));
        }
        for pair in layers.windows(2) {
            if pair[0].out_dim() != pair[1].in_dim() {
                return Err(Error::shape(
                    "dense layer chain",
                    &[pair[0].out_dim()],
                    &[pair[1].in_dim()],
                ));
            }
        }
        Ok(Self { layers })
    }

    /// Randomly initialized extractor with widths `dims[0] → … → dims[n]`.
    ///
    /// Uses He-uniform initialization from an explicit seed.
    pub fn random(dims: &[usize], seed: u64) -> Result<Self> {
        if dims.len() < 2 || dims.contains(&0) {
            return Err(Error::InvalidParameter(format!(
                "need at least two positive layer widths, got {dims:?}"
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let layers = dims
            .windows(2)
            .map(|w| {
                let bound = (6.0 / w[0] as f32).sqrt();
                let weight =
                    Array2::from_shape_fn((w[0], w[1]), |_| rng.random_range(-bound..bound));
                DenseLayer::new(weight, Array1::zeros(w[1]))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(layers)
    }

    /// The layers, input side first.
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }
}

impl FeatureExtractor for DenseExtractor {
    fn embedding_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::out_dim)
    }

    fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::in_dim)
    }

    fn extract(&self, inputs: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        check_input_width(inputs, self.input_dim())?;

        let (first, rest) = self
            .layers
            .split_first()
            .ok_or_else(|| Error::InvalidParameter("extractor has no layers".into()))?;
        let mut x = first.forward(inputs);
        for layer in rest {
            x = layer.forward(x.view());
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_forward_applies_relu() {
        let layer = DenseLayer::new(array![[1.0, -1.0], [0.0, 2.0]], array![0.5, 0.0]).unwrap();
        let extractor = DenseExtractor::new(vec![layer]).unwrap();

        let out = extractor.extract(array![[1.0, 1.0]].view()).unwrap();
        // [1*1 + 1*0 + 0.5, 1*-1 + 1*2 + 0] = [1.5, 1.0]
        assert_abs_diff_eq!(out[[0, 0]], 1.5);
        assert_abs_diff_eq!(out[[0, 1]], 1.0);

        let negative = extractor.extract(array![[-2.0, 0.0]].view()).unwrap();
        assert_eq!(negative, array![[0.0, 2.0]]);
    }

    #[test]
    fn test_chain_mismatch_rejected() {
        let a = DenseLayer::new(Array2::zeros((4, 3)), Array1::zeros(3)).unwrap();
        let b = DenseLayer::new(Array2::zeros((2, 5)), Array1::zeros(5)).unwrap();
        assert!(DenseExtractor::new(vec![a, b]).is_err());
        assert!(DenseExtractor::new(vec![]).is_err());
    }

    #[test]
    fn test_bias_width_checked() {
        assert!(DenseLayer::new(Array2::zeros((2, 3)), Array1::zeros(2)).is_err());
    }

    #[test]
    fn test_random_is_seeded() {
        let a = DenseExtractor::random(&[16, 8, 4], 7).unwrap();
        let b = DenseExtractor::random(&[16, 8, 4], 7).unwrap();
        let c = DenseExtractor::random(&[16, 8, 4], 8).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.input_dim(), 16);
        assert_eq!(a.embedding_dim(), 4);
    }

    #[test]
    fn test_extract_shape() {
        let extractor = DenseExtractor::random(&[6, 5, 3], 1).unwrap();
        let out = extractor.extract(Array2::<f32>::ones((10, 6)).view()).unwrap();
        assert_eq!(out.dim(), (10, 3));
        assert!(out.iter().all(|&v| v >= 0.0));
        assert!(extractor.extract(Array2::<f32>::ones((10, 5)).view()).is_err());
    }
}
