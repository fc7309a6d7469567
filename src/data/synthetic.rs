//! Seeded Gaussian-cluster splits.
//!
//! Stands in for the image datasets when no pre-extracted files are
//! configured. The label space is partitioned: source task `i` draws its
//! classes from partition `i`, and the target task from a held-out
//! partition, so source and target classes are disjoint.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use super::{rebatch, Batch, DatasetSource, DatasetSplits};
use crate::config::ExperimentConfig;
use crate::error::{Error, Result};

/// Gaussian-cluster generator for the three splits.
#[derive(Debug, Clone)]
pub struct SyntheticClusters {
    input_dim: usize,
    noise_std: f32,
    centroid_scale: f32,
}

impl SyntheticClusters {
    /// Create a generator producing `input_dim`-wide inputs.
    pub fn new(input_dim: usize) -> Self {
        Self { input_dim, noise_std: 0.5, centroid_scale: 1.0 }
    }

    /// Set the per-coordinate noise around each class centroid.
    pub fn with_noise_std(mut self, noise_std: f32) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Set the spread of class centroids.
    pub fn with_centroid_scale(mut self, centroid_scale: f32) -> Self {
        self.centroid_scale = centroid_scale;
        self
    }

    /// Input width of generated examples.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn centroids(&self, rng: &mut ChaCha8Rng, num_classes: usize) -> Result<Array2<f32>> {
        let normal = normal(0.0, self.centroid_scale)?;
        Ok(Array2::from_shape_fn((num_classes, self.input_dim), |_| normal.sample(rng)))
    }

    fn sample_split(
        &self,
        rng: &mut ChaCha8Rng,
        centroids: &Array2<f32>,
        per_class: usize,
        batch_size: usize,
    ) -> Result<Vec<Batch>> {
        let noise = normal(0.0, self.noise_std)?;
        let num_classes = centroids.nrows();

        let mut labels: Vec<usize> =
            (0..num_classes).flat_map(|c| std::iter::repeat(c).take(per_class)).collect();
        labels.shuffle(rng);

        let mut inputs = Array2::zeros((labels.len(), self.input_dim));
        for (mut row, &label) in inputs.rows_mut().into_iter().zip(&labels) {
            for (x, &center) in row.iter_mut().zip(centroids.row(label)) {
                *x = center + noise.sample(rng);
            }
        }

        rebatch(&Batch::new(inputs, labels)?, batch_size)
    }
}

impl DatasetSource for SyntheticClusters {
    fn load(&self, config: &ExperimentConfig) -> Result<DatasetSplits> {
        if self.input_dim == 0 {
            return Err(Error::InvalidParameter("synthetic input_dim must be positive".into()));
        }

        let num_classes = config.num_classes();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut source_train = Vec::with_capacity(config.num_source_tasks);
        for _ in 0..config.num_source_tasks {
            let centroids = self.centroids(&mut rng, num_classes)?;
            source_train.push(self.sample_split(
                &mut rng,
                &centroids,
                config.num_source_samples_per_class,
                config.batch_size,
            )?);
        }

        let target = self.centroids(&mut rng, num_classes)?;
        let target_train = self.sample_split(
            &mut rng,
            &target,
            config.num_target_samples_per_class,
            config.batch_size,
        )?;
        let test = self.sample_split(
            &mut rng,
            &target,
            config.num_test_samples_per_class,
            config.batch_size,
        )?;

        tracing::debug!(
            source_tasks = source_train.len(),
            target_train = super::split_len(&target_train),
            test = super::split_len(&test),
            seed = config.seed,
            "generated synthetic splits"
        );

        Ok(DatasetSplits { source_train, target_train, test })
    }
}

// `Normal::new` accepts a negative std and samples mirrored noise.
fn normal(mean: f32, std: f32) -> Result<Normal<f32>> {
    if !(std >= 0.0 && std.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "standard deviation must be finite and non-negative, got {std}"
        )));
    }
    Normal::new(mean, std).map_err(|e| {
        Error::InvalidParameter(format!("invalid normal distribution (std {std}): {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{split_labels, split_len};

    fn small_config() -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.num_source_tasks = 3;
        config.num_source_samples_per_class = 6;
        config.num_target_samples_per_class = 5;
        config.num_test_samples_per_class = 4;
        config.batch_size = 4;
        config
    }

    #[test]
    fn test_split_sizes() {
        let config = small_config();
        let splits = SyntheticClusters::new(8).load(&config).unwrap();

        assert_eq!(splits.num_source_tasks(), 3);
        for task in &splits.source_train {
            assert_eq!(split_len(task), 6 * 2);
        }
        assert_eq!(split_len(&splits.target_train), 5 * 2);
        assert_eq!(split_len(&splits.test), 4 * 2);
        assert!(splits.target_train.iter().all(|b| b.len() <= 4 && b.input_dim() == 8));
    }

    #[test]
    fn test_every_class_represented() {
        let config = small_config();
        let splits = SyntheticClusters::new(4).load(&config).unwrap();
        let labels = split_labels(&splits.target_train);

        for class in 0..config.num_classes() {
            assert_eq!(labels.iter().filter(|&&l| l == class).count(), 5);
        }
        assert!(splits.check_labels(config.num_classes()).is_ok());
    }

    #[test]
    fn test_same_seed_reproduces_splits() {
        let config = small_config();
        let a = SyntheticClusters::new(4).load(&config).unwrap();
        let b = SyntheticClusters::new(4).load(&config).unwrap();

        assert_eq!(a.target_train, b.target_train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_different_seed_changes_splits() {
        let config = small_config();
        let mut other = config.clone();
        other.seed = config.seed + 1;

        let a = SyntheticClusters::new(4).load(&config).unwrap();
        let b = SyntheticClusters::new(4).load(&other).unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn test_negative_noise_rejected() {
        let config = small_config();
        let result = SyntheticClusters::new(4).with_noise_std(-1.0).load(&config);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let nan = SyntheticClusters::new(4).with_noise_std(f32::NAN).load(&config);
        assert!(nan.is_err());

        let scale = SyntheticClusters::new(4).with_centroid_scale(-0.5).load(&config);
        assert!(scale.is_err());
    }

    #[test]
    fn test_zero_noise_places_examples_on_centroids() {
        let config = small_config();
        let splits = SyntheticClusters::new(4).with_noise_std(0.0).load(&config).unwrap();

        let batch = &splits.test[0];
        for (i, row) in batch.inputs.rows().into_iter().enumerate() {
            for (j, other) in batch.inputs.rows().into_iter().enumerate() {
                if batch.labels[i] == batch.labels[j] {
                    assert_eq!(row, other);
                }
            }
        }
    }
}
