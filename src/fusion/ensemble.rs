//! Multi-task fusion of correlation-weighted scores.

use ndarray::{s, Array2};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::scorer::score_embedding;
use super::statistics::{compute, TaskStatistics};
use crate::data::{split_len, Batch};
use crate::error::{Error, Result};
use crate::extractor::{embed, FeatureExtractor};

/// One source task: its frozen extractor and the batch its statistics come from.
#[derive(Clone, Copy)]
pub struct FusionTask<'a> {
    /// Frozen extractor of the source task
    pub extractor: &'a dyn FeatureExtractor,
    /// Target-domain batch used to compute `(sigma, g)`
    pub statistics_batch: &'a Batch,
}

impl<'a> FusionTask<'a> {
    /// Pair an extractor with its statistics batch.
    pub fn new(extractor: &'a dyn FeatureExtractor, statistics_batch: &'a Batch) -> Self {
        Self { extractor, statistics_batch }
    }
}

/// Fused scores and concatenated raw features for both target splits.
#[derive(Debug, Clone)]
pub struct FusionOutput {
    /// Summed scores over the target training split, N_train×C
    pub score_train: Array2<f32>,
    /// Summed scores over the test split, N_test×C
    pub score_test: Array2<f32>,
    /// Raw embeddings of every task side by side, N_train×(K·D)
    pub concat_train: Array2<f32>,
    /// Raw embeddings of every task side by side, N_test×(K·D)
    pub concat_test: Array2<f32>,
    /// Statistics of each task, in task order
    pub statistics: Vec<TaskStatistics>,
}

/// What one task adds to the fused output.
struct Contribution {
    statistics: TaskStatistics,
    score_train: Array2<f32>,
    score_test: Array2<f32>,
    features_train: Array2<f32>,
    features_test: Array2<f32>,
}

/// Sums correlation-weighted scores across source tasks.
///
/// Each task is mapped to an independent contribution; the contributions
/// are then folded by addition in task order. Task `i`'s raw embedding
/// fills column block `i` of the concatenated feature matrices, so every
/// extractor must share the same embedding width.
///
/// # Example
///
/// ```
/// use maxcorr::data::Batch;
/// use maxcorr::extractor::IdentityExtractor;
/// use maxcorr::fusion::{FusionEnsemble, FusionTask};
/// use ndarray::array;
///
/// let train = Batch::new(array![[1.0, 0.0], [0.0, 1.0]], vec![0, 1]).unwrap();
/// let extractor = IdentityExtractor::new(2);
/// let tasks = [FusionTask::new(&extractor, &train)];
///
/// let output = FusionEnsemble::new(2)
///     .fuse(&tasks, std::slice::from_ref(&train), std::slice::from_ref(&train))
///     .unwrap();
/// assert_eq!(output.score_test.dim(), (2, 2));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FusionEnsemble {
    num_classes: usize,
}

impl FusionEnsemble {
    /// Ensemble over `num_classes` target classes.
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }

    /// Number of target classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Fuse all tasks over the target training and test splits.
    pub fn fuse(
        &self,
        tasks: &[FusionTask<'_>],
        target_train: &[Batch],
        test: &[Batch],
    ) -> Result<FusionOutput> {
        let first = tasks.first().ok_or_else(|| {
            Error::InvalidParameter("fusion needs at least one source task".into())
        })?;
        if self.num_classes == 0 {
            return Err(Error::InvalidParameter("num_classes must be positive".into()));
        }

        let dim = first.extractor.embedding_dim();
        for (i, task) in tasks.iter().enumerate() {
            let width = task.extractor.embedding_dim();
            if width != dim {
                return Err(Error::shape("embedding width", &[dim], &[width]).in_task(i, None));
            }
        }

        let contributions = self.contributions(tasks, target_train, test)?;

        let (n_train, n_test) = (split_len(target_train), split_len(test));
        let width = dim * tasks.len();
        let mut output = FusionOutput {
            score_train: Array2::zeros((n_train, self.num_classes)),
            score_test: Array2::zeros((n_test, self.num_classes)),
            concat_train: Array2::zeros((n_train, width)),
            concat_test: Array2::zeros((n_test, width)),
            statistics: Vec::with_capacity(tasks.len()),
        };

        for (i, contribution) in contributions.into_iter().enumerate() {
            let block = s![.., i * dim..(i + 1) * dim];
            output.score_train += &contribution.score_train;
            output.score_test += &contribution.score_test;
            output.concat_train.slice_mut(block).assign(&contribution.features_train);
            output.concat_test.slice_mut(block).assign(&contribution.features_test);
            output.statistics.push(contribution.statistics);
        }

        Ok(output)
    }

    #[cfg(not(feature = "parallel"))]
    fn contributions(
        &self,
        tasks: &[FusionTask<'_>],
        target_train: &[Batch],
        test: &[Batch],
    ) -> Result<Vec<Contribution>> {
        tasks
            .iter()
            .enumerate()
            .map(|(i, task)| self.contribution(i, task, target_train, test))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn contributions(
        &self,
        tasks: &[FusionTask<'_>],
        target_train: &[Batch],
        test: &[Batch],
    ) -> Result<Vec<Contribution>> {
        tasks
            .par_iter()
            .enumerate()
            .map(|(i, task)| self.contribution(i, task, target_train, test))
            .collect()
    }

    fn contribution(
        &self,
        index: usize,
        task: &FusionTask<'_>,
        target_train: &[Batch],
        test: &[Batch],
    ) -> Result<Contribution> {
        let batch = task.statistics_batch;
        let statistics = compute(task.extractor, batch.view(), &batch.labels, self.num_classes)
            .map_err(|e| e.in_task(index, None))?;

        tracing::info!(
            task = index,
            mean_sigma = statistics.mean_strength(),
            "computed task statistics"
        );

        let (score_train, features_train) =
            self.score_split(index, task.extractor, &statistics, target_train)?;
        let (score_test, features_test) =
            self.score_split(index, task.extractor, &statistics, test)?;

        Ok(Contribution { statistics, score_train, score_test, features_train, features_test })
    }

    /// Scores and raw embeddings for a split, rows in split order.
    fn score_split(
        &self,
        index: usize,
        extractor: &dyn FeatureExtractor,
        statistics: &TaskStatistics,
        split: &[Batch],
    ) -> Result<(Array2<f32>, Array2<f32>)> {
        let n = split_len(split);
        let mut scores = Array2::zeros((n, self.num_classes));
        let mut features = Array2::zeros((n, extractor.embedding_dim()));

        let mut offset = 0;
        for (j, batch) in split.iter().enumerate() {
            let rows = s![offset..offset + batch.len(), ..];
            let embedding =
                embed(extractor, batch.view()).map_err(|e| e.in_task(index, Some(j)))?;
            let batch_scores =
                score_embedding(embedding.clone(), statistics.sigma.view(), statistics.g.view())
                    .map_err(|e| e.in_task(index, Some(j)))?;

            scores.slice_mut(rows).assign(&batch_scores);
            features.slice_mut(rows).assign(&embedding);
            offset += batch.len();
        }

        Ok((scores, features))
    }
}
