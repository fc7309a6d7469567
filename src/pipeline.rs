//! Experiment pipeline execution.
//!
//! Stages: resolve extractors, load splits, fuse every source task over the
//! target splits, evaluate.

use std::time::Instant;

use crate::config::{ConfigValidator, ExperimentConfig};
use crate::data::{
    concat_batches, split_labels, DatasetSource, DatasetSplits, SafeTensorsDataset,
    SyntheticClusters,
};
use crate::error::{Error, Result};
use crate::eval::{EvalReport, Evaluator};
use crate::extractor::{CheckpointStore, FeatureExtractor, IdentityExtractor};
use crate::fusion::{FusionEnsemble, FusionTask};

/// Pipeline execution result.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Evaluation of the fused run
    pub report: EvalReport,
    /// Total execution time in seconds
    pub duration_seconds: f64,
}

/// Experiment pipeline orchestrator.
pub struct Pipeline<'a> {
    config: &'a ExperimentConfig,
}

impl<'a> Pipeline<'a> {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: &'a ExperimentConfig) -> Self {
        Self { config }
    }

    /// Execute the complete pipeline.
    pub fn execute(&self) -> Result<PipelineResult> {
        let start = Instant::now();
        ConfigValidator::validate(self.config)?;

        let extractors = self.load_extractors()?;
        let input_dim = extractors.first().map_or(self.config.embedding_dim, |e| e.input_dim());
        let splits = self.load_data(input_dim)?;

        let num_classes = self.config.num_classes();
        splits.check_labels(num_classes)?;

        let extractors =
            if extractors.is_empty() { self.identity_extractors(&splits)? } else { extractors };

        let report = self.run(&extractors, &splits)?;

        Ok(PipelineResult { report, duration_seconds: start.elapsed().as_secs_f64() })
    }

    /// Fuse and evaluate with already resolved extractors and splits.
    pub fn run(
        &self,
        extractors: &[Box<dyn FeatureExtractor>],
        splits: &DatasetSplits,
    ) -> Result<EvalReport> {
        let num_classes = self.config.num_classes();
        let statistics_batch = concat_batches(&splits.target_train)?;

        let tasks: Vec<FusionTask<'_>> = extractors
            .iter()
            .map(|e| FusionTask::new(e.as_ref(), &statistics_batch))
            .collect();

        tracing::info!(
            tasks = tasks.len(),
            num_classes,
            train = statistics_batch.len(),
            "fusing source tasks"
        );
        let output =
            FusionEnsemble::new(num_classes).fuse(&tasks, &splits.target_train, &splits.test)?;

        Evaluator::new(num_classes, self.config.classifier).evaluate(
            &output,
            &statistics_batch.labels,
            &split_labels(&splits.test),
        )
    }

    /// Load the splits named by the configuration.
    ///
    /// `input_dim` is the width synthetic examples are generated with.
    pub fn load_data(&self, input_dim: usize) -> Result<DatasetSplits> {
        match SafeTensorsDataset::from_config(&self.config.data) {
            Some(dataset) => dataset.load(self.config),
            None => SyntheticClusters::new(input_dim).load(self.config),
        }
    }

    /// Load one checkpointed extractor per source task.
    ///
    /// Returns an empty list when no checkpoint directory is configured.
    /// Every checkpoint must embed into exactly `embedding_dim` dimensions.
    pub fn load_extractors(&self) -> Result<Vec<Box<dyn FeatureExtractor>>> {
        let Some(checkpoints) = &self.config.checkpoints else {
            return Ok(Vec::new());
        };

        let store = CheckpointStore::new(&checkpoints.dir);
        (0..self.config.num_source_tasks)
            .map(|task| {
                let extractor =
                    store.load(self.config.mode, task).map_err(|e| e.in_task(task, None))?;
                self.check_embedding_dim(&extractor).map_err(|e| e.in_task(task, None))?;
                Ok(Box::new(extractor) as Box<dyn FeatureExtractor>)
            })
            .collect()
    }

    fn check_embedding_dim(&self, extractor: &dyn FeatureExtractor) -> Result<()> {
        let width = extractor.embedding_dim();
        if width == self.config.embedding_dim {
            return Ok(());
        }
        Err(Error::ConfigValue {
            field: "embedding_dim".into(),
            message: format!(
                "checkpoint embeds into {width} dimensions, configured {}",
                self.config.embedding_dim
            ),
            suggestion: format!("Set embedding_dim: {width} or re-export the checkpoints"),
        })
    }

    fn identity_extractors(
        &self,
        splits: &DatasetSplits,
    ) -> Result<Vec<Box<dyn FeatureExtractor>>> {
        let width = splits
            .target_train
            .first()
            .map(|b| b.input_dim())
            .ok_or_else(|| Error::InvalidParameter("target training split is empty".into()))?;

        tracing::debug!(width, "no checkpoints configured; using identity extractors");
        Ok((0..self.config.num_source_tasks)
            .map(|_| Box::new(IdentityExtractor::new(width)) as Box<dyn FeatureExtractor>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckpointConfig;
    use crate::extractor::DenseExtractor;
    use tempfile::TempDir;

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            num_source_samples_per_class: 5,
            num_target_samples_per_class: 10,
            num_test_samples_per_class: 10,
            num_source_tasks: 3,
            embedding_dim: 6,
            batch_size: 8,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_execute_synthetic_identity() {
        let config = small_config();
        let result = Pipeline::new(&config).execute().unwrap();

        let report = &result.report;
        assert_eq!(report.num_tasks, 3);
        assert_eq!(report.num_classes, 2);
        assert_eq!(report.train_examples, 20);
        assert_eq!(report.test_examples, 20);
        assert!((0.0..=1.0).contains(&report.fused_test_accuracy));
        assert!(result.duration_seconds >= 0.0);
    }

    #[test]
    fn test_execute_is_deterministic() {
        let config = small_config();
        let a = Pipeline::new(&config).execute().unwrap().report;
        let b = Pipeline::new(&config).execute().unwrap().report;

        assert_eq!(a.fused_test_accuracy, b.fused_test_accuracy);
        assert_eq!(a.classifier_test_accuracy, b.classifier_test_accuracy);
        assert_eq!(a.tasks, b.tasks);
    }

    #[test]
    fn test_execute_with_checkpoints() {
        let tmp = TempDir::new().unwrap();
        let mut config = small_config();
        config.checkpoints = Some(CheckpointConfig { dir: tmp.path().to_path_buf() });

        let store = CheckpointStore::new(tmp.path());
        for task in 0..config.num_source_tasks {
            let extractor = DenseExtractor::random(&[10, 8, 6], task as u64).unwrap();
            store.save(config.mode, task, &extractor).unwrap();
        }

        let report = Pipeline::new(&config).execute().unwrap().report;
        assert_eq!(report.num_tasks, 3);
        assert_eq!(report.tasks.len(), 3);
    }

    #[test]
    fn test_checkpoint_width_must_match_embedding_dim() {
        let tmp = TempDir::new().unwrap();
        let mut config = small_config();
        config.checkpoints = Some(CheckpointConfig { dir: tmp.path().to_path_buf() });
        config.embedding_dim = 84;

        let store = CheckpointStore::new(tmp.path());
        store.export_random(config.mode, config.num_source_tasks, &[10, 16, 6], 1).unwrap();

        let err = Pipeline::new(&config).execute().unwrap_err();
        match &err {
            Error::Task { task: 0, source, .. } => {
                let field = match source.as_ref() {
                    Error::ConfigValue { field, .. } => field.as_str(),
                    other => panic!("unexpected source: {other}"),
                };
                assert_eq!(field, "embedding_dim");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_user_error());
    }

    #[test]
    fn test_missing_checkpoint_names_task() {
        let tmp = TempDir::new().unwrap();
        let mut config = small_config();
        config.checkpoints = Some(CheckpointConfig { dir: tmp.path().to_path_buf() });

        let err = Pipeline::new(&config).execute().unwrap_err();
        assert!(matches!(err, Error::Task { task: 0, .. }));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let mut config = small_config();
        config.batch_size = 0;
        let err = Pipeline::new(&config).execute().unwrap_err();
        assert!(matches!(err, Error::ConfigValue { .. }));
    }
}
