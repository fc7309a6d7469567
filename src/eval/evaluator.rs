//! Evaluation of a fused run against its target labels

use serde::Serialize;
use std::fmt;

use super::classification::{accuracy, argmax_rows, ConfusionMatrix};
use super::linear::build_classifier;
use crate::config::ClassifierKind;
use crate::error::Result;
use crate::fusion::FusionOutput;

/// Per-task summary of the statistics pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskSummary {
    /// Source task index
    pub task: usize,
    /// Mean of `sigma` over embedding dimensions
    pub mean_sigma: f32,
    /// Number of zero-variance embedding dimensions
    pub zero_variance_dims: usize,
    /// Classes absent from the statistics batch
    pub empty_classes: Vec<usize>,
}

/// Evaluation results for one run.
#[derive(Clone, Debug, Serialize)]
pub struct EvalReport {
    /// Number of target classes
    pub num_classes: usize,
    /// Number of fused source tasks
    pub num_tasks: usize,
    /// Target training examples
    pub train_examples: usize,
    /// Test examples
    pub test_examples: usize,
    /// Argmax accuracy of the fused scores on the training split
    pub fused_train_accuracy: f64,
    /// Argmax accuracy of the fused scores on the test split
    pub fused_test_accuracy: f64,
    /// Auxiliary classifier trained on concatenated raw features
    pub classifier: String,
    /// Test accuracy of the auxiliary classifier
    pub classifier_test_accuracy: f64,
    /// Confusion matrix of the fused test predictions
    pub confusion: ConfusionMatrix,
    /// Statistics summary per source task
    pub tasks: Vec<TaskSummary>,
}

impl EvalReport {
    /// Mean of the per-task mean sigma values.
    pub fn average_sigma(&self) -> f32 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.tasks.iter().map(|t| t.mean_sigma).sum::<f32>() / self.tasks.len() as f32
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Tasks: {}  Classes: {}  Train: {}  Test: {}",
            self.num_tasks, self.num_classes, self.train_examples, self.test_examples
        )?;
        writeln!(f, "Max-corr accuracy (test):  {:.4}", self.fused_test_accuracy)?;
        writeln!(f, "Max-corr accuracy (train): {:.4}", self.fused_train_accuracy)?;
        writeln!(f, "{} accuracy (test): {:.4}", self.classifier, self.classifier_test_accuracy)?;
        writeln!(f, "Average sigma: {:.4}", self.average_sigma())?;
        writeln!(f)?;
        write!(f, "{}", self.confusion)
    }
}

/// Scores fused predictions and the concatenated-feature baseline.
#[derive(Clone, Debug)]
pub struct Evaluator {
    num_classes: usize,
    classifier: ClassifierKind,
}

impl Evaluator {
    /// Evaluator over `num_classes` classes with the given baseline classifier.
    pub fn new(num_classes: usize, classifier: ClassifierKind) -> Self {
        Self { num_classes, classifier }
    }

    /// Evaluate a fusion output against the target labels.
    pub fn evaluate(
        &self,
        output: &FusionOutput,
        train_labels: &[usize],
        test_labels: &[usize],
    ) -> Result<EvalReport> {
        let predicted_train = argmax_rows(output.score_train.view());
        let predicted_test = argmax_rows(output.score_test.view());
        let fused_train_accuracy = accuracy(&predicted_train, train_labels)?;
        let fused_test_accuracy = accuracy(&predicted_test, test_labels)?;
        let confusion =
            ConfusionMatrix::from_predictions(&predicted_test, test_labels, self.num_classes)?;

        let mut classifier = build_classifier(self.classifier, self.num_classes);
        classifier.fit(output.concat_train.view(), train_labels)?;
        let baseline = classifier.predict(output.concat_test.view())?;
        let classifier_test_accuracy = accuracy(&baseline, test_labels)?;

        tracing::info!(
            fused_test_accuracy,
            classifier = classifier.name(),
            classifier_test_accuracy,
            "evaluation complete"
        );

        let tasks = output
            .statistics
            .iter()
            .enumerate()
            .map(|(task, stats)| TaskSummary {
                task,
                mean_sigma: stats.mean_strength(),
                zero_variance_dims: stats.diagnostics.zero_variance_dims.len(),
                empty_classes: stats.diagnostics.empty_classes.clone(),
            })
            .collect();

        Ok(EvalReport {
            num_classes: self.num_classes,
            num_tasks: output.statistics.len(),
            train_examples: train_labels.len(),
            test_examples: test_labels.len(),
            fused_train_accuracy,
            fused_test_accuracy,
            classifier: classifier.name().to_string(),
            classifier_test_accuracy,
            confusion,
            tasks,
        })
    }
}
