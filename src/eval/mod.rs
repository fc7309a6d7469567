//! Evaluation of fused predictions
//!
//! - `classification`: argmax, accuracy, confusion matrix
//! - `linear`: linear classifiers for the concatenated-feature baseline
//! - `evaluator`: [`Evaluator`] producing an [`EvalReport`]

pub mod classification;
pub mod evaluator;
pub mod linear;

pub use classification::{accuracy, argmax_rows, ConfusionMatrix};
pub use evaluator::{EvalReport, Evaluator, TaskSummary};
pub use linear::{build_classifier, LinearClassifier, LinearSvc, LogisticRegression};
