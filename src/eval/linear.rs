//! Linear classifiers for the concatenated-feature baseline
//!
//! Both classifiers standardize features with statistics from the training
//! set and delegate the fit to linfa: `linfa-svm` with a linear kernel and
//! `linfa-logistic` multinomial regression. Features are widened to f64 on
//! the way in. A training set with a single class fits a constant predictor.

use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::classification::argmax_rows;
use crate::config::ClassifierKind;
use crate::error::{Error, Result};

/// Classifier capability used by the evaluator.
pub trait LinearClassifier: Send {
    /// Fit on an N×P feature matrix with one label per row.
    fn fit(&mut self, features: ArrayView2<'_, f32>, labels: &[usize]) -> Result<()>;

    /// Predict a label for every row.
    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>>;

    /// Short display name.
    fn name(&self) -> &'static str;
}

/// Build the classifier selected in the configuration.
pub fn build_classifier(kind: ClassifierKind, num_classes: usize) -> Box<dyn LinearClassifier> {
    match kind {
        ClassifierKind::Svm => Box::new(LinearSvc::new(num_classes)),
        ClassifierKind::Logistic => Box::new(LogisticRegression::new(num_classes)),
    }
}

/// Per-column standardization learned from the training set.
struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows() as f64;
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x
            .axis_iter(Axis(1))
            .zip(&mean)
            .map(|(column, &m)| {
                let var = column.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / n;
                if var > 0.0 {
                    var.sqrt()
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, scale }
    }

    fn transform(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f64>> {
        if features.ncols() != self.mean.len() {
            return Err(Error::shape(
                "classifier features",
                &[features.nrows(), self.mean.len()],
                features.shape(),
            ));
        }
        let mut z = features.mapv(f64::from);
        z -= &self.mean;
        z /= &self.scale;
        Ok(z)
    }
}

/// Validate a training set; returns the widened features and the sorted
/// distinct labels.
fn training_set(
    features: ArrayView2<'_, f32>,
    labels: &[usize],
    num_classes: usize,
) -> Result<(Standardizer, Array2<f64>, Vec<usize>)> {
    let n = features.nrows();
    if n == 0 {
        return Err(Error::InvalidParameter("cannot fit a classifier on zero examples".into()));
    }
    if labels.len() != n {
        return Err(Error::shape("classifier labels", &[n], &[labels.len()]));
    }
    if num_classes == 0 {
        return Err(Error::InvalidParameter("num_classes must be positive".into()));
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= num_classes) {
        return Err(Error::LabelOutOfRange { label, num_classes });
    }

    let standardizer = Standardizer::fit(&features.mapv(f64::from));
    let z = standardizer.transform(features)?;

    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    Ok((standardizer, z, classes))
}

fn not_fitted(name: &str) -> Error {
    Error::InvalidParameter(format!("{name} has not been fitted"))
}

fn fit_failed(name: &'static str, err: impl std::fmt::Display) -> Error {
    Error::Classifier { name, message: err.to_string() }
}

enum SvcModel {
    Constant(usize),
    Binary { positive: usize, negative: usize, svm: Svm<f64, bool> },
    /// One Platt-scaled machine per class present in training
    OneVsRest(Vec<(usize, Svm<f64, Pr>)>),
}

/// Linear-kernel SVM; one-vs-rest when more than two classes are present.
pub struct LinearSvc {
    num_classes: usize,
    penalty: f64,
    fitted: Option<(Standardizer, SvcModel)>,
}

impl LinearSvc {
    /// Unfitted classifier over `num_classes` classes.
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes, penalty: 1.0, fitted: None }
    }

    /// Override the misclassification penalty `C` (default 1).
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    fn fit_model(&self, z: Array2<f64>, labels: &[usize], classes: &[usize]) -> Result<SvcModel> {
        let c = self.penalty;
        match *classes {
            [only] => Ok(SvcModel::Constant(only)),
            [negative, positive] => {
                let targets: Array1<bool> = labels.iter().map(|&l| l == positive).collect();
                let svm = Svm::<f64, bool>::params()
                    .pos_neg_weights(c, c)
                    .linear_kernel()
                    .fit(&Dataset::new(z, targets))
                    .map_err(|e| fit_failed(self.name(), e))?;
                Ok(SvcModel::Binary { positive, negative, svm })
            }
            _ => {
                let mut machines = Vec::with_capacity(classes.len());
                for &class in classes {
                    let targets: Array1<bool> = labels.iter().map(|&l| l == class).collect();
                    let svm = Svm::<f64, Pr>::params()
                        .pos_neg_weights(c, c)
                        .linear_kernel()
                        .fit(&Dataset::new(z.clone(), targets))
                        .map_err(|e| fit_failed(self.name(), e))?;
                    machines.push((class, svm));
                }
                Ok(SvcModel::OneVsRest(machines))
            }
        }
    }
}

impl LinearClassifier for LinearSvc {
    fn fit(&mut self, features: ArrayView2<'_, f32>, labels: &[usize]) -> Result<()> {
        let (standardizer, z, classes) = training_set(features, labels, self.num_classes)?;
        let model = self.fit_model(z, labels, &classes)?;
        self.fitted = Some((standardizer, model));
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        let (standardizer, model) = self.fitted.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        let z = standardizer.transform(features)?;

        match model {
            SvcModel::Constant(class) => Ok(vec![*class; z.nrows()]),
            SvcModel::Binary { positive, negative, svm } => {
                let hits: Array1<bool> = svm.predict(&z);
                Ok(hits.iter().map(|&hit| if hit { *positive } else { *negative }).collect())
            }
            SvcModel::OneVsRest(machines) => {
                let mut scores = Array2::<f32>::from_elem((z.nrows(), self.num_classes), -1.0);
                for (class, svm) in machines {
                    let pr: Array1<Pr> = svm.predict(&z);
                    scores.column_mut(*class).assign(&pr.mapv(|p| *p));
                }
                Ok(argmax_rows(scores.view()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "linear-svc"
    }
}

enum LogisticModel {
    Constant(usize),
    Multinomial(MultiFittedLogisticRegression<f64, usize>),
}

/// Multinomial logistic regression.
pub struct LogisticRegression {
    num_classes: usize,
    alpha: f64,
    max_iterations: u64,
    fitted: Option<(Standardizer, LogisticModel)>,
}

impl LogisticRegression {
    /// Unfitted classifier over `num_classes` classes.
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes, alpha: 1e-3, max_iterations: 200, fitted: None }
    }

    /// Override the L2 penalty (default 1e-3).
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Override the solver iteration cap (default 200).
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Class probabilities, one row per example and one column per class.
    ///
    /// Classes absent from training get probability 0.
    pub fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        let (standardizer, model) = self.fitted.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        let z = standardizer.transform(features)?;

        let mut proba = Array2::<f32>::zeros((z.nrows(), self.num_classes));
        match model {
            LogisticModel::Constant(class) => proba.column_mut(*class).fill(1.0),
            LogisticModel::Multinomial(fitted) => {
                let fitted_proba = fitted.predict_probabilities(&z);
                for (column, &class) in fitted_proba.axis_iter(Axis(1)).zip(fitted.classes()) {
                    proba.column_mut(class).assign(&column.mapv(|p| p as f32));
                }
            }
        }
        Ok(proba)
    }
}

impl LinearClassifier for LogisticRegression {
    fn fit(&mut self, features: ArrayView2<'_, f32>, labels: &[usize]) -> Result<()> {
        let (standardizer, z, classes) = training_set(features, labels, self.num_classes)?;

        let model = if let [only] = classes[..] {
            LogisticModel::Constant(only)
        } else {
            let targets: Array1<usize> = labels.iter().copied().collect();
            let fitted = MultiLogisticRegression::default()
                .alpha(self.alpha)
                .max_iterations(self.max_iterations)
                .fit(&Dataset::new(z, targets))
                .map_err(|e| fit_failed(self.name(), e))?;
            LogisticModel::Multinomial(fitted)
        };
        self.fitted = Some((standardizer, model));
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        let (standardizer, model) = self.fitted.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        let z = standardizer.transform(features)?;

        Ok(match model {
            LogisticModel::Constant(class) => vec![*class; z.nrows()],
            LogisticModel::Multinomial(fitted) => {
                let predicted: Array1<usize> = fitted.predict(&z);
                predicted.to_vec()
            }
        })
    }

    fn name(&self) -> &'static str {
        "logistic-regression"
    }
}
