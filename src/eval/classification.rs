//! Classification metrics for fused and auxiliary predictions
//!
//! - Row-wise argmax over score matrices
//! - Accuracy
//! - Confusion matrix with per-class recall

use ndarray::ArrayView2;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};

/// Predicted class per row: the index of the row's largest score.
///
/// Ties go to the lowest class index.
pub fn argmax_rows(scores: ArrayView2<'_, f32>) -> Vec<usize> {
    scores
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = (0, f32::NEG_INFINITY);
            for (c, &v) in row.iter().enumerate() {
                if v > best.1 {
                    best = (c, v);
                }
            }
            best.0
        })
        .collect()
}

/// Fraction of predictions equal to the target label.
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> Result<f64> {
    if y_pred.len() != y_true.len() {
        return Err(Error::shape("predictions", &[y_true.len()], &[y_pred.len()]));
    }
    if y_true.is_empty() {
        return Ok(0.0);
    }
    let correct = y_pred.iter().zip(y_true).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Confusion matrix over a fixed set of classes
///
/// Element [i][j] counts examples with true label i predicted as j.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    num_classes: usize,
}

impl ConfusionMatrix {
    /// Empty matrix over `num_classes` classes
    pub fn new(num_classes: usize) -> Self {
        Self { matrix: vec![vec![0; num_classes]; num_classes], num_classes }
    }

    /// Count predictions against targets.
    pub fn from_predictions(
        y_pred: &[usize],
        y_true: &[usize],
        num_classes: usize,
    ) -> Result<Self> {
        if y_pred.len() != y_true.len() {
            return Err(Error::shape("predictions", &[y_true.len()], &[y_pred.len()]));
        }

        let mut cm = Self::new(num_classes);
        for (&pred, &label) in y_pred.iter().zip(y_true) {
            let out_of_range = pred.max(label);
            if out_of_range >= num_classes {
                return Err(Error::LabelOutOfRange { label: out_of_range, num_classes });
            }
            cm.matrix[label][pred] += 1;
        }
        Ok(cm)
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Count at [true_label][predicted_label], or `None` outside the matrix
    pub fn get(&self, true_label: usize, predicted_label: usize) -> Option<usize> {
        self.matrix.get(true_label)?.get(predicted_label).copied()
    }

    /// Examples whose true label is `class`, or `None` for an unknown class
    pub fn support(&self, class: usize) -> Option<usize> {
        self.matrix.get(class).map(|row| row.iter().sum())
    }

    /// Total number of examples
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.num_classes).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Recall of one class (0 when it has no support), or `None` for an
    /// unknown class
    pub fn recall(&self, class: usize) -> Option<f64> {
        let support = self.support(class)?;
        if support == 0 {
            return Some(0.0);
        }
        Some(self.matrix[class][class] as f64 / support as f64)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "      ")?;
        for j in 0..self.num_classes {
            write!(f, "Pred {j} ")?;
        }
        writeln!(f)?;

        for i in 0..self.num_classes {
            write!(f, "True {i}")?;
            for j in 0..self.num_classes {
                write!(f, "{:>6} ", self.matrix[i][j])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_argmax_rows() {
        let scores = array![[0.1, 0.9, 0.0], [2.0, -1.0, 1.0], [0.5, 0.5, 0.2]];
        assert_eq!(argmax_rows(scores.view()), vec![1, 0, 0]);
    }

    #[test]
    fn test_argmax_all_negative() {
        let scores = array![[-3.0, -1.0, -2.0]];
        assert_eq!(argmax_rows(scores.view()), vec![1]);
    }

    #[test]
    fn test_accuracy() {
        assert_relative_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap(), 0.75);
        assert_relative_eq!(accuracy(&[], &[]).unwrap(), 0.0);
        assert!(accuracy(&[0], &[0, 1]).is_err());
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1, 2, 0], &[0, 1, 0, 2, 1], 3).unwrap();

        assert_eq!(cm.get(0, 0), Some(1));
        assert_eq!(cm.get(0, 1), Some(1));
        assert_eq!(cm.get(1, 0), Some(1));
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.support(0), Some(2));
        assert_relative_eq!(cm.accuracy(), 0.6);
        assert_relative_eq!(cm.recall(2).unwrap(), 1.0);
    }

    #[test]
    fn test_confusion_matrix_keeps_absent_classes() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0], &[0, 0], 5).unwrap();
        assert_eq!(cm.num_classes(), 5);
        assert_relative_eq!(cm.recall(4).unwrap(), 0.0);
    }

    #[test]
    fn test_out_of_range_class_is_none() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1], &[1, 1], 2).unwrap();
        assert_eq!(cm.get(2, 0), None);
        assert_eq!(cm.get(0, 2), None);
        assert_eq!(cm.support(2), None);
        assert_eq!(cm.recall(2), None);
    }

    #[test]
    fn test_confusion_matrix_label_out_of_range() {
        let err = ConfusionMatrix::from_predictions(&[0, 3], &[0, 1], 2).unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { label: 3, num_classes: 2 }));
    }

    #[test]
    fn test_display() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1], &[0, 1], 2).unwrap();
        let text = cm.to_string();
        assert!(text.contains("Pred 1"));
        assert!(text.contains("True 0"));
    }
}
