//! Property tests for the maximal-correlation statistics engine
//!
//! Ensures statistics and scores satisfy their invariants:
//! - Output shapes follow (N, D, C)
//! - Correlation strengths are non-negative and finite
//! - Negating an embedding dimension leaves sigma and the scores unchanged
//! - Constant dimensions contribute nothing
//! - Identical tasks add linearly

use maxcorr::data::Batch;
use maxcorr::eval::argmax_rows;
use maxcorr::extractor::IdentityExtractor;
use maxcorr::fusion::scorer::score_embedding;
use maxcorr::fusion::statistics::from_embedding;
use maxcorr::fusion::{FusionEnsemble, FusionTask};
use ndarray::Array2;
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// Strategy Helpers
// =============================================================================

/// An N×D embedding with labels in [0, C), plus C.
fn labelled_embedding(
    max_n: usize,
    max_d: usize,
    max_c: usize,
) -> impl Strategy<Value = (Array2<f32>, Vec<usize>, usize)> {
    (1..=max_n, 1..=max_d, 1..=max_c).prop_flat_map(|(n, d, c)| {
        (vec(-10.0f32..10.0, n * d), vec(0..c, n)).prop_map(move |(values, labels)| {
            let embedding = Array2::from_shape_vec((n, d), values).expect("n*d values");
            (embedding, labels, c)
        })
    })
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-5 * (1.0 + a.abs().max(b.abs()))
}

// =============================================================================
// Statistics Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_shape_contract((e, labels, c) in labelled_embedding(40, 12, 6)) {
        let (n, d) = e.dim();
        let stats = from_embedding(e.clone(), &labels, c).unwrap();

        prop_assert_eq!(stats.sigma.len(), d);
        prop_assert_eq!(stats.g.dim(), (c, d));

        let scores = score_embedding(e, stats.sigma.view(), stats.g.view()).unwrap();
        prop_assert_eq!(scores.dim(), (n, c));
    }

    #[test]
    fn prop_sigma_non_negative_and_finite((e, labels, c) in labelled_embedding(40, 12, 6)) {
        let stats = from_embedding(e, &labels, c).unwrap();

        for &s in &stats.sigma {
            prop_assert!(s >= 0.0, "sigma {} is negative", s);
            prop_assert!(s.is_finite());
        }
        prop_assert!(stats.g.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn prop_negating_a_dimension_preserves_sigma_and_scores(
        (e, labels, c) in labelled_embedding(30, 8, 5),
        pick in any::<prop::sample::Index>(),
    ) {
        let d = pick.index(e.ncols());
        let mut flipped = e.clone();
        flipped.column_mut(d).mapv_inplace(|v| -v);

        let original = from_embedding(e.clone(), &labels, c).unwrap();
        let negated = from_embedding(flipped.clone(), &labels, c).unwrap();

        for (a, b) in original.sigma.iter().zip(&negated.sigma) {
            prop_assert!(close(*a, *b), "sigma changed: {} vs {}", a, b);
        }
        // g follows the embedding: the flipped column is negated, the rest are untouched.
        for ((row, col), &a) in original.g.indexed_iter() {
            let b = negated.g[[row, col]];
            let expected = if col == d { -a } else { a };
            prop_assert!(close(expected, b), "g[{}, {}]: {} vs {}", row, col, expected, b);
        }

        let s1 = score_embedding(e, original.sigma.view(), original.g.view()).unwrap();
        let s2 = score_embedding(flipped, negated.sigma.view(), negated.g.view()).unwrap();
        for (a, b) in s1.iter().zip(&s2) {
            prop_assert!((a - b).abs() <= 1e-3 * (1.0 + a.abs()), "score {} vs {}", a, b);
        }
    }

    #[test]
    fn prop_constant_dimension_is_zero(
        (mut e, labels, c) in labelled_embedding(30, 8, 5),
        pick in any::<prop::sample::Index>(),
        value in -5.0f32..5.0,
    ) {
        let d = pick.index(e.ncols());
        e.column_mut(d).fill(value);

        let stats = from_embedding(e, &labels, c).unwrap();

        prop_assert_eq!(stats.sigma[d], 0.0);
        prop_assert!(stats.g.column(d).iter().all(|&v| v == 0.0));
        prop_assert!(stats.diagnostics.zero_variance_dims.contains(&d));
    }

    #[test]
    fn prop_statistics_deterministic((e, labels, c) in labelled_embedding(30, 8, 5)) {
        let a = from_embedding(e.clone(), &labels, c).unwrap();
        let b = from_embedding(e, &labels, c).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_out_of_range_label_rejected((e, mut labels, c) in labelled_embedding(20, 4, 4)) {
        labels[0] = c;
        prop_assert!(from_embedding(e, &labels, c).is_err());
    }
}

// =============================================================================
// Fusion Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_identical_tasks_add_linearly(
        (e, labels, c) in labelled_embedding(24, 6, 4),
        k in 2usize..5,
    ) {
        let batch = Batch::new(e.clone(), labels).unwrap();
        let extractor = IdentityExtractor::new(e.ncols());
        let splits = std::slice::from_ref(&batch);
        let ensemble = FusionEnsemble::new(c);

        let single = ensemble.fuse(&[FusionTask::new(&extractor, &batch)], splits, splits).unwrap();
        let tasks = vec![FusionTask::new(&extractor, &batch); k];
        let many = ensemble.fuse(&tasks, splits, splits).unwrap();

        for (a, b) in single.score_test.iter().zip(&many.score_test) {
            let expected = k as f32 * a;
            prop_assert!((expected - b).abs() <= 1e-3 * (1.0 + expected.abs()));
        }
        prop_assert_eq!(many.concat_test.ncols(), k * e.ncols());
    }

    #[test]
    fn prop_fused_predictions_in_range((e, labels, c) in labelled_embedding(24, 6, 4)) {
        let batch = Batch::new(e.clone(), labels).unwrap();
        let extractor = IdentityExtractor::new(e.ncols());
        let splits = std::slice::from_ref(&batch);

        let out = FusionEnsemble::new(c)
            .fuse(&[FusionTask::new(&extractor, &batch)], splits, splits)
            .unwrap();

        let predicted = argmax_rows(out.score_test.view());
        prop_assert_eq!(predicted.len(), e.nrows());
        prop_assert!(predicted.iter().all(|&p| p < c));
    }
}
