use std::fmt;

use anyhow::{bail, ensure};
use tract_onnx::prelude::TractResult;

/// Number of predictions reported by default.
pub const TOP_K: usize = 5;

/// One ranked class.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Index of the class in the score vector and label list.
    pub class: usize,
    pub label: String,
    pub score: f32,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} {}", self.rank, self.label, self.score)
    }
}

/// Returns the `k` best scoring classes, best first.
///
/// Equal scores keep their class index order. Fails when `k` is zero, when
/// labels and scores are not parallel, when fewer than `k` classes exist, or
/// when a score is NaN.
pub fn top_k(scores: &[f32], labels: &[String], k: usize) -> TractResult<Vec<Prediction>> {
    ensure!(k > 0, "At least one class must be ranked");
    ensure!(
        labels.len() == scores.len(),
        "Got {} scores for {} labels",
        scores.len(),
        labels.len()
    );
    ensure!(scores.len() >= k, "Can not rank {} classes, at least {} required", scores.len(), k);
    if let Some(ix) = scores.iter().position(|s| s.is_nan()) {
        bail!("Found NaN score for class {} ({})", ix, labels[ix]);
    }
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(indexed
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(rank, (class, score))| Prediction {
            rank: rank + 1,
            class,
            label: labels[class].clone(),
            score,
        })
        .collect())
}

/// In-place softmax, shifted by the max for stability.
///
/// Infinite or NaN scores have no probability and are refused.
pub fn softmax(scores: &mut [f32]) -> TractResult<()> {
    if let Some(ix) = scores.iter().position(|s| !s.is_finite()) {
        bail!("Found non-finite score {} for class {}", scores[ix], ix);
    }
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    if sum > 0.0 {
        scores.iter_mut().for_each(|s| *s /= sum);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class_{i}")).collect()
    }

    proptest! {
        #[test]
        fn five_sorted_pairs(scores in vec(-1000f32..1000f32, 5..300)) {
            let ranked = top_k(&scores, &labels(scores.len()), TOP_K).unwrap();
            prop_assert_eq!(ranked.len(), 5);
            prop_assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
            let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            prop_assert_eq!(ranked[0].score, max);
            for p in &ranked {
                prop_assert_eq!(scores[p.class], p.score);
                prop_assert_eq!(&p.label, &format!("class_{}", p.class));
            }
        }

        #[test]
        fn idempotent(scores in vec(-10f32..10f32, 5..50)) {
            let labels = labels(scores.len());
            let first = top_k(&scores, &labels, TOP_K).unwrap();
            prop_assert_eq!(first, top_k(&scores, &labels, TOP_K).unwrap());
        }
    }

    #[test]
    fn golden_retriever_first() {
        let mut labels = labels(1000);
        labels[208] = "golden retriever".to_string();
        let mut scores = vec![0.0f32; 1000];
        scores[208] = 17.25;
        scores[207] = 12.5;
        let ranked = top_k(&scores, &labels, TOP_K).unwrap();
        assert_eq!(ranked[0].to_string(), "1: golden retriever 17.25");
        assert_eq!(ranked[1].to_string(), "2: class_207 12.5");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn ties_keep_class_order() {
        let ranked = top_k(&[1.0, 3.0, 1.0, 3.0, 1.0, 0.0], &labels(6), 5).unwrap();
        let classes: Vec<usize> = ranked.iter().map(|p| p.class).collect();
        assert_eq!(classes, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn fewer_classes_than_k() {
        assert!(top_k(&[0.1, 0.2, 0.3], &labels(3), TOP_K).is_err());
        assert_eq!(top_k(&[0.1, 0.2, 0.3], &labels(3), 3).unwrap().len(), 3);
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(top_k(&[0.0; 10], &labels(10), 0).is_err());
    }

    #[test]
    fn short_label_list() {
        assert!(top_k(&[0.0; 10], &labels(9), TOP_K).is_err());
        assert!(top_k(&[0.0; 9], &labels(10), TOP_K).is_err());
    }

    #[test]
    fn nan_is_rejected() {
        assert!(top_k(&[0.0, 1.0, f32::NAN, 2.0, 3.0], &labels(5), TOP_K).is_err());
    }

    #[test]
    fn softmax_sums_to_one() {
        let mut large = vec![0.0f32, 1000.0];
        softmax(&mut large).unwrap();
        assert_abs_diff_eq!(large[1], 1.0);

        let mut scores = vec![1.0f32, 2.0, 3.0, 10.0, -4.0];
        softmax(&mut scores).unwrap();
        assert_abs_diff_eq!(scores.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(scores.iter().all(|s| s.is_finite()));
        assert!(scores[3] > scores[2] && scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn softmax_refuses_infinite_scores() {
        let mut scores = vec![1.0f32, f32::INFINITY, 0.0, 2.0, 3.0];
        let e = softmax(&mut scores).unwrap_err();
        assert_eq!(e.to_string(), "Found non-finite score inf for class 1");
        assert!(softmax(&mut [0.0, f32::NEG_INFINITY]).is_err());
        assert!(softmax(&mut [f32::NAN, 0.0]).is_err());
    }
}
