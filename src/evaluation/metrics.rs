//! Binary classification metrics

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Counts of a binary confusion matrix, churn (1) as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Tally hard predictions against labels
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t > 0.5, p > 0.5) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    fn ratio(num: usize, den: usize) -> f64 {
        if den > 0 {
            num as f64 / den as f64
        } else {
            0.0
        }
    }

    pub fn accuracy(&self) -> f64 {
        Self::ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        Self::ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        Self::ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1_score(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

/// Held-out metrics of one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
}

impl EvaluationResult {
    /// Score churn probabilities against labels at `threshold`
    pub fn compute(y_true: &Array1<f64>, y_proba: &Array1<f64>, threshold: f64) -> Result<Self> {
        if y_true.len() != y_proba.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} scores", y_true.len()),
                actual: format!("{} scores", y_proba.len()),
            });
        }
        if y_true.is_empty() {
            return Err(ChurnError::ValidationError(
                "cannot evaluate on zero rows".to_string(),
            ));
        }

        let y_pred = y_proba.mapv(|p| if p > threshold { 1.0 } else { 0.0 });
        let cm = ConfusionMatrix::from_predictions(y_true, &y_pred);
        Ok(Self {
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1_score: cm.f1_score(),
            roc_auc: roc_auc(y_true, y_proba),
        })
    }
}

/// Area under the ROC curve via the rank statistic, ties averaged.
///
/// Returns 0.5 when only one class is present.
pub fn roc_auc(y_true: &Array1<f64>, scores: &Array1<f64>) -> f64 {
    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; a tie group shares its mean rank
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();
    let u = rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    u / (n_pos * n_neg) as f64
}

/// One operating point of the ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// ROC operating points, one per distinct score, from (0, 0) to (1, 1)
pub fn roc_curve(y_true: &Array1<f64>, scores: &Array1<f64>) -> Vec<RocPoint> {
    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count() as f64;
    let n_neg = y_true.len() as f64 - n_pos;
    let rate = |count: usize, total: f64| if total > 0.0 { count as f64 / total } else { 0.0 };

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // above every score, so nothing is predicted positive
    let start = order.first().map_or(1.0, |&i| scores[i] + 1.0);
    let mut points = vec![RocPoint {
        threshold: start,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &idx) in order.iter().enumerate() {
        if y_true[idx] > 0.5 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_group = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_group {
            points.push(RocPoint {
                threshold: scores[idx],
                fpr: rate(fp, n_neg),
                tpr: rate(tp, n_pos),
            });
        }
    }
    points
}

/// Per-class precision / recall / F1 / support table
pub fn classification_report(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> String {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred);
    // the "No Churn" view swaps the roles of the two classes
    let negative_view = ConfusionMatrix {
        true_negative: cm.true_positive,
        false_positive: cm.false_negative,
        false_negative: cm.false_positive,
        true_positive: cm.true_negative,
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>12} {:>10} {:>10} {:>10} {:>10}",
        "", "precision", "recall", "f1-score", "support"
    );
    for (label, view, support) in [
        ("No Churn", negative_view, cm.true_negative + cm.false_positive),
        ("Churn", cm, cm.true_positive + cm.false_negative),
    ] {
        let _ = writeln!(
            out,
            "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            label,
            view.precision(),
            view.recall(),
            view.f1_score(),
            support
        );
    }
    let _ = writeln!(
        out,
        "\n{:>12} {:>10} {:>10} {:>10.4} {:>10}",
        "accuracy",
        "",
        "",
        cm.accuracy(),
        cm.total()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_counts() {
        let y_true = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0, 1.0];
        let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);

        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 1);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero_f1() {
        let y_true = array![1.0, 0.0];
        let y_pred = array![0.0, 0.0];
        let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.f1_score(), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        let y = array![0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&y, &array![0.1, 0.2, 0.8, 0.9]), 1.0);
        assert_eq!(roc_auc(&y, &array![0.9, 0.8, 0.2, 0.1]), 0.0);
    }

    #[test]
    fn test_roc_auc_ties_and_single_class() {
        let y = array![0.0, 1.0];
        assert_eq!(roc_auc(&y, &array![0.5, 0.5]), 0.5);
        assert_eq!(roc_auc(&array![1.0, 1.0], &array![0.2, 0.9]), 0.5);

        // one positive outranks one of two negatives
        let y = array![0.0, 1.0, 0.0];
        assert!((roc_auc(&y, &array![0.3, 0.5, 0.7]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_evaluation_result() {
        let y = array![0.0, 0.0, 1.0, 1.0];
        let proba = array![0.2, 0.6, 0.7, 0.9];
        let result = EvaluationResult::compute(&y, &proba, 0.5).unwrap();

        assert!((result.accuracy - 0.75).abs() < 1e-12);
        assert!((result.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.recall, 1.0);
        assert!((result.f1_score - 0.8).abs() < 1e-12);
        assert_eq!(result.roc_auc, 1.0);
    }

    #[test]
    fn test_probability_at_threshold_is_negative() {
        let y = array![0.0, 1.0];
        let result = EvaluationResult::compute(&y, &array![0.5, 0.9], 0.5).unwrap();
        assert_eq!(result.accuracy, 1.0);
        assert_eq!(result.precision, 1.0);
    }

    #[test]
    fn test_evaluation_shape_mismatch() {
        assert!(EvaluationResult::compute(&array![0.0], &array![0.1, 0.2], 0.5).is_err());
    }

    #[test]
    fn test_roc_curve_endpoints() {
        let y = array![0.0, 1.0, 0.0, 1.0];
        let points = roc_curve(&y, &array![0.1, 0.4, 0.35, 0.8]);

        assert_eq!(points.first().map(|p| (p.fpr, p.tpr)), Some((0.0, 0.0)));
        assert_eq!(points.last().map(|p| (p.fpr, p.tpr)), Some((1.0, 1.0)));
        assert_eq!(points.len(), 5);
        assert!(points.windows(2).all(|w| w[0].fpr <= w[1].fpr && w[0].tpr <= w[1].tpr));
    }

    #[test]
    fn test_classification_report_layout() {
        let y = array![0.0, 1.0, 1.0];
        let pred = array![0.0, 1.0, 0.0];
        let report = classification_report(&y, &pred);
        assert!(report.contains("No Churn"));
        assert!(report.contains("Churn"));
        assert!(report.contains("accuracy"));
        assert!(report.contains("support"));
    }
}
