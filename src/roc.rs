//! # ROC Curves on a Shared Threshold Grid
//!
//! Receiver operating characteristic curves computed per demographic group,
//! plus the between-group error-rate ratio series built from them.
//!
//! The threshold grid is always derived from the full dataset's distinct
//! normalized scores, not from the records of one group. Two curves computed
//! from the same dataset therefore share their grid by construction, which
//! is what makes the elementwise FPR/TPR ratios in [`error_rate_ratio`]
//! meaningful. Curves built from different datasets may carry different
//! grids; the ratio computation checks for that and fails loudly instead of
//! silently pairing rates taken at different thresholds.
//!
//! Sentinels: the grid starts at +∞ (nothing is predicted positive, the
//! curve starts at (0, 0)) and ends at −∞ (everything is predicted positive,
//! the curve ends at (1, 1)). A record is predicted positive at threshold `t`
//! when `normalized_score >= t`.

use itertools::Itertools;
use ndarray::{Array1, Zip};
use thiserror::Error;

use crate::data::Dataset;

/// Errors raised during ROC curve and ratio construction.
#[derive(Error, Debug)]
pub enum RocError {
    #[error("Cannot build a threshold grid from an empty dataset.")]
    EmptyGrid,

    #[error(
        "Record {index} (group '{group}') has no normalized score. Call Dataset::normalize before computing ROC curves."
    )]
    MissingNormalizedScore { group: String, index: usize },

    #[error(
        "Group '{group}' has {positives} positive and {negatives} negative outcomes; both must be nonzero for true/false positive rates to be defined."
    )]
    InsufficientData {
        group: String,
        positives: usize,
        negatives: usize,
    },

    #[error(
        "ROC threshold grids are misaligned ({left_len} vs {right_len} thresholds, or differing threshold values). Both curves must be computed from the same dataset."
    )]
    ThresholdMismatch { left_len: usize, right_len: usize },
}

/// A per-group ROC curve: parallel arrays of thresholds (descending, with
/// ±∞ sentinels), false positive rates, and true positive rates. FPR and
/// TPR are non-decreasing as the threshold descends. Immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct RocCurve {
    group: String,
    thresholds: Array1<f64>,
    fpr: Array1<f64>,
    tpr: Array1<f64>,
}

impl RocCurve {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn thresholds(&self) -> &Array1<f64> {
        &self.thresholds
    }

    pub fn fpr(&self) -> &Array1<f64> {
        &self.fpr
    }

    pub fn tpr(&self) -> &Array1<f64> {
        &self.tpr
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// `(threshold, fpr, tpr)` triples in grid order (threshold descending).
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.thresholds
            .iter()
            .zip(self.fpr.iter())
            .zip(self.tpr.iter())
            .map(|((&t, &fpr), &tpr)| (t, fpr, tpr))
    }

    /// Trapezoidal area under the (FPR, TPR) curve. 0.5 means the score does
    /// not separate outcomes at all; 1.0 means it separates them perfectly.
    pub fn auc(&self) -> f64 {
        let mut area = 0.0;
        for i in 1..self.len() {
            let width = self.fpr[i] - self.fpr[i - 1];
            area += 0.5 * (self.tpr[i] + self.tpr[i - 1]) * width;
        }
        area
    }
}

/// Elementwise FPR and TPR ratios between two ROC curves at matching
/// thresholds. Entries where the denominator curve's rate is exactly zero
/// hold `NaN`.
#[derive(Debug, Clone)]
pub struct RatioSeries {
    thresholds: Array1<f64>,
    fpr_ratio: Array1<f64>,
    tpr_ratio: Array1<f64>,
}

impl RatioSeries {
    pub fn thresholds(&self) -> &Array1<f64> {
        &self.thresholds
    }

    pub fn fpr_ratio(&self) -> &Array1<f64> {
        &self.fpr_ratio
    }

    pub fn tpr_ratio(&self) -> &Array1<f64> {
        &self.tpr_ratio
    }

    /// `(threshold, fpr_ratio, tpr_ratio)` triples in grid order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.thresholds
            .iter()
            .zip(self.fpr_ratio.iter())
            .zip(self.tpr_ratio.iter())
            .map(|((&t, &fpr), &tpr)| (t, fpr, tpr))
    }
}

/// The full dataset's distinct normalized scores, descending, with a +∞
/// sentinel prepended and a −∞ sentinel appended.
///
/// Fails with [`RocError::EmptyGrid`] on an empty dataset and with
/// [`RocError::MissingNormalizedScore`] when any record has not been
/// normalized.
pub fn threshold_grid(dataset: &Dataset) -> Result<Array1<f64>, RocError> {
    if dataset.is_empty() {
        return Err(RocError::EmptyGrid);
    }

    let mut scores = Vec::with_capacity(dataset.len());
    for (index, record) in dataset.iter().enumerate() {
        let score = record
            .normalized_score()
            .ok_or_else(|| RocError::MissingNormalizedScore {
                group: record.group().to_string(),
                index,
            })?;
        scores.push(score);
    }

    scores.sort_by(|a, b| b.total_cmp(a));
    let mut grid = Vec::with_capacity(scores.len() + 2);
    grid.push(f64::INFINITY);
    grid.extend(
        scores
            .into_iter()
            .dedup_by(|a, b| a.total_cmp(b).is_eq()),
    );
    grid.push(f64::NEG_INFINITY);
    Ok(Array1::from_vec(grid))
}

/// Computes the ROC curve for one group against the full dataset's
/// threshold grid.
///
/// At each threshold `t` a record is predicted positive when its normalized
/// score is at least `t`; FPR is false positives over the group's actual
/// negatives, TPR is true positives over its actual positives. Fails with
/// [`RocError::InsufficientData`] when the group has no positive or no
/// negative outcomes (a group with no records at all fails the same way,
/// with both counts zero).
pub fn roc_curve(dataset: &Dataset, group: &str) -> Result<RocCurve, RocError> {
    let grid = threshold_grid(dataset)?;
    let records = dataset.group_records(group);

    // threshold_grid already validated every record, so the scores are known
    // to be present here.
    let mut scored: Vec<(f64, bool)> = records
        .iter()
        .filter_map(|record| record.normalized_score().map(|s| (s, record.outcome())))
        .collect();

    let positives = scored.iter().filter(|(_, outcome)| *outcome).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(RocError::InsufficientData {
            group: group.to_string(),
            positives,
            negatives,
        });
    }
    log::debug!(
        "Group '{group}': {positives} positives, {negatives} negatives over {} thresholds",
        grid.len()
    );

    // Single descending sweep: as the threshold drops, records whose score
    // clears it accumulate into the predicted-positive set.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut fpr = Vec::with_capacity(grid.len());
    let mut tpr = Vec::with_capacity(grid.len());
    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut next = 0usize;
    for &threshold in grid.iter() {
        while next < scored.len() && scored[next].0 >= threshold {
            if scored[next].1 {
                true_positives += 1;
            } else {
                false_positives += 1;
            }
            next += 1;
        }
        fpr.push(false_positives as f64 / negatives as f64);
        tpr.push(true_positives as f64 / positives as f64);
    }

    Ok(RocCurve {
        group: group.to_string(),
        thresholds: grid,
        fpr: Array1::from_vec(fpr),
        tpr: Array1::from_vec(tpr),
    })
}

/// Divides `numerator`'s FPR and TPR by `denominator`'s at every shared
/// threshold.
///
/// Fails with [`RocError::ThresholdMismatch`] when the two grids differ in
/// length or in any threshold value; pairing rates taken at different
/// thresholds would silently misalign the ratios. Entries where the
/// denominator's rate is exactly zero are reported as `NaN` rather than
/// failing, so a partly degenerate grid still yields the remaining ratios.
pub fn error_rate_ratio(
    numerator: &RocCurve,
    denominator: &RocCurve,
) -> Result<RatioSeries, RocError> {
    let aligned = numerator.len() == denominator.len()
        && numerator
            .thresholds
            .iter()
            .zip(denominator.thresholds.iter())
            .all(|(a, b)| a.total_cmp(b).is_eq());
    if !aligned {
        return Err(RocError::ThresholdMismatch {
            left_len: numerator.len(),
            right_len: denominator.len(),
        });
    }

    let ratio = |num: &Array1<f64>, den: &Array1<f64>| {
        Zip::from(num)
            .and(den)
            .map_collect(|&n, &d| if d == 0.0 { f64::NAN } else { n / d })
    };

    Ok(RatioSeries {
        thresholds: numerator.thresholds.clone(),
        fpr_ratio: ratio(&numerator.fpr, &denominator.fpr),
        tpr_ratio: ratio(&numerator.tpr, &denominator.tpr),
    })
}
