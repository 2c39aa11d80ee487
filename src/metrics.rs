//! # Group-Conditional Descriptive Metrics
//!
//! Score distributions per demographic group, outcome rates, and the
//! disparate impact ratio between two groups. These are the aggregation
//! steps behind the usual fairness tables: "what fraction of each group
//! lands in each score category" and "how much more often does the adverse
//! outcome fall on one group than another".
//!
//! Everything here is a pure function of an immutable [`Dataset`]; results
//! are freshly allocated on every call.

use itertools::Itertools;
use thiserror::Error;

use crate::data::Dataset;

/// Errors raised by the descriptive metric computations.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("No records belong to group '{group}'.")]
    UnknownGroup { group: String },

    #[error(
        "The rate of outcome {outcome} in group '{group}' is zero, so the impact ratio is undefined."
    )]
    DivisionByZero { group: String, outcome: bool },

    #[error("Correlation is undefined: the '{column}' column has zero variance.")]
    ZeroVariance { column: &'static str },
}

/// One score category within a group's distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBin {
    /// The distinct score value this bin counts.
    pub score: f64,
    /// Number of the group's records with exactly this score.
    pub count: usize,
    /// `count` divided by the group's population.
    pub fraction: f64,
}

/// The score distribution of a single group, bins ordered by ascending score.
/// Bin fractions sum to 1 within floating tolerance.
#[derive(Debug, Clone)]
pub struct GroupDistribution {
    group: String,
    total: usize,
    bins: Vec<ScoreBin>,
}

impl GroupDistribution {
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Number of records the distribution was computed over.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn bins(&self) -> &[ScoreBin] {
        &self.bins
    }
}

/// Per-group descriptive summary: population size, score location and
/// spread, and the adverse-outcome base rate.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: String,
    pub count: usize,
    pub mean_score: f64,
    /// Population standard deviation of the raw scores.
    pub score_std: f64,
    /// Fraction of the group with `outcome == true`.
    pub base_rate: f64,
}

/// Counts the records of `group` by distinct score value and normalizes the
/// counts to fractions of the group's population.
///
/// Fails with [`MetricsError::UnknownGroup`] when no record carries `group`.
pub fn group_distribution(dataset: &Dataset, group: &str) -> Result<GroupDistribution, MetricsError> {
    let records = dataset.group_records(group);
    if records.is_empty() {
        return Err(MetricsError::UnknownGroup {
            group: group.to_string(),
        });
    }

    let total = records.len();
    let mut scores: Vec<f64> = records.iter().map(|record| record.score()).collect();
    scores.sort_by(f64::total_cmp);

    let bins = scores
        .into_iter()
        .dedup_by_with_count(|a, b| a.total_cmp(b).is_eq())
        .map(|(count, score)| ScoreBin {
            score,
            count,
            fraction: count as f64 / total as f64,
        })
        .collect();

    log::debug!("Group '{group}': {total} records binned by distinct score value");
    Ok(GroupDistribution {
        group: group.to_string(),
        total,
        bins,
    })
}

/// Fraction of `group` whose outcome equals `outcome_value`.
///
/// Fails with [`MetricsError::UnknownGroup`] when the group has no records.
pub fn outcome_rate(
    dataset: &Dataset,
    group: &str,
    outcome_value: bool,
) -> Result<f64, MetricsError> {
    let records = dataset.group_records(group);
    if records.is_empty() {
        return Err(MetricsError::UnknownGroup {
            group: group.to_string(),
        });
    }
    let matching = records
        .iter()
        .filter(|record| record.outcome() == outcome_value)
        .count();
    Ok(matching as f64 / records.len() as f64)
}

/// Disparate impact of `favored` relative to `reference`, as a percentage:
/// 100 × (rate(favored) / rate(reference) − 1) where each rate is the
/// fraction of the group with `outcome == outcome_value`.
///
/// A result of −33.3 reads "the favored group experiences the outcome a
/// third less often than the reference group". Fails with
/// [`MetricsError::DivisionByZero`] when the reference group's rate is zero.
pub fn disparate_impact(
    dataset: &Dataset,
    favored: &str,
    reference: &str,
    outcome_value: bool,
) -> Result<f64, MetricsError> {
    let favored_rate = outcome_rate(dataset, favored, outcome_value)?;
    let reference_rate = outcome_rate(dataset, reference, outcome_value)?;
    if reference_rate == 0.0 {
        return Err(MetricsError::DivisionByZero {
            group: reference.to_string(),
            outcome: outcome_value,
        });
    }
    log::debug!(
        "Disparate impact: rate('{favored}')={favored_rate:.4}, rate('{reference}')={reference_rate:.4}"
    );
    Ok(100.0 * (favored_rate / reference_rate - 1.0))
}

/// Descriptive summaries for every group, in first-appearance order. An
/// empty dataset yields an empty list.
pub fn group_summary(dataset: &Dataset) -> Vec<GroupSummary> {
    dataset
        .groups()
        .into_iter()
        .map(|group| {
            let records = dataset.group_records(&group);
            let count = records.len();
            let mean_score =
                records.iter().map(|record| record.score()).sum::<f64>() / count as f64;
            let variance = records
                .iter()
                .map(|record| {
                    let d = record.score() - mean_score;
                    d * d
                })
                .sum::<f64>()
                / count as f64;
            let positives = records.iter().filter(|record| record.outcome()).count();
            GroupSummary {
                group,
                count,
                mean_score,
                score_std: variance.sqrt(),
                base_rate: positives as f64 / count as f64,
            }
        })
        .collect()
}

/// Pearson correlation between the raw score and the binary outcome
/// (encoded 0/1) across the whole dataset.
///
/// Fails with [`MetricsError::ZeroVariance`] when either column is constant,
/// including the empty-dataset case.
pub fn score_outcome_correlation(dataset: &Dataset) -> Result<f64, MetricsError> {
    let n = dataset.len() as f64;
    let scores: Vec<f64> = dataset.iter().map(|record| record.score()).collect();
    let outcomes: Vec<f64> = dataset
        .iter()
        .map(|record| if record.outcome() { 1.0 } else { 0.0 })
        .collect();

    let column_stats = |values: &[f64], column: &'static str| {
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        if var == 0.0 || !var.is_finite() {
            Err(MetricsError::ZeroVariance { column })
        } else {
            Ok((mean, var))
        }
    };

    let (score_mean, score_var) = column_stats(&scores, "score")?;
    let (outcome_mean, outcome_var) = column_stats(&outcomes, "outcome")?;

    let covariance = scores
        .iter()
        .zip(&outcomes)
        .map(|(s, o)| (s - score_mean) * (o - outcome_mean))
        .sum::<f64>()
        / n;
    Ok(covariance / (score_var.sqrt() * outcome_var.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use approx::assert_abs_diff_eq;

    /// Two groups with identical score ladders but different outcome rates:
    /// A has 2/5 positives, B has 3/5.
    fn two_group_dataset() -> Dataset {
        let mut records = Vec::new();
        for (score, outcome) in [(1.0, false), (2.0, false), (3.0, false), (4.0, true), (5.0, true)]
        {
            records.push(Record::new("A", score, outcome));
        }
        for (score, outcome) in [(1.0, false), (2.0, false), (3.0, true), (4.0, true), (5.0, true)]
        {
            records.push(Record::new("B", score, outcome));
        }
        Dataset::new(records).unwrap()
    }

    #[test]
    fn distribution_fractions_sum_to_one() {
        let dataset = two_group_dataset();
        for group in dataset.groups() {
            let dist = group_distribution(&dataset, &group).unwrap();
            let sum: f64 = dist.bins().iter().map(|bin| bin.fraction).sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn distribution_uniform_scores_give_equal_fractions() {
        let dataset = two_group_dataset();
        let dist = group_distribution(&dataset, "A").unwrap();
        assert_eq!(dist.total(), 5);
        assert_eq!(dist.bins().len(), 5);
        for bin in dist.bins() {
            assert_eq!(bin.count, 1);
            assert_abs_diff_eq!(bin.fraction, 0.2, epsilon = 1e-12);
        }
    }

    #[test]
    fn distribution_bins_ordered_and_counted() {
        let records = vec![
            Record::new("A", 3.0, false),
            Record::new("A", 1.0, true),
            Record::new("A", 3.0, true),
            Record::new("A", 3.0, false),
        ];
        let dataset = Dataset::new(records).unwrap();
        let dist = group_distribution(&dataset, "A").unwrap();
        assert_eq!(dist.bins().len(), 2);
        assert_eq!(dist.bins()[0].score, 1.0);
        assert_eq!(dist.bins()[0].count, 1);
        assert_eq!(dist.bins()[1].score, 3.0);
        assert_eq!(dist.bins()[1].count, 3);
        assert_abs_diff_eq!(dist.bins()[1].fraction, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn distribution_unknown_group_fails() {
        let dataset = two_group_dataset();
        match group_distribution(&dataset, "C") {
            Err(MetricsError::UnknownGroup { group }) => assert_eq!(group, "C"),
            other => panic!("Expected UnknownGroup, got {other:?}"),
        }
    }

    #[test]
    fn disparate_impact_matches_worked_example() {
        // (2/5)/(3/5) - 1 = -1/3
        let dataset = two_group_dataset();
        let impact = disparate_impact(&dataset, "A", "B", true).unwrap();
        assert_abs_diff_eq!(impact, -100.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn disparate_impact_is_antisymmetric_under_inversion() {
        let dataset = two_group_dataset();
        let forward = disparate_impact(&dataset, "A", "B", true).unwrap();
        let backward = disparate_impact(&dataset, "B", "A", true).unwrap();
        assert_abs_diff_eq!(
            (1.0 + forward / 100.0) * (1.0 + backward / 100.0),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn disparate_impact_zero_reference_rate_fails() {
        let records = vec![
            Record::new("A", 1.0, true),
            Record::new("B", 1.0, false),
            Record::new("B", 2.0, false),
        ];
        let dataset = Dataset::new(records).unwrap();
        match disparate_impact(&dataset, "A", "B", true) {
            Err(MetricsError::DivisionByZero { group, outcome }) => {
                assert_eq!(group, "B");
                assert!(outcome);
            }
            other => panic!("Expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn outcome_rate_counts_matching_records() {
        let dataset = two_group_dataset();
        assert_abs_diff_eq!(
            outcome_rate(&dataset, "A", true).unwrap(),
            0.4,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            outcome_rate(&dataset, "A", false).unwrap(),
            0.6,
            epsilon = 1e-12
        );
    }

    #[test]
    fn group_summary_reports_counts_means_and_base_rates() {
        let dataset = two_group_dataset();
        let summaries = group_summary(&dataset);
        assert_eq!(summaries.len(), 2);

        let a = &summaries[0];
        assert_eq!(a.group, "A");
        assert_eq!(a.count, 5);
        assert_abs_diff_eq!(a.mean_score, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.score_std, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.base_rate, 0.4, epsilon = 1e-12);

        let b = &summaries[1];
        assert_abs_diff_eq!(b.base_rate, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn correlation_positive_when_high_scores_reoffend() {
        let dataset = two_group_dataset();
        let r = score_outcome_correlation(&dataset).unwrap();
        assert!(r > 0.5, "Expected strong positive correlation, got {r}");
        assert!(r <= 1.0 + 1e-12);
    }

    #[test]
    fn correlation_constant_outcome_fails() {
        let records = vec![Record::new("A", 1.0, true), Record::new("A", 2.0, true)];
        let dataset = Dataset::new(records).unwrap();
        match score_outcome_correlation(&dataset) {
            Err(MetricsError::ZeroVariance { column }) => assert_eq!(column, "outcome"),
            other => panic!("Expected ZeroVariance, got {other:?}"),
        }
    }
}
