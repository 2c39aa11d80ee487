#![deny(dead_code)]
#![deny(unused_imports)]

//! Group fairness metrics for scored binary-outcome datasets.
//!
//! Each record in a population carries a demographic group label, a risk
//! score, and a binary adverse outcome. From that, this crate computes the
//! standard group-conditional fairness quantities: per-group score
//! distributions, disparate impact ratios between two groups, ROC curves per
//! group on a shared threshold grid, and the between-group false/true
//! positive rate ratios at matching thresholds.
//!
//! The crate is deliberately small and pure: no I/O, no rendering, no
//! persistent state. Loading rows and drawing charts belong to the caller;
//! every function here is a deterministic transformation of an immutable
//! [`Dataset`] into freshly allocated results.

pub mod data;
pub mod metrics;
pub mod roc;

pub use data::{DataError, Dataset, Record};
pub use metrics::{
    GroupDistribution, GroupSummary, MetricsError, ScoreBin, disparate_impact,
    group_distribution, group_summary, outcome_rate, score_outcome_correlation,
};
pub use roc::{RatioSeries, RocCurve, RocError, error_rate_ratio, roc_curve, threshold_grid};
