//! # Dataset Container and Validation
//!
//! This module defines the in-memory representation of an observed
//! population: one `Record` per individual, carrying a demographic group
//! label, a risk score, and a binary adverse-outcome flag. A `Dataset` wraps
//! an ordered collection of records and enforces the invariant that every
//! score is finite.
//!
//! Loading rows from disk is the caller's responsibility; this crate only
//! consumes records that have already been parsed. All derived quantities
//! (distributions, ROC curves, ratios) are computed fresh from a `Dataset`
//! and never stored back into it.

use itertools::Itertools;
use thiserror::Error;

/// Errors raised while constructing or transforming a dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("The dataset contains no records, so the observed score range is undefined.")]
    EmptyDataset,

    #[error(
        "Non-finite score {value} found at record {index}. All scores must be finite numbers."
    )]
    NonFiniteScore { index: usize, value: f64 },
}

/// One observed individual. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    group: String,
    score: f64,
    normalized_score: Option<f64>,
    outcome: bool,
}

impl Record {
    /// Creates a record with an unset normalized score. `outcome` is true
    /// when the adverse event occurred.
    pub fn new(group: impl Into<String>, score: f64, outcome: bool) -> Self {
        Self {
            group: group.into(),
            score,
            normalized_score: None,
            outcome,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// The score rescaled to [0, 1], or `None` if [`Dataset::normalize`] has
    /// not been applied.
    pub fn normalized_score(&self) -> Option<f64> {
        self.normalized_score
    }

    pub fn outcome(&self) -> bool {
        self.outcome
    }
}

/// An ordered, validated collection of records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Validates and wraps a list of records. Group and outcome
    /// non-missingness is guaranteed by the types; scores are checked for
    /// finiteness here.
    pub fn new(records: Vec<Record>) -> Result<Self, DataError> {
        for (index, record) in records.iter().enumerate() {
            if !record.score.is_finite() {
                return Err(DataError::NonFiniteScore {
                    index,
                    value: record.score,
                });
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Returns a new dataset whose records carry `normalized_score`, the raw
    /// score min-max rescaled over this dataset's own observed range.
    ///
    /// When every score is identical the range is degenerate and all
    /// normalized scores are set to exactly `0.0` rather than dividing by
    /// zero. Fails with [`DataError::EmptyDataset`] when there are no records
    /// to take a minimum or maximum over.
    pub fn normalize(&self) -> Result<Dataset, DataError> {
        let (min, max) = self
            .records
            .iter()
            .map(Record::score)
            .minmax_by(f64::total_cmp)
            .into_option()
            .ok_or(DataError::EmptyDataset)?;

        let range = max - min;
        log::debug!(
            "Normalizing {} scores over observed range [{min}, {max}]",
            self.records.len()
        );
        if range == 0.0 {
            log::warn!("All scores equal {min}; every normalized score is 0.0");
        }

        let records = self
            .records
            .iter()
            .cloned()
            .map(|mut record| {
                record.normalized_score = Some(if range == 0.0 {
                    0.0
                } else {
                    (record.score - min) / range
                });
                record
            })
            .collect();
        Ok(Self { records })
    }

    /// Returns the sub-dataset of records matching `predicate`, preserving
    /// order. Used to restrict an analysis to a slice of the population
    /// (e.g. defendants with at least two priors) before recomputing
    /// distributions.
    pub fn filter<F>(&self, predicate: F) -> Dataset
    where
        F: Fn(&Record) -> bool,
    {
        Self {
            records: self
                .records
                .iter()
                .filter(|record| predicate(record))
                .cloned()
                .collect(),
        }
    }

    /// Distinct group labels in first-appearance order.
    pub fn groups(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.group.as_str())
            .unique()
            .map(String::from)
            .collect()
    }

    /// Borrowed view of the records belonging to one group.
    pub(crate) fn group_records(&self, group: &str) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|record| record.group == group)
            .collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
