use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A time-indexed sequence of periodic fractional returns (0.01 = +1%).
///
/// Missing observations are stored as `NaN`. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(CoreError::InvalidInput(
                name,
                format!("{} dates but {} values", dates.len(), values.len()),
            ));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidInput(
                name,
                format!("dates must be strictly increasing ({} then {})", w[0], w[1]),
            ));
        }
        Ok(Self { name, dates, values })
    }

    /// Builds a series from `(date, return)` pairs, sorting them by date.
    pub fn from_pairs(
        name: impl Into<String>,
        mut pairs: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, CoreError> {
        pairs.sort_by_key(|(date, _)| *date);
        let (dates, values) = pairs.into_iter().unzip();
        Self::new(name, dates, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Iterates over the non-missing values.
    pub fn observed(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied().filter(|v| !v.is_nan())
    }

    pub fn observed_count(&self) -> usize {
        self.observed().count()
    }

    pub fn same_index(&self, other: &ReturnSeries) -> bool {
        self.dates == other.dates
    }

    /// Places this series onto the dates of `calendar`.
    ///
    /// Calendar dates this series has no value for become `NaN`; dates of this
    /// series that are not on the calendar are dropped.
    pub fn reindex(&self, calendar: &ReturnSeries) -> ReturnSeries {
        let lookup: HashMap<NaiveDate, f64> = self
            .dates
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect();
        let values = calendar
            .dates
            .iter()
            .map(|d| lookup.get(d).copied().unwrap_or(f64::NAN))
            .collect();
        ReturnSeries {
            name: self.name.clone(),
            dates: calendar.dates.clone(),
            values,
        }
    }

    /// Computes `self * weight_self + other * weight_other` over the union of
    /// both indexes. A date present on only one side yields `NaN`.
    pub fn weighted_sum(
        &self,
        weight_self: f64,
        other: &ReturnSeries,
        weight_other: f64,
        name: impl Into<String>,
    ) -> ReturnSeries {
        let union: BTreeSet<NaiveDate> =
            self.dates.iter().chain(other.dates.iter()).copied().collect();
        let calendar = ReturnSeries {
            name: String::new(),
            values: vec![f64::NAN; union.len()],
            dates: union.into_iter().collect(),
        };
        let left = self.reindex(&calendar);
        let right = other.reindex(&calendar);
        let values = left
            .values
            .iter()
            .zip(right.values.iter())
            .map(|(a, b)| a * weight_self + b * weight_other)
            .collect();
        if calendar.dates.len() != self.len() || calendar.dates.len() != other.len() {
            tracing::debug!(
                left = %self.name,
                right = %other.name,
                union = calendar.dates.len(),
                "Weighted sum over differing calendars; unmatched dates are missing"
            );
        }
        ReturnSeries {
            name: name.into(),
            dates: calendar.dates,
            values,
        }
    }
}
