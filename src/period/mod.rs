//! Historical baselines against which new code is measured

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, Result};
use crate::measure::MeasureVariations;

/// One baseline of the analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Position of the period, 1..=5
    pub index: usize,
    /// How the baseline was chosen (`previous_version`, `days`, `date`...)
    pub mode: String,
    #[serde(default)]
    pub mode_parameter: Option<String>,
    /// Date of the baseline snapshot. `None` means no baseline exists yet.
    #[serde(default)]
    pub snapshot_date: Option<DateTime<Utc>>,
    pub analysis_date: DateTime<Utc>,
}

impl Period {
    pub fn new(index: usize, mode: impl Into<String>, snapshot_date: Option<DateTime<Utc>>, analysis_date: DateTime<Utc>) -> Self {
        Self {
            index,
            mode: mode.into(),
            mode_parameter: None,
            snapshot_date,
            analysis_date,
        }
    }

    pub fn with_mode_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.mode_parameter = Some(parameter.into());
        self
    }

    /// A change made at `date` is new code for this period
    pub fn is_after_baseline(&self, date: DateTime<Utc>) -> bool {
        self.snapshot_date.is_none_or(|baseline| date > baseline)
    }
}

/// The ordered, validated periods of an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodsHolder {
    periods: Vec<Period>,
}

impl PeriodsHolder {
    /// Sorts periods by index; rejects out of range or duplicate indexes
    pub fn new(mut periods: Vec<Period>) -> Result<Self> {
        periods.sort_by_key(|p| p.index);
        for (i, period) in periods.iter().enumerate() {
            MeasureVariations::check_index(period.index)?;
            if i > 0 && periods[i - 1].index == period.index {
                return Err(ComputeError::DuplicatePeriod(period.index));
            }
        }
        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn get(&self, index: usize) -> Option<&Period> {
        self.periods.iter().find(|p| p.index == index)
    }

    pub fn has_periods(&self) -> bool {
        !self.periods.is_empty()
    }

    /// Periods with an index up to `max_index`
    pub fn up_to(&self, max_index: usize) -> Vec<Period> {
        self.periods
            .iter()
            .filter(|p| p.index <= max_index)
            .cloned()
            .collect()
    }
}
