use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ComputeError, Result};

/// Highest period index an analysis can declare
pub const MAX_PERIOD_INDEX: usize = 5;

/// Per-period variations of a measure, indexed by period index 1..=5
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureVariations {
    values: [Option<f64>; MAX_PERIOD_INDEX],
}

impl MeasureVariations {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check_index(period_index: usize) -> Result<()> {
        if (1..=MAX_PERIOD_INDEX).contains(&period_index) {
            Ok(())
        } else {
            Err(ComputeError::InvalidPeriodIndex(period_index))
        }
    }

    pub fn with(mut self, period_index: usize, value: f64) -> Result<Self> {
        self.set(period_index, value)?;
        Ok(self)
    }

    pub fn set(&mut self, period_index: usize, value: f64) -> Result<()> {
        Self::check_index(period_index)?;
        self.values[period_index - 1] = Some(value);
        Ok(())
    }

    pub fn get(&self, period_index: usize) -> Option<f64> {
        if (1..=MAX_PERIOD_INDEX).contains(&period_index) {
            self.values[period_index - 1]
        } else {
            None
        }
    }

    pub fn has(&self, period_index: usize) -> bool {
        self.get(period_index).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Set variations as `(period_index, value)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i + 1, v)))
    }
}

impl fmt::Display for MeasureVariations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(index, value)| format!("p{}={}", index, value))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let variations = MeasureVariations::new()
            .with(2, 5.0)
            .unwrap()
            .with(5, 3.0)
            .unwrap();
        assert!(variations.has(2));
        assert!(!variations.has(1));
        assert_eq!(variations.get(5), Some(3.0));
        assert_eq!(variations.iter().collect::<Vec<_>>(), vec![(2, 5.0), (5, 3.0)]);
        assert_eq!(variations.to_string(), "[p2=5, p5=3]");
    }

    #[test]
    fn test_index_out_of_range() {
        assert!(matches!(
            MeasureVariations::new().with(0, 1.0),
            Err(ComputeError::InvalidPeriodIndex(0))
        ));
        assert!(MeasureVariations::new().with(6, 1.0).is_err());
        assert_eq!(MeasureVariations::new().get(6), None);
        assert!(MeasureVariations::new().is_empty());
    }
}
