use crate::error::Result;
use crate::measure::{MeasureVariations, MAX_PERIOD_INDEX};
use crate::period::Period;

/// Integer accumulator that remembers whether it was ever incremented
///
/// Incrementing by 0 still marks the value as set, so "no change" and
/// "nothing to count" stay distinguishable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntVariationValue {
    value: i64,
    set: bool,
}

impl IntVariationValue {
    pub fn increment(&mut self, value: i64) {
        self.value += value;
        self.set = true;
    }

    /// Add `other` only when it is set
    pub fn increment_value(&mut self, other: &IntVariationValue) {
        if other.set {
            self.increment(other.value);
        }
    }

    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

/// One [`IntVariationValue`] per period index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntVariationValues {
    values: [IntVariationValue; MAX_PERIOD_INDEX],
}

impl IntVariationValues {
    fn slot(&mut self, period: &Period) -> Result<&mut IntVariationValue> {
        MeasureVariations::check_index(period.index)?;
        Ok(&mut self.values[period.index - 1])
    }

    pub fn increment(&mut self, period: &Period, value: i64) -> Result<()> {
        self.slot(period)?.increment(value);
        Ok(())
    }

    pub fn increment_all(&mut self, other: &IntVariationValues) {
        for (value, other) in self.values.iter_mut().zip(&other.values) {
            value.increment_value(other);
        }
    }

    /// Value for `period_index`, `None` unless set
    pub fn get(&self, period_index: usize) -> Option<i64> {
        period_index
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .filter(|v| v.is_set())
            .map(IntVariationValue::value)
    }

    pub fn is_set(&self, period_index: usize) -> bool {
        self.get(period_index).is_some()
    }

    pub fn is_any_set(&self) -> bool {
        self.values.iter().any(IntVariationValue::is_set)
    }

    /// Variations for the set values of `periods`
    pub fn to_variations(&self, periods: &[Period]) -> Result<MeasureVariations> {
        let mut variations = MeasureVariations::new();
        for period in periods {
            if let Some(value) = self.get(period.index) {
                variations.set(period.index, value as f64)?;
            }
        }
        Ok(variations)
    }
}
