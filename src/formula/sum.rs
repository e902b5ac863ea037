use super::{long_value, numeric_measure, Counter, CounterInitializationContext, CreateMeasureContext, Formula};
use crate::error::Result;
use crate::measure::Measure;

/// Sum of a metric over the leaves below each non-leaf
///
/// The output metric is the input metric. Nothing is written on leaves, and a
/// node gets no measure when no leaf below has one.
#[derive(Debug, Clone)]
pub struct SumFormula {
    metric_key: [&'static str; 1],
}

impl SumFormula {
    pub fn new(metric_key: &'static str) -> Self {
        Self {
            metric_key: [metric_key],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SumCounter {
    metric_key: &'static str,
    value: Option<i64>,
}

impl SumCounter {
    pub fn value(&self) -> Option<i64> {
        self.value
    }

    fn add(&mut self, value: i64) {
        self.value = Some(self.value.unwrap_or(0) + value);
    }
}

impl Counter for SumCounter {
    fn aggregate(&mut self, other: &Self) {
        if let Some(value) = other.value {
            self.add(value);
        }
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        if let Some(value) = long_value(context.measure(self.metric_key)?)? {
            self.add(value);
        }
        Ok(())
    }
}

impl Formula for SumFormula {
    type Counter = SumCounter;

    fn create_new_counter(&self) -> SumCounter {
        SumCounter {
            metric_key: self.metric_key[0],
            value: None,
        }
    }

    fn create_measure(&self, counter: &SumCounter, context: &CreateMeasureContext<'_>) -> Result<Option<Measure>> {
        if context.is_leaf() {
            return Ok(None);
        }
        counter
            .value
            .map(|value| numeric_measure(context.metric(), value))
            .transpose()
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &self.metric_key
    }
}
