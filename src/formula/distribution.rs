use tracing::debug;

use super::{Counter, CounterInitializationContext, CreateMeasureContext, Formula};
use crate::error::Result;
use crate::measure::{Distribution, Measure};

/// Bucket-wise merge of a distribution metric over the leaves below each
/// non-leaf
///
/// Distributions with different buckets are never re-bucketed: the node and
/// all its ancestors get no measure.
#[derive(Debug, Clone)]
pub struct DistributionFormula {
    metric_key: [&'static str; 1],
}

impl DistributionFormula {
    pub fn new(metric_key: &'static str) -> Self {
        Self {
            metric_key: [metric_key],
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistributionCounter {
    metric_key: &'static str,
    value: Option<Distribution>,
    valid: bool,
}

impl DistributionCounter {
    pub fn value(&self) -> Option<&Distribution> {
        self.value.as_ref().filter(|_| self.valid)
    }

    fn invalidate(&mut self) {
        self.valid = false;
        self.value = None;
    }

    fn add(&mut self, distribution: &Distribution) {
        if !self.valid {
            return;
        }
        let merged = if let Some(current) = &mut self.value {
            current.merge(distribution).is_ok()
        } else {
            self.value = Some(distribution.clone());
            true
        };
        if !merged {
            debug!(
                "Dropping {} aggregate, buckets of '{}' do not match",
                self.metric_key, distribution
            );
            self.invalidate();
        }
    }
}

impl Counter for DistributionCounter {
    fn aggregate(&mut self, other: &Self) {
        if !other.valid {
            self.invalidate();
        } else if let Some(distribution) = &other.value {
            self.add(distribution);
        }
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        match context.measure(self.metric_key)? {
            Some(measure) if measure.has_value() => self.add(measure.distribution_value()?),
            _ => {}
        }
        Ok(())
    }
}

impl Formula for DistributionFormula {
    type Counter = DistributionCounter;

    fn create_new_counter(&self) -> DistributionCounter {
        DistributionCounter {
            metric_key: self.metric_key[0],
            value: None,
            valid: true,
        }
    }

    fn create_measure(
        &self,
        counter: &DistributionCounter,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>> {
        if context.is_leaf() {
            return Ok(None);
        }
        Ok(counter.value().cloned().map(Measure::distribution))
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &self.metric_key
    }
}
