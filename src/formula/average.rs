use super::{Counter, CounterInitializationContext, CreateMeasureContext, Formula};
use crate::error::Result;
use crate::measure::Measure;

/// `main / by` recomputed at every level from summed numerators and
/// denominators
///
/// On a leaf, when the main metric is absent the fallback metric is read
/// instead. A leaf contributes only when both main (or fallback) and by are
/// present. No measure is created when the summed denominator is 0.
#[derive(Debug, Clone)]
pub struct AverageFormula {
    output_key: [&'static str; 1],
    main_metric_key: &'static str,
    by_metric_key: &'static str,
    fallback_metric_key: Option<&'static str>,
}

impl AverageFormula {
    pub fn new(output_key: &'static str, main_metric_key: &'static str, by_metric_key: &'static str) -> Self {
        Self {
            output_key: [output_key],
            main_metric_key,
            by_metric_key,
            fallback_metric_key: None,
        }
    }

    pub fn with_fallback(mut self, fallback_metric_key: &'static str) -> Self {
        self.fallback_metric_key = Some(fallback_metric_key);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AverageCounter {
    main_metric_key: &'static str,
    by_metric_key: &'static str,
    fallback_metric_key: Option<&'static str>,
    main_sum: f64,
    by_sum: f64,
    initialized: bool,
}

impl AverageCounter {
    pub fn main_sum(&self) -> f64 {
        self.main_sum
    }

    pub fn by_sum(&self) -> f64 {
        self.by_sum
    }
}

impl Counter for AverageCounter {
    fn aggregate(&mut self, other: &Self) {
        if other.initialized {
            self.main_sum += other.main_sum;
            self.by_sum += other.by_sum;
            self.initialized = true;
        }
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        let Some(by) = context.measure(self.by_metric_key)?.filter(|m| m.has_value()) else {
            return Ok(());
        };
        let mut main = context.measure(self.main_metric_key)?.filter(|m| m.has_value());
        if main.is_none() {
            if let Some(fallback) = self.fallback_metric_key {
                main = context.measure(fallback)?.filter(|m| m.has_value());
            }
        }
        if let Some(main) = main {
            self.main_sum += main.double_value()?;
            self.by_sum += by.double_value()?;
            self.initialized = true;
        }
        Ok(())
    }
}

impl Formula for AverageFormula {
    type Counter = AverageCounter;

    fn create_new_counter(&self) -> AverageCounter {
        AverageCounter {
            main_metric_key: self.main_metric_key,
            by_metric_key: self.by_metric_key,
            fallback_metric_key: self.fallback_metric_key,
            main_sum: 0.0,
            by_sum: 0.0,
            initialized: false,
        }
    }

    fn create_measure(&self, counter: &AverageCounter, context: &CreateMeasureContext<'_>) -> Result<Option<Measure>> {
        if !counter.initialized || counter.by_sum == 0.0 {
            return Ok(None);
        }
        Ok(Some(Measure::double_with_scale(
            counter.main_sum / counter.by_sum,
            context.metric().decimal_scale(),
        )))
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &self.output_key
    }
}
