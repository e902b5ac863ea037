//! Formula based aggregation
//!
//! A [`Formula`] computes one or more output metrics from a [`Counter`]:
//!
//! 1. on every leaf a fresh counter is created and initialized from the
//!    leaf's measures ([`CounterInitializationContext`]),
//! 2. the formula creates the leaf's output measures from that counter,
//! 3. the counter is folded into the parent's counter for the same formula,
//! 4. on every non-leaf the folded counter produces the output measures and
//!    is folded into its own parent.
//!
//! Averages and ratios are therefore always recomputed from re-aggregated
//! sums at each level, never averaged.
//!
//! [`FormulaExecutorComponentVisitor`] drives the formulas over a tree.

mod average;
mod coverage;
mod distribution;
mod executor;
mod sum;
mod variation;

pub use average::{AverageCounter, AverageFormula};
pub use coverage::{
    calculate_coverage, CoverageFormula, CoverageInputKeys, CoverageKind, CoverageVariationFormula,
    LinesAndConditionsCounter, LinesAndConditionsVariationCounter,
};
pub use distribution::{DistributionCounter, DistributionFormula};
pub use executor::{FormulaExecutorBuilder, FormulaExecutorComponentVisitor};
pub use sum::{SumCounter, SumFormula};
pub use variation::{IntVariationValue, IntVariationValues};

use std::any::Any;

use crate::component::{Component, CrawlerDepthLimit};
use crate::error::{ComputeError, Result};
use crate::measure::{Measure, MeasureRepository};
use crate::metric::{Metric, MetricRepository, MetricType};
use crate::period::Period;
use crate::scm::{ChangesetRepository, Changesets};

/// Accumulator of a formula for one node
pub trait Counter: 'static {
    /// Fold a child's counter into this one
    fn aggregate(&mut self, other: &Self);

    /// Read the inputs of a leaf
    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()>;
}

/// Computes output measures from a counter
pub trait Formula {
    type Counter: Counter;

    fn create_new_counter(&self) -> Self::Counter;

    /// Measure of one output metric, `None` when it can not be computed
    fn create_measure(
        &self,
        counter: &Self::Counter,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>>;

    fn output_metric_keys(&self) -> &[&'static str];
}

/// What a counter may read while initializing on a leaf
pub struct CounterInitializationContext<'a> {
    leaf: &'a Component,
    measures: &'a dyn MeasureRepository,
    metrics: &'a MetricRepository,
    periods: &'a [Period],
    changesets: Option<&'a dyn ChangesetRepository>,
}

impl<'a> CounterInitializationContext<'a> {
    pub fn leaf(&self) -> &'a Component {
        self.leaf
    }

    /// Measure of the leaf, raw or added by a previous formula
    pub fn measure(&self, metric_key: &str) -> Result<Option<&'a Measure>> {
        let metric = self.metrics.get_by_key(metric_key)?;
        Ok(self.measures.get_raw_measure(self.leaf, metric))
    }

    /// Periods the formulas compute variations for
    pub fn periods(&self) -> &'a [Period] {
        self.periods
    }

    /// Changesets of the leaf, when known
    pub fn changesets(&self) -> Option<&'a Changesets> {
        self.changesets
            .and_then(|repository| repository.get_changesets(self.leaf.reference()))
    }
}

/// What a formula may read while creating a measure
pub struct CreateMeasureContext<'a> {
    component: &'a Component,
    metric: &'a Metric,
    measures: &'a dyn MeasureRepository,
    metrics: &'a MetricRepository,
    periods: &'a [Period],
}

impl<'a> CreateMeasureContext<'a> {
    pub fn component(&self) -> &'a Component {
        self.component
    }

    /// Output metric being computed
    pub fn metric(&self) -> &'a Metric {
        self.metric
    }

    pub fn periods(&self) -> &'a [Period] {
        self.periods
    }

    /// Measure of the component, raw or added
    pub fn measure(&self, metric_key: &str) -> Result<Option<&'a Measure>> {
        let metric = self.metrics.get_by_key(metric_key)?;
        Ok(self.measures.get_raw_measure(self.component, metric))
    }

    /// True on leaves, where aggregate-only formulas write nothing
    pub fn is_leaf(&self) -> bool {
        !CrawlerDepthLimit::LEAVES.is_deeper_than(self.component.component_type())
    }
}

/// Numeric value of `metric`'s type holding `value`
pub(crate) fn numeric_measure(metric: &Metric, value: i64) -> Result<Measure> {
    match metric.metric_type {
        MetricType::Int => i32::try_from(value)
            .map(Measure::int)
            .map_err(|_| ComputeError::IntOverflow {
                metric_key: metric.key.clone(),
                value,
            }),
        MetricType::Long => Ok(Measure::long(value)),
        MetricType::Float | MetricType::Percent => Ok(Measure::double(value as f64)),
        other => Err(ComputeError::ValueTypeMismatch {
            metric_key: metric.key.clone(),
            expected: other,
            actual: "LONG",
        }),
    }
}

/// Integer value of a present measure; no-value measures count as absent
pub(crate) fn long_value(measure: Option<&Measure>) -> Result<Option<i64>> {
    match measure {
        Some(m) if m.has_value() => m.long_value().map(Some),
        _ => Ok(None),
    }
}

/// Type-erased formula so formulas with different counters share a list
pub(crate) trait AnyFormula {
    fn new_counter(&self) -> Box<dyn Any>;

    fn initialize_counter(
        &self,
        counter: &mut dyn Any,
        context: &CounterInitializationContext<'_>,
    ) -> Result<()>;

    fn aggregate_counter(&self, into: &mut dyn Any, from: &dyn Any);

    fn create_measure_from(
        &self,
        counter: &dyn Any,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>>;

    fn metric_keys(&self) -> &[&'static str];
}

impl<F: Formula> AnyFormula for F {
    fn new_counter(&self) -> Box<dyn Any> {
        Box::new(self.create_new_counter())
    }

    fn initialize_counter(
        &self,
        counter: &mut dyn Any,
        context: &CounterInitializationContext<'_>,
    ) -> Result<()> {
        match counter.downcast_mut::<F::Counter>() {
            Some(counter) => counter.initialize(context),
            None => Ok(()),
        }
    }

    fn aggregate_counter(&self, into: &mut dyn Any, from: &dyn Any) {
        if let (Some(into), Some(from)) = (
            into.downcast_mut::<F::Counter>(),
            from.downcast_ref::<F::Counter>(),
        ) {
            into.aggregate(from);
        }
    }

    fn create_measure_from(
        &self,
        counter: &dyn Any,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>> {
        match counter.downcast_ref::<F::Counter>() {
            Some(counter) => Formula::create_measure(self, counter, context),
            None => Ok(None),
        }
    }

    fn metric_keys(&self) -> &[&'static str] {
        Formula::output_metric_keys(self)
    }
}

#[cfg(test)]
mod tests;
