use std::any::Any;
use tracing::debug;

use super::{AnyFormula, CounterInitializationContext, CreateMeasureContext, Formula};
use crate::component::{Component, ComponentType, CrawlerDepthLimit};
use crate::crawler::{Order, Path, PathAwareVisitor};
use crate::error::Result;
use crate::measure::MeasureRepository;
use crate::metric::MetricRepository;
use crate::period::Period;
use crate::scm::ChangesetRepository;

/// Counters of every formula for one node, `None` until a leaf below
/// contributes
pub struct Counters {
    by_formula: Vec<Option<Box<dyn Any>>>,
}

impl Counters {
    fn new(formula_count: usize) -> Self {
        Self {
            by_formula: (0..formula_count).map(|_| None).collect(),
        }
    }
}

/// Path-aware visitor running a list of formulas bottom-up
///
/// Formulas run in list order on each leaf, so a formula can read the
/// measures an earlier formula just added on the same leaf. Nothing is ever
/// written on `PROJECT_VIEW` components.
pub struct FormulaExecutorComponentVisitor<'a> {
    metrics: &'a MetricRepository,
    measures: &'a mut dyn MeasureRepository,
    periods: &'a [Period],
    changesets: Option<&'a dyn ChangesetRepository>,
    skip_unit_tests: bool,
    formulas: Vec<Box<dyn AnyFormula + 'a>>,
}

/// Builder for [`FormulaExecutorComponentVisitor`]
pub struct FormulaExecutorBuilder<'a> {
    metrics: &'a MetricRepository,
    measures: &'a mut dyn MeasureRepository,
    periods: &'a [Period],
    changesets: Option<&'a dyn ChangesetRepository>,
    skip_unit_tests: bool,
    formulas: Vec<Box<dyn AnyFormula + 'a>>,
}

impl<'a> FormulaExecutorBuilder<'a> {
    /// Periods to compute variations for
    pub fn with_periods(mut self, periods: &'a [Period]) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_changesets(mut self, changesets: &'a dyn ChangesetRepository) -> Self {
        self.changesets = Some(changesets);
        self
    }

    /// Ignore `FILE` components flagged as unit tests
    pub fn skip_unit_tests(mut self) -> Self {
        self.skip_unit_tests = true;
        self
    }

    pub fn formula<F: Formula + 'a>(mut self, formula: F) -> Self {
        self.formulas.push(Box::new(formula));
        self
    }

    pub fn build(self) -> FormulaExecutorComponentVisitor<'a> {
        FormulaExecutorComponentVisitor {
            metrics: self.metrics,
            measures: self.measures,
            periods: self.periods,
            changesets: self.changesets,
            skip_unit_tests: self.skip_unit_tests,
            formulas: self.formulas,
        }
    }
}

impl<'a> FormulaExecutorComponentVisitor<'a> {
    pub fn builder(
        metrics: &'a MetricRepository,
        measures: &'a mut dyn MeasureRepository,
    ) -> FormulaExecutorBuilder<'a> {
        FormulaExecutorBuilder {
            metrics,
            measures,
            periods: &[],
            changesets: None,
            skip_unit_tests: false,
            formulas: Vec::new(),
        }
    }

    fn process_leaf(&mut self, leaf: &Component, path: &mut Path<Counters>) -> Result<()> {
        if self.skip_unit_tests && leaf.is_unit_test() {
            debug!("Skipping unit test file {}", leaf);
            return Ok(());
        }

        for (i, formula) in self.formulas.iter().enumerate() {
            let mut counter = formula.new_counter();
            let context = CounterInitializationContext {
                leaf,
                measures: &*self.measures,
                metrics: self.metrics,
                periods: self.periods,
                changesets: self.changesets,
            };
            formula.initialize_counter(&mut *counter, &context)?;

            add_measures(
                &mut *self.measures,
                self.metrics,
                self.periods,
                &**formula,
                leaf,
                &*counter,
            )?;
            if let Some(parent) = path.parent_mut() {
                aggregate_into(&**formula, &mut parent.by_formula[i], &*counter);
            }
        }
        Ok(())
    }

    fn process_not_leaf(&mut self, component: &Component, path: &mut Path<Counters>) -> Result<()> {
        let (current, mut parent) = path.current_and_parent_mut();
        for (i, formula) in self.formulas.iter().enumerate() {
            let Some(counter) = current.by_formula[i].as_deref() else {
                continue;
            };
            add_measures(
                &mut *self.measures,
                self.metrics,
                self.periods,
                &**formula,
                component,
                counter,
            )?;
            if let Some(parent) = parent.as_mut() {
                aggregate_into(&**formula, &mut parent.by_formula[i], counter);
            }
        }
        Ok(())
    }
}

fn add_measures(
    measures: &mut dyn MeasureRepository,
    metrics: &MetricRepository,
    periods: &[Period],
    formula: &dyn AnyFormula,
    component: &Component,
    counter: &dyn Any,
) -> Result<()> {
    // measures of a project view are copies of the project's own
    if component.component_type() == ComponentType::ProjectView {
        return Ok(());
    }
    for metric_key in formula.metric_keys() {
        let metric = metrics.get_by_key(metric_key)?;
        let context = CreateMeasureContext {
            component,
            metric,
            measures: &*measures,
            metrics,
            periods,
        };
        if let Some(measure) = formula.create_measure_from(counter, &context)? {
            measures.add(component, metric, measure)?;
        }
    }
    Ok(())
}

fn aggregate_into(formula: &dyn AnyFormula, slot: &mut Option<Box<dyn Any>>, counter: &dyn Any) {
    let target = slot.get_or_insert_with(|| formula.new_counter());
    formula.aggregate_counter(&mut **target, counter);
}

impl PathAwareVisitor for FormulaExecutorComponentVisitor<'_> {
    type Element = Counters;

    fn max_depth(&self) -> CrawlerDepthLimit {
        CrawlerDepthLimit::LEAVES
    }

    fn order(&self) -> Order {
        Order::PostOrder
    }

    fn name(&self) -> &str {
        "FormulaExecutorComponentVisitor"
    }

    fn create_element(&mut self, _component: &Component) -> Counters {
        Counters::new(self.formulas.len())
    }

    fn visit_any(&mut self, component: &Component, path: &mut Path<Counters>) -> Result<()> {
        if component.component_type().is_leaf() {
            self.process_leaf(component, path)
        } else {
            self.process_not_leaf(component, path)
        }
    }
}
