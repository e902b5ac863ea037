//! Coverage of new code
//!
//! A line of a FILE is new code for a period when the changeset that last
//! touched it is dated strictly after the period's snapshot date. For every
//! period the new lines and conditions to cover, and how many of them are
//! covered, are counted from the line hits data of the file. The counts are
//! stored as variations, never as values.
//!
//! A PROJECT_VIEW contributes the variations of its own new-code measures.

use std::collections::BTreeMap;
use tracing::debug;

use super::{AnalysisContext, ComputationStep};
use crate::component::ComponentType;
use crate::crawler::PathAwareCrawler;
use crate::error::Result;
use crate::formula::{
    Counter, CounterInitializationContext, CoverageVariationFormula, CreateMeasureContext, Formula,
    FormulaExecutorComponentVisitor, IntVariationValues,
};
use crate::measure::{line_data, Measure, MeasureRepository, MeasureVariations};
use crate::metric::core_metrics::{CoverageKeys, COVERAGE_FAMILIES};
use crate::period::Period;

pub struct NewCoverageMeasuresStep;

impl ComputationStep for NewCoverageMeasuresStep {
    fn name(&self) -> &'static str {
        "new-coverage"
    }

    fn description(&self) -> &'static str {
        "Compute new coverage measures"
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        let periods = context.periods_for_tree();
        if periods.is_empty() {
            debug!("No period, skipping new coverage");
            return Ok(());
        }

        let mut builder = FormulaExecutorComponentVisitor::builder(context.metrics(), measures)
            .with_periods(&periods)
            .with_changesets(context.changesets())
            .skip_unit_tests();
        for family in &COVERAGE_FAMILIES {
            // the ratios read the counts this formula just added on the leaf
            builder = builder.formula(NewLinesAndConditionsFormula::new(*family));
            for formula in CoverageVariationFormula::all_of(family) {
                builder = builder.formula(formula);
            }
        }
        let mut executor = builder.build();
        PathAwareCrawler::new(&mut executor).visit(context.tree().root())?;
        Ok(())
    }
}

/// Counts new lines and conditions to cover of one coverage family
#[derive(Debug, Clone)]
pub struct NewLinesAndConditionsFormula {
    keys: CoverageKeys,
    output_keys: [&'static str; 4],
}

impl NewLinesAndConditionsFormula {
    pub fn new(keys: CoverageKeys) -> Self {
        Self {
            keys,
            output_keys: [
                keys.new_lines_to_cover,
                keys.new_uncovered_lines,
                keys.new_conditions_to_cover,
                keys.new_uncovered_conditions,
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewLinesAndConditionsCounter {
    keys: CoverageKeys,
    lines: IntVariationValues,
    covered_lines: IntVariationValues,
    conditions: IntVariationValues,
    covered_conditions: IntVariationValues,
}

impl NewLinesAndConditionsCounter {
    fn initialize_file(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        let Some(changesets) = context.changesets() else {
            return Ok(());
        };
        let Some(hits_data) = context.measure(self.keys.line_hits_data)?.filter(|m| m.has_value()) else {
            return Ok(());
        };
        let hits_by_line = line_data::parse_count_by_line(hits_data.string_value()?)?;
        let conditions_by_line = count_by_line(context, self.keys.conditions_by_line)?;
        let covered_conditions_by_line = count_by_line(context, self.keys.covered_conditions_by_line)?;

        for (&line, &hits) in &hits_by_line {
            // a line without date has no known author, it can't be new
            let Some(date) = changesets.changeset_for_line(line)?.date else {
                continue;
            };
            let conditions = conditions_by_line.get(&line).copied().unwrap_or(0);
            let covered_conditions = covered_conditions_by_line.get(&line).copied().unwrap_or(0);
            for period in context.periods().iter().filter(|p| p.is_after_baseline(date)) {
                self.lines.increment(period, 1)?;
                self.covered_lines.increment(period, i64::from(hits > 0))?;
                self.conditions.increment(period, conditions)?;
                self.covered_conditions.increment(period, covered_conditions)?;
            }
        }
        Ok(())
    }

    fn initialize_project_view(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        let lines = context.measure(self.keys.new_lines_to_cover)?;
        let uncovered_lines = context.measure(self.keys.new_uncovered_lines)?;
        let conditions = context.measure(self.keys.new_conditions_to_cover)?;
        let uncovered_conditions = context.measure(self.keys.new_uncovered_conditions)?;
        let variation = |measure: Option<&Measure>, index| measure.and_then(|m| m.variation(index));

        for period in context.periods() {
            if let Some(new_lines) = variation(lines, period.index) {
                let uncovered = variation(uncovered_lines, period.index).unwrap_or(0.0);
                self.lines.increment(period, new_lines as i64)?;
                self.covered_lines.increment(period, (new_lines - uncovered) as i64)?;
            }
            if let Some(new_conditions) = variation(conditions, period.index) {
                let uncovered = variation(uncovered_conditions, period.index).unwrap_or(0.0);
                self.conditions.increment(period, new_conditions as i64)?;
                self.covered_conditions
                    .increment(period, (new_conditions - uncovered) as i64)?;
            }
        }
        Ok(())
    }
}

/// Per-line counts of a `line=count;...` measure, empty when absent
fn count_by_line(context: &CounterInitializationContext<'_>, metric_key: &str) -> Result<BTreeMap<u32, i64>> {
    match context.measure(metric_key)? {
        Some(measure) if measure.has_value() => line_data::parse_count_by_line(measure.string_value()?),
        _ => Ok(BTreeMap::new()),
    }
}

/// `total - covered` for the periods where `total` is set
fn uncovered(
    total: &IntVariationValues,
    covered: &IntVariationValues,
    periods: &[Period],
) -> Result<MeasureVariations> {
    let mut variations = MeasureVariations::new();
    for period in periods {
        if let Some(total) = total.get(period.index) {
            let covered = covered.get(period.index).unwrap_or(0);
            variations.set(period.index, (total - covered) as f64)?;
        }
    }
    Ok(variations)
}

impl Counter for NewLinesAndConditionsCounter {
    fn aggregate(&mut self, other: &Self) {
        self.lines.increment_all(&other.lines);
        self.covered_lines.increment_all(&other.covered_lines);
        self.conditions.increment_all(&other.conditions);
        self.covered_conditions.increment_all(&other.covered_conditions);
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        match context.leaf().component_type() {
            ComponentType::File => self.initialize_file(context),
            ComponentType::ProjectView => self.initialize_project_view(context),
            _ => Ok(()),
        }
    }
}

impl Formula for NewLinesAndConditionsFormula {
    type Counter = NewLinesAndConditionsCounter;

    fn create_new_counter(&self) -> NewLinesAndConditionsCounter {
        NewLinesAndConditionsCounter {
            keys: self.keys,
            lines: IntVariationValues::default(),
            covered_lines: IntVariationValues::default(),
            conditions: IntVariationValues::default(),
            covered_conditions: IntVariationValues::default(),
        }
    }

    fn create_measure(
        &self,
        counter: &NewLinesAndConditionsCounter,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>> {
        let periods = context.periods();
        let key = context.metric().key.as_str();
        let variations = if key == self.keys.new_lines_to_cover {
            counter.lines.to_variations(periods)?
        } else if key == self.keys.new_uncovered_lines {
            uncovered(&counter.lines, &counter.covered_lines, periods)?
        } else if key == self.keys.new_conditions_to_cover {
            counter.conditions.to_variations(periods)?
        } else if key == self.keys.new_uncovered_conditions {
            uncovered(&counter.conditions, &counter.covered_conditions, periods)?
        } else {
            return Ok(None);
        };
        if variations.is_empty() {
            return Ok(None);
        }
        Ok(Some(Measure::variations_only(variations)))
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &self.output_keys
    }
}
