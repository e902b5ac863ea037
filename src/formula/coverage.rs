//! Coverage ratios
//!
//! ```text
//! coverage        = 100 * (lines - uncovered_lines + conditions - uncovered_conditions)
//!                       / (lines + conditions)
//! line_coverage   = 100 * (lines - uncovered_lines) / lines
//! branch_coverage = 100 * (conditions - uncovered_conditions) / conditions
//! ```
//!
//! A zero denominator yields no measure. Results are rounded half-up to the
//! metric's decimal scale. [`CoverageFormula`] works on measure values,
//! [`CoverageVariationFormula`] on per-period variations of new-code
//! measures.

use super::{long_value, Counter, CounterInitializationContext, CreateMeasureContext, Formula, IntVariationValues};
use crate::error::Result;
use crate::measure::{round_half_up, Measure, MeasureVariations};
use crate::metric::core_metrics::CoverageKeys;

pub fn calculate_coverage(covered: i64, total: i64) -> f64 {
    100.0 * covered as f64 / total as f64
}

/// Which ratio a coverage formula computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageKind {
    /// Lines and conditions together
    Code,
    Line,
    Branch,
}

/// The four base metrics a coverage ratio reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageInputKeys {
    pub lines: &'static str,
    pub uncovered_lines: &'static str,
    pub conditions: &'static str,
    pub uncovered_conditions: &'static str,
}

impl CoverageInputKeys {
    /// Base metrics of a coverage family
    pub fn of(family: &CoverageKeys) -> Self {
        Self {
            lines: family.lines_to_cover,
            uncovered_lines: family.uncovered_lines,
            conditions: family.conditions_to_cover,
            uncovered_conditions: family.uncovered_conditions,
        }
    }

    /// New-code base metrics of a coverage family
    pub fn new_code_of(family: &CoverageKeys) -> Self {
        Self {
            lines: family.new_lines_to_cover,
            uncovered_lines: family.new_uncovered_lines,
            conditions: family.new_conditions_to_cover,
            uncovered_conditions: family.new_uncovered_conditions,
        }
    }
}

/// Coverage ratio computed from measure values
#[derive(Debug, Clone)]
pub struct CoverageFormula {
    kind: CoverageKind,
    inputs: CoverageInputKeys,
    output_key: [&'static str; 1],
}

impl CoverageFormula {
    pub fn new(kind: CoverageKind, inputs: CoverageInputKeys, output_key: &'static str) -> Self {
        Self {
            kind,
            inputs,
            output_key: [output_key],
        }
    }

    /// The three ratios of a coverage family
    pub fn all_of(family: &CoverageKeys) -> [Self; 3] {
        let inputs = CoverageInputKeys::of(family);
        [
            Self::new(CoverageKind::Code, inputs, family.coverage),
            Self::new(CoverageKind::Line, inputs, family.line_coverage),
            Self::new(CoverageKind::Branch, inputs, family.branch_coverage),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct LinesAndConditionsCounter {
    inputs: CoverageInputKeys,
    lines: Option<i64>,
    uncovered_lines: i64,
    conditions: Option<i64>,
    uncovered_conditions: i64,
}

fn add_opt(sum: &mut Option<i64>, value: i64) {
    *sum = Some(sum.unwrap_or(0) + value);
}

impl Counter for LinesAndConditionsCounter {
    fn aggregate(&mut self, other: &Self) {
        if let Some(lines) = other.lines {
            add_opt(&mut self.lines, lines);
            self.uncovered_lines += other.uncovered_lines;
        }
        if let Some(conditions) = other.conditions {
            add_opt(&mut self.conditions, conditions);
            self.uncovered_conditions += other.uncovered_conditions;
        }
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        if let Some(lines) = long_value(context.measure(self.inputs.lines)?)? {
            add_opt(&mut self.lines, lines);
            self.uncovered_lines +=
                long_value(context.measure(self.inputs.uncovered_lines)?)?.unwrap_or(0);
        }
        if let Some(conditions) = long_value(context.measure(self.inputs.conditions)?)? {
            add_opt(&mut self.conditions, conditions);
            self.uncovered_conditions +=
                long_value(context.measure(self.inputs.uncovered_conditions)?)?.unwrap_or(0);
        }
        Ok(())
    }
}

/// `(covered, total)` of a kind given lines and conditions sums, `None` when
/// the gating input is missing or the total is 0
fn ratio_inputs(
    kind: CoverageKind,
    lines: Option<i64>,
    covered_lines: i64,
    conditions: Option<i64>,
    covered_conditions: i64,
) -> Option<(i64, i64)> {
    let (covered, total) = match kind {
        CoverageKind::Code => {
            let lines = lines?;
            let conditions = conditions.unwrap_or(0);
            let covered_conditions = if conditions > 0 { covered_conditions } else { 0 };
            (covered_lines + covered_conditions, lines + conditions)
        }
        CoverageKind::Line => (covered_lines, lines?),
        CoverageKind::Branch => (covered_conditions, conditions?),
    };
    (total > 0).then_some((covered, total))
}

impl Formula for CoverageFormula {
    type Counter = LinesAndConditionsCounter;

    fn create_new_counter(&self) -> LinesAndConditionsCounter {
        LinesAndConditionsCounter {
            inputs: self.inputs,
            lines: None,
            uncovered_lines: 0,
            conditions: None,
            uncovered_conditions: 0,
        }
    }

    fn create_measure(
        &self,
        counter: &LinesAndConditionsCounter,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>> {
        let covered_lines = counter.lines.unwrap_or(0) - counter.uncovered_lines;
        let covered_conditions = counter.conditions.unwrap_or(0) - counter.uncovered_conditions;
        let ratio = ratio_inputs(
            self.kind,
            counter.lines,
            covered_lines,
            counter.conditions,
            covered_conditions,
        );
        Ok(ratio.map(|(covered, total)| {
            Measure::double_with_scale(
                calculate_coverage(covered, total),
                context.metric().decimal_scale(),
            )
        }))
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &self.output_key
    }
}

/// Coverage ratio computed per period from new-code variations
#[derive(Debug, Clone)]
pub struct CoverageVariationFormula {
    kind: CoverageKind,
    inputs: CoverageInputKeys,
    output_key: [&'static str; 1],
}

impl CoverageVariationFormula {
    pub fn new(kind: CoverageKind, inputs: CoverageInputKeys, output_key: &'static str) -> Self {
        Self {
            kind,
            inputs,
            output_key: [output_key],
        }
    }

    /// The three new-code ratios of a coverage family
    pub fn all_of(family: &CoverageKeys) -> [Self; 3] {
        let inputs = CoverageInputKeys::new_code_of(family);
        [
            Self::new(CoverageKind::Code, inputs, family.new_coverage),
            Self::new(CoverageKind::Line, inputs, family.new_line_coverage),
            Self::new(CoverageKind::Branch, inputs, family.new_branch_coverage),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct LinesAndConditionsVariationCounter {
    inputs: CoverageInputKeys,
    lines: IntVariationValues,
    covered_lines: IntVariationValues,
    conditions: IntVariationValues,
    covered_conditions: IntVariationValues,
}

impl Counter for LinesAndConditionsVariationCounter {
    fn aggregate(&mut self, other: &Self) {
        self.lines.increment_all(&other.lines);
        self.covered_lines.increment_all(&other.covered_lines);
        self.conditions.increment_all(&other.conditions);
        self.covered_conditions.increment_all(&other.covered_conditions);
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        let lines = context.measure(self.inputs.lines)?;
        let uncovered_lines = context.measure(self.inputs.uncovered_lines)?;
        let conditions = context.measure(self.inputs.conditions)?;
        let uncovered_conditions = context.measure(self.inputs.uncovered_conditions)?;
        let variation = |measure: Option<&Measure>, index| measure.and_then(|m| m.variation(index));

        for period in context.periods() {
            if let Some(new_lines) = variation(lines, period.index) {
                let uncovered = variation(uncovered_lines, period.index).unwrap_or(0.0);
                self.lines.increment(period, new_lines as i64)?;
                self.covered_lines
                    .increment(period, (new_lines - uncovered) as i64)?;
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

impl Formula for CoverageVariationFormula {
    type Counter = LinesAndConditionsVariationCounter;

    fn create_new_counter(&self) -> LinesAndConditionsVariationCounter {
        LinesAndConditionsVariationCounter {
            inputs: self.inputs,
            lines: IntVariationValues::default(),
            covered_lines: IntVariationValues::default(),
            conditions: IntVariationValues::default(),
            covered_conditions: IntVariationValues::default(),
        }
    }

    fn create_measure(
        &self,
        counter: &LinesAndConditionsVariationCounter,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>> {
        let scale = context.metric().decimal_scale();
        let mut variations = MeasureVariations::new();
        for period in context.periods() {
            let index = period.index;
            let ratio = ratio_inputs(
                self.kind,
                counter.lines.get(index),
                counter.covered_lines.get(index).unwrap_or(0),
                counter.conditions.get(index),
                counter.covered_conditions.get(index).unwrap_or(0),
            );
            if let Some((covered, total)) = ratio {
                variations.set(index, round_half_up(calculate_coverage(covered, total), scale))?;
            }
        }
        if variations.is_empty() {
            return Ok(None);
        }
        Ok(Some(Measure::variations_only(variations)))
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &self.output_key
    }
}
