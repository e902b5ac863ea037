use super::{AnalysisContext, ComputationStep};
use crate::crawler::PathAwareCrawler;
use crate::error::Result;
use crate::formula::{CoverageFormula, FormulaExecutorComponentVisitor, SumFormula};
use crate::measure::MeasureRepository;
use crate::metric::core_metrics::COVERAGE_FAMILIES;

/// Coverage of unit tests, integration tests and both together
///
/// Lines and conditions to cover and their uncovered counts are summed on
/// non-leaves. Code, line and branch coverage are computed on every
/// component. Unit test files are ignored.
pub struct CoverageMeasuresStep;

impl ComputationStep for CoverageMeasuresStep {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn description(&self) -> &'static str {
        "Compute coverage measures"
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        let mut builder =
            FormulaExecutorComponentVisitor::builder(context.metrics(), measures).skip_unit_tests();
        for family in &COVERAGE_FAMILIES {
            builder = builder
                .formula(SumFormula::new(family.lines_to_cover))
                .formula(SumFormula::new(family.uncovered_lines))
                .formula(SumFormula::new(family.conditions_to_cover))
                .formula(SumFormula::new(family.uncovered_conditions));
            for formula in CoverageFormula::all_of(family) {
                builder = builder.formula(formula);
            }
        }
        let mut executor = builder.build();
        PathAwareCrawler::new(&mut executor).visit(context.tree().root())?;
        Ok(())
    }
}
