use super::{AnalysisContext, ComputationStep};
use crate::crawler::PathAwareCrawler;
use crate::error::Result;
use crate::formula::{AverageFormula, DistributionFormula, FormulaExecutorComponentVisitor, SumFormula};
use crate::measure::MeasureRepository;
use crate::metric::core_metrics::*;

/// Aggregates complexity, its distributions and its per-file, per-class and
/// per-function averages
///
/// `file_complexity` divides by the `files` measure the size step adds, so
/// this step runs after it.
pub struct ComplexityMeasuresStep;

impl ComputationStep for ComplexityMeasuresStep {
    fn name(&self) -> &'static str {
        "complexity"
    }

    fn description(&self) -> &'static str {
        "Compute complexity measures"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["size"]
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        let mut executor = FormulaExecutorComponentVisitor::builder(context.metrics(), measures)
            .formula(SumFormula::new(COMPLEXITY))
            .formula(SumFormula::new(COMPLEXITY_IN_CLASSES))
            .formula(SumFormula::new(COMPLEXITY_IN_FUNCTIONS))
            .formula(DistributionFormula::new(FUNCTION_COMPLEXITY_DISTRIBUTION))
            .formula(DistributionFormula::new(FILE_COMPLEXITY_DISTRIBUTION))
            .formula(DistributionFormula::new(CLASS_COMPLEXITY_DISTRIBUTION))
            .formula(AverageFormula::new(FILE_COMPLEXITY, COMPLEXITY, FILES))
            .formula(
                AverageFormula::new(CLASS_COMPLEXITY, COMPLEXITY_IN_CLASSES, CLASSES)
                    .with_fallback(COMPLEXITY),
            )
            .formula(
                AverageFormula::new(FUNCTION_COMPLEXITY, COMPLEXITY_IN_FUNCTIONS, FUNCTIONS)
                    .with_fallback(COMPLEXITY),
            )
            .build();
        PathAwareCrawler::new(&mut executor).visit(context.tree().root())?;
        Ok(())
    }
}
