use super::{AnalysisContext, ComputationStep};
use crate::crawler::PathAwareCrawler;
use crate::error::Result;
use crate::formula::{
    long_value, numeric_measure, Counter, CounterInitializationContext, CreateMeasureContext, Formula,
    FormulaExecutorComponentVisitor, SumCounter, SumFormula,
};
use crate::measure::{Measure, MeasureRepository};
use crate::metric::core_metrics::*;

/// Comment lines, comment density and public API documentation
///
/// Comment density reads the component's `ncloc`, which the size step
/// aggregates on non-leaves without unit tests. Unit tests are skipped here
/// too so both sides of the ratio count the same files.
pub struct CommentMeasuresStep;

impl ComputationStep for CommentMeasuresStep {
    fn name(&self) -> &'static str {
        "comments"
    }

    fn description(&self) -> &'static str {
        "Compute comment measures"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["size"]
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        let mut executor = FormulaExecutorComponentVisitor::builder(context.metrics(), measures)
            .skip_unit_tests()
            .formula(SumFormula::new(COMMENTED_OUT_CODE_LINES))
            .formula(DocumentationFormula)
            .formula(CommentDensityFormula)
            .build();
        PathAwareCrawler::new(&mut executor).visit(context.tree().root())?;
        Ok(())
    }
}

/// Sums comment lines on non-leaves and computes
/// `100 * comments / (ncloc + comments)` everywhere both are known
struct CommentDensityFormula;

impl Formula for CommentDensityFormula {
    type Counter = SumCounter;

    fn create_new_counter(&self) -> SumCounter {
        SumFormula::new(COMMENT_LINES).create_new_counter()
    }

    fn create_measure(&self, counter: &SumCounter, context: &CreateMeasureContext<'_>) -> Result<Option<Measure>> {
        let Some(comments) = counter.value() else {
            return Ok(None);
        };
        match context.metric().key.as_str() {
            COMMENT_LINES if !context.is_leaf() => numeric_measure(context.metric(), comments).map(Some),
            COMMENT_LINES_DENSITY => {
                let Some(ncloc) = long_value(context.measure(NCLOC)?)? else {
                    return Ok(None);
                };
                let divisor = (ncloc + comments) as f64;
                if divisor <= 0.0 {
                    return Ok(None);
                }
                Ok(Some(Measure::double_with_scale(
                    100.0 * comments as f64 / divisor,
                    context.metric().decimal_scale(),
                )))
            }
            _ => Ok(None),
        }
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &[COMMENT_LINES, COMMENT_LINES_DENSITY]
    }
}

/// Sums public API counts on non-leaves and computes the documented share
struct DocumentationFormula;

struct DocumentationCounter {
    public_api: SumCounter,
    public_undocumented_api: SumCounter,
}

impl Counter for DocumentationCounter {
    fn aggregate(&mut self, other: &Self) {
        self.public_api.aggregate(&other.public_api);
        self.public_undocumented_api.aggregate(&other.public_undocumented_api);
    }

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        self.public_api.initialize(context)?;
        self.public_undocumented_api.initialize(context)
    }
}

impl Formula for DocumentationFormula {
    type Counter = DocumentationCounter;

    fn create_new_counter(&self) -> DocumentationCounter {
        DocumentationCounter {
            public_api: SumFormula::new(PUBLIC_API).create_new_counter(),
            public_undocumented_api: SumFormula::new(PUBLIC_UNDOCUMENTED_API).create_new_counter(),
        }
    }

    fn create_measure(
        &self,
        counter: &DocumentationCounter,
        context: &CreateMeasureContext<'_>,
    ) -> Result<Option<Measure>> {
        let api = counter.public_api.value();
        let undocumented = counter.public_undocumented_api.value();
        let metric = context.metric();
        match metric.key.as_str() {
            PUBLIC_API if !context.is_leaf() => api.map(|v| numeric_measure(metric, v)).transpose(),
            PUBLIC_UNDOCUMENTED_API if !context.is_leaf() => {
                undocumented.map(|v| numeric_measure(metric, v)).transpose()
            }
            PUBLIC_DOCUMENTED_API_DENSITY => match (api, undocumented) {
                (Some(api), Some(undocumented)) if api > 0 => Ok(Some(Measure::double_with_scale(
                    100.0 * (api - undocumented) as f64 / api as f64,
                    metric.decimal_scale(),
                ))),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &[PUBLIC_API, PUBLIC_UNDOCUMENTED_API, PUBLIC_DOCUMENTED_API_DENSITY]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentType, FileAttributes, TreeRootHolder};
    use crate::measure::MapBasedMeasureRepository;
    use crate::metric::MetricRepository;
    use std::sync::Arc;

    const ROOT_REF: u32 = 1;
    const DIRECTORY_REF: u32 = 11;
    const FILE_1_REF: u32 = 111;
    const FILE_2_REF: u32 = 112;

    fn context() -> AnalysisContext {
        let root = Component::builder(ComponentType::Project, ROOT_REF)
            .with_child(
                Component::builder(ComponentType::Directory, DIRECTORY_REF)
                    .with_child(Component::builder(ComponentType::File, FILE_1_REF).build())
                    .with_child(Component::builder(ComponentType::File, FILE_2_REF).build())
                    .build(),
            )
            .build();
        AnalysisContext::new(
            TreeRootHolder::new(root).unwrap(),
            Arc::new(MetricRepository::core()),
        )
    }

    fn execute_with(raw: &[(u32, &str, i32)]) -> MapBasedMeasureRepository {
        let context = context();
        let mut measures = context.new_measure_repository();
        for &(reference, key, value) in raw {
            measures.add_raw_measure(reference, key, Measure::int(value)).unwrap();
        }
        CommentMeasuresStep.execute(&context, &mut measures).unwrap();
        measures
    }

    #[test]
    fn test_comment_lines_and_density() {
        // non-leaf ncloc normally comes from the size step
        let measures = execute_with(&[
            (FILE_1_REF, NCLOC, 100),
            (FILE_1_REF, COMMENT_LINES, 150),
            (FILE_2_REF, NCLOC, 200),
            (FILE_2_REF, COMMENT_LINES, 50),
            (DIRECTORY_REF, NCLOC, 300),
        ]);
        assert!(measures.get_added_raw_measure(FILE_1_REF, COMMENT_LINES).is_none());
        assert_eq!(
            measures.get_added_raw_measure(FILE_1_REF, COMMENT_LINES_DENSITY),
            Some(&Measure::double(60.0))
        );
        assert_eq!(
            measures.get_added_raw_measure(FILE_2_REF, COMMENT_LINES_DENSITY),
            Some(&Measure::double(20.0))
        );
        assert_eq!(measures.get_added_raw_measure(DIRECTORY_REF, COMMENT_LINES), Some(&Measure::int(200)));
        assert_eq!(
            measures.get_added_raw_measure(DIRECTORY_REF, COMMENT_LINES_DENSITY),
            Some(&Measure::double(40.0))
        );
        // no ncloc on the root
        assert_eq!(measures.get_added_raw_measure(ROOT_REF, COMMENT_LINES), Some(&Measure::int(200)));
        assert!(measures.get_added_raw_measure(ROOT_REF, COMMENT_LINES_DENSITY).is_none());
    }

    #[test]
    fn test_unit_tests_are_left_out_of_density() {
        let root = Component::builder(ComponentType::Project, ROOT_REF)
            .with_child(
                Component::builder(ComponentType::Directory, DIRECTORY_REF)
                    .with_child(Component::builder(ComponentType::File, FILE_1_REF).build())
                    .with_child(
                        Component::builder(ComponentType::File, FILE_2_REF)
                            .with_file_attributes(FileAttributes::unit_test())
                            .build(),
                    )
                    .build(),
            )
            .build();
        let context = AnalysisContext::new(
            TreeRootHolder::new(root).unwrap(),
            Arc::new(MetricRepository::core()),
        );
        let mut measures = context.new_measure_repository();
        for (reference, key, value) in [
            (FILE_1_REF, NCLOC, 100),
            (FILE_1_REF, COMMENT_LINES, 0),
            (FILE_2_REF, NCLOC, 100),
            (FILE_2_REF, COMMENT_LINES, 100),
            (FILE_2_REF, PUBLIC_API, 10),
        ] {
            measures.add_raw_measure(reference, key, Measure::int(value)).unwrap();
        }
        crate::steps::SizeMeasuresStep.execute(&context, &mut measures).unwrap();
        CommentMeasuresStep.execute(&context, &mut measures).unwrap();

        assert_eq!(measures.get_added_raw_measure(DIRECTORY_REF, NCLOC), Some(&Measure::int(100)));
        assert_eq!(measures.get_added_raw_measure(DIRECTORY_REF, COMMENT_LINES), Some(&Measure::int(0)));
        assert_eq!(
            measures.get_added_raw_measure(DIRECTORY_REF, COMMENT_LINES_DENSITY),
            Some(&Measure::double(0.0))
        );
        assert!(measures.get_added_raw_measure(DIRECTORY_REF, PUBLIC_API).is_none());
        assert!(measures.get_added_raw_measure(FILE_2_REF, COMMENT_LINES_DENSITY).is_none());
    }

    #[test]
    fn test_no_density_when_divisor_is_zero() {
        let measures = execute_with(&[(FILE_1_REF, NCLOC, 0), (FILE_1_REF, COMMENT_LINES, 0)]);
        assert!(measures.get_added_raw_measure(FILE_1_REF, COMMENT_LINES_DENSITY).is_none());
        assert_eq!(measures.get_added_raw_measure(DIRECTORY_REF, COMMENT_LINES), Some(&Measure::int(0)));
    }

    #[test]
    fn test_public_api_documentation() {
        let measures = execute_with(&[
            (FILE_1_REF, PUBLIC_API, 50),
            (FILE_1_REF, PUBLIC_UNDOCUMENTED_API, 10),
            (FILE_2_REF, PUBLIC_API, 30),
            (FILE_2_REF, PUBLIC_UNDOCUMENTED_API, 20),
        ]);
        assert_eq!(
            measures.get_added_raw_measure(FILE_1_REF, PUBLIC_DOCUMENTED_API_DENSITY),
            Some(&Measure::double(80.0))
        );
        assert!(measures.get_added_raw_measure(FILE_1_REF, PUBLIC_API).is_none());
        for reference in [DIRECTORY_REF, ROOT_REF] {
            assert_eq!(measures.get_added_raw_measure(reference, PUBLIC_API), Some(&Measure::int(80)));
            assert_eq!(
                measures.get_added_raw_measure(reference, PUBLIC_UNDOCUMENTED_API),
                Some(&Measure::int(30))
            );
            assert_eq!(
                measures.get_added_raw_measure(reference, PUBLIC_DOCUMENTED_API_DENSITY),
                Some(&Measure::double(62.5))
            );
        }
    }

    #[test]
    fn test_documented_density_needs_both_counts() {
        let measures = execute_with(&[(FILE_1_REF, PUBLIC_API, 50), (FILE_2_REF, PUBLIC_API, 0)]);
        assert!(measures.get_added_raw_measure(FILE_1_REF, PUBLIC_DOCUMENTED_API_DENSITY).is_none());
        assert!(measures.get_added_raw_measure(FILE_2_REF, PUBLIC_DOCUMENTED_API_DENSITY).is_none());
        assert_eq!(measures.get_added_raw_measure(ROOT_REF, PUBLIC_API), Some(&Measure::int(50)));
        assert!(measures.get_added_raw_measure(ROOT_REF, PUBLIC_DOCUMENTED_API_DENSITY).is_none());
    }

    #[test]
    fn test_commented_out_code_lines_sum() {
        let measures = execute_with(&[(FILE_1_REF, COMMENTED_OUT_CODE_LINES, 3), (FILE_2_REF, COMMENTED_OUT_CODE_LINES, 4)]);
        assert_eq!(
            measures.get_added_raw_measure(ROOT_REF, COMMENTED_OUT_CODE_LINES),
            Some(&Measure::int(7))
        );
    }
}
