use tracing::debug;

use super::{add_numeric, AnalysisContext, ComputationStep};
use crate::component::{Component, ComponentType, CrawlerDepthLimit};
use crate::crawler::{Order, Path, PathAwareCrawler, PathAwareVisitor};
use crate::error::Result;
use crate::formula::{long_value, FormulaExecutorComponentVisitor, SumFormula};
use crate::measure::MeasureRepository;
use crate::metric::core_metrics::*;
use crate::metric::MetricRepository;

/// Metrics summed over non unit test files
const SUMMED_METRICS: [&str; 8] = [
    LINES,
    GENERATED_LINES,
    NCLOC,
    GENERATED_NCLOC,
    FUNCTIONS,
    STATEMENTS,
    CLASSES,
    ACCESSORS,
];

/// Counts files and directories, sums line and declaration counts
///
/// Every non unit test FILE gets `files = 1`. Every DIRECTORY counts as one
/// directory, even an empty one. Ancestors get the counts when non-zero.
pub struct SizeMeasuresStep;

impl ComputationStep for SizeMeasuresStep {
    fn name(&self) -> &'static str {
        "size"
    }

    fn description(&self) -> &'static str {
        "Compute size measures"
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        let root = context.tree().root();
        let metrics = context.metrics();

        let mut counter = FileAndDirectoryCounter {
            metrics,
            measures: &mut *measures,
        };
        PathAwareCrawler::new(&mut counter).visit(root)?;

        let executor = SUMMED_METRICS.into_iter().fold(
            FormulaExecutorComponentVisitor::builder(metrics, measures).skip_unit_tests(),
            |builder, key| builder.formula(SumFormula::new(key)),
        );
        PathAwareCrawler::new(&mut executor.build()).visit(root)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    files: i64,
    directories: i64,
}

struct FileAndDirectoryCounter<'a> {
    metrics: &'a MetricRepository,
    measures: &'a mut dyn MeasureRepository,
}

impl FileAndDirectoryCounter<'_> {
    fn raw_count(&self, component: &Component, metric_key: &str) -> Result<i64> {
        let metric = self.metrics.get_by_key(metric_key)?;
        Ok(long_value(self.measures.get_raw_measure(component, metric))?.unwrap_or(0))
    }

    fn add_if_positive(&mut self, component: &Component, metric_key: &str, value: i64) -> Result<()> {
        if value > 0 {
            add_numeric(&mut *self.measures, self.metrics, component, metric_key, value)?;
        }
        Ok(())
    }
}

impl PathAwareVisitor for FileAndDirectoryCounter<'_> {
    type Element = Counts;

    fn max_depth(&self) -> CrawlerDepthLimit {
        CrawlerDepthLimit::LEAVES
    }

    fn order(&self) -> Order {
        Order::PostOrder
    }

    fn name(&self) -> &str {
        "FileAndDirectoryCounter"
    }

    fn create_element(&mut self, _component: &Component) -> Counts {
        Counts::default()
    }

    fn visit_any(&mut self, component: &Component, path: &mut Path<Counts>) -> Result<()> {
        match component.component_type() {
            ComponentType::File if component.is_unit_test() => {
                debug!("Not counting unit test file {}", component);
            }
            ComponentType::File => {
                path.current_mut().files = 1;
                add_numeric(&mut *self.measures, self.metrics, component, FILES, 1)?;
            }
            ComponentType::ProjectView => {
                let counts = path.current_mut();
                counts.files = self.raw_count(component, FILES)?;
                counts.directories = self.raw_count(component, DIRECTORIES)?;
            }
            component_type => {
                if component_type == ComponentType::Directory {
                    path.current_mut().directories += 1;
                }
                let Counts { files, directories } = *path.current();
                self.add_if_positive(component, FILES, files)?;
                self.add_if_positive(component, DIRECTORIES, directories)?;
            }
        }

        let (current, parent) = path.current_and_parent_mut();
        if let Some(parent) = parent {
            parent.files += current.files;
            parent.directories += current.directories;
        }
        Ok(())
    }
}
