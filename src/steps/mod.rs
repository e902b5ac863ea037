//! Computation steps
//!
//! A step is one computation pass over the component tree for one metric
//! family. Steps read the raw measures and the measures added by the steps
//! they depend on, and add their own measures to the repository.
//!
//! | step | measures |
//! |------|----------|
//! | `size` | files, directories, lines, ncloc, functions, classes... |
//! | `complexity` | complexity sums, distributions and averages |
//! | `comments` | comment lines, densities, public API documentation |
//! | `coverage` | coverage ratios of the three coverage families |
//! | `new-coverage` | coverage of code changed since each period |
//! | `last-commit` | last commit date, days since last commit |

mod comments;
mod complexity;
mod coverage;
mod last_commit;
mod new_coverage;
mod size;

pub use comments::CommentMeasuresStep;
pub use complexity::ComplexityMeasuresStep;
pub use coverage::CoverageMeasuresStep;
pub use last_commit::LastCommitStep;
pub use new_coverage::{NewCoverageMeasuresStep, NewLinesAndConditionsFormula};
pub use size::SizeMeasuresStep;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::component::{Component, TreeRootHolder};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::formula::numeric_measure;
use crate::measure::{MapBasedMeasureRepository, MeasureRepository, MAX_PERIOD_INDEX};
use crate::metric::MetricRepository;
use crate::period::{Period, PeriodsHolder};
use crate::scm::{ChangesetRepository, InMemoryChangesetRepository};

/// Views only carry variations for periods up to this index
pub const DEFAULT_VIEWS_MAX_PERIOD_INDEX: usize = 3;

/// One computation pass of the engine
pub trait ComputationStep: Send + Sync {
    /// Unique step name, as used in configuration
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Names of the steps whose added measures this step reads
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()>;
}

/// The steps of a full analysis, in execution order
pub fn default_steps() -> Vec<Box<dyn ComputationStep>> {
    vec![
        Box::new(SizeMeasuresStep),
        Box::new(ComplexityMeasuresStep),
        Box::new(CommentMeasuresStep),
        Box::new(CoverageMeasuresStep),
        Box::new(NewCoverageMeasuresStep),
        Box::new(LastCommitStep),
    ]
}

/// Add an integer measure of the metric's numeric type
pub(crate) fn add_numeric(
    measures: &mut dyn MeasureRepository,
    metrics: &MetricRepository,
    component: &Component,
    metric_key: &str,
    value: i64,
) -> Result<()> {
    let metric = metrics.get_by_key(metric_key)?;
    measures.add(component, metric, numeric_measure(metric, value)?)
}

/// Read-only inputs of one analysis, shared by every step
pub struct AnalysisContext {
    tree: TreeRootHolder,
    metrics: Arc<MetricRepository>,
    periods: PeriodsHolder,
    changesets: Box<dyn ChangesetRepository>,
    analysis_date: DateTime<Utc>,
    views_max_period_index: usize,
}

impl AnalysisContext {
    pub fn new(tree: TreeRootHolder, metrics: Arc<MetricRepository>) -> Self {
        Self {
            tree,
            metrics,
            periods: PeriodsHolder::default(),
            changesets: Box::new(InMemoryChangesetRepository::new()),
            analysis_date: Utc::now(),
            views_max_period_index: DEFAULT_VIEWS_MAX_PERIOD_INDEX,
        }
    }

    pub fn with_periods(mut self, periods: PeriodsHolder) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_changesets(mut self, changesets: impl ChangesetRepository + 'static) -> Self {
        self.changesets = Box::new(changesets);
        self
    }

    /// Date the analysis runs at, defaults to now
    pub fn with_analysis_date(mut self, analysis_date: DateTime<Utc>) -> Self {
        self.analysis_date = analysis_date;
        self
    }

    /// Highest period index views carry variations for, capped at
    /// [`MAX_PERIOD_INDEX`]
    pub fn with_views_max_period_index(mut self, max_index: usize) -> Self {
        self.views_max_period_index = max_index.min(MAX_PERIOD_INDEX);
        self
    }

    /// Apply the analysis settings of `config`
    ///
    /// Step selection and parallelism belong to
    /// [`StepSequencer::from_config`](crate::StepSequencer::from_config).
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_views_max_period_index(config.views.max_period_index)
    }

    pub fn tree(&self) -> &TreeRootHolder {
        &self.tree
    }

    pub fn metrics(&self) -> &MetricRepository {
        &self.metrics
    }

    pub fn periods(&self) -> &PeriodsHolder {
        &self.periods
    }

    pub fn changesets(&self) -> &dyn ChangesetRepository {
        &*self.changesets
    }

    pub fn analysis_date(&self) -> DateTime<Utc> {
        self.analysis_date
    }

    /// Periods variations are computed for on this tree
    ///
    /// A views tree only keeps the periods up to the views maximum index.
    pub fn periods_for_tree(&self) -> Vec<Period> {
        if self.tree.is_views() {
            self.periods.up_to(self.views_max_period_index)
        } else {
            self.periods.periods().to_vec()
        }
    }

    /// Empty measure repository over this analysis' tree and metrics
    pub fn new_measure_repository(&self) -> MapBasedMeasureRepository {
        MapBasedMeasureRepository::new(&self.tree, Arc::clone(&self.metrics))
    }
}

#[cfg(test)]
mod tests;
