use chrono::{DateTime, Utc};

use super::{add_numeric, AnalysisContext, ComputationStep};
use crate::component::{Component, ComponentType, CrawlerDepthLimit};
use crate::crawler::{Order, Path, PathAwareCrawler, PathAwareVisitor};
use crate::error::Result;
use crate::formula::long_value;
use crate::measure::{Measure, MeasureRepository};
use crate::metric::core_metrics::{DAYS_SINCE_LAST_COMMIT, LAST_COMMIT_DATE};
use crate::metric::MetricRepository;
use crate::scm::ChangesetRepository;

/// Date of the most recent commit and days elapsed since then
///
/// A FILE takes the latest date of its changesets, a PROJECT_VIEW its raw
/// `last_commit_date`. Every ancestor takes the latest date of its children.
pub struct LastCommitStep;

impl ComputationStep for LastCommitStep {
    fn name(&self) -> &'static str {
        "last-commit"
    }

    fn description(&self) -> &'static str {
        "Compute date of last commit"
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        let mut visitor = LastCommitVisitor {
            metrics: context.metrics(),
            changesets: context.changesets(),
            analysis_date: context.analysis_date(),
            measures,
        };
        PathAwareCrawler::new(&mut visitor).visit(context.tree().root())?;
        Ok(())
    }
}

struct LastCommitVisitor<'a> {
    metrics: &'a MetricRepository,
    changesets: &'a dyn ChangesetRepository,
    analysis_date: DateTime<Utc>,
    measures: &'a mut dyn MeasureRepository,
}

impl LastCommitVisitor<'_> {
    fn raw_last_commit(&self, project_view: &Component) -> Result<Option<DateTime<Utc>>> {
        let metric = self.metrics.get_by_key(LAST_COMMIT_DATE)?;
        let millis = long_value(self.measures.get_raw_measure(project_view, metric))?;
        Ok(millis.and_then(DateTime::from_timestamp_millis))
    }

    fn add_measures(&mut self, component: &Component, last_commit: DateTime<Utc>) -> Result<()> {
        let metric = self.metrics.get_by_key(LAST_COMMIT_DATE)?;
        self.measures
            .add(component, metric, Measure::long(last_commit.timestamp_millis()))?;
        let days = (self.analysis_date - last_commit).num_days();
        add_numeric(&mut *self.measures, self.metrics, component, DAYS_SINCE_LAST_COMMIT, days)
    }
}

impl PathAwareVisitor for LastCommitVisitor<'_> {
    type Element = Option<DateTime<Utc>>;

    fn max_depth(&self) -> CrawlerDepthLimit {
        CrawlerDepthLimit::LEAVES
    }

    fn order(&self) -> Order {
        Order::PostOrder
    }

    fn name(&self) -> &str {
        "LastCommitVisitor"
    }

    fn create_element(&mut self, _component: &Component) -> Option<DateTime<Utc>> {
        None
    }

    fn visit_any(&mut self, component: &Component, path: &mut Path<Option<DateTime<Utc>>>) -> Result<()> {
        match component.component_type() {
            ComponentType::File => {
                *path.current_mut() = self
                    .changesets
                    .get_changesets(component.reference())
                    .and_then(|c| c.last_commit_date());
            }
            // copied from the project, only fed to the parent
            ComponentType::ProjectView => {
                *path.current_mut() = self.raw_last_commit(component)?;
            }
            _ => {}
        }

        let last_commit = *path.current();
        if let Some(date) = last_commit {
            if component.component_type() != ComponentType::ProjectView {
                self.add_measures(component, date)?;
            }
            if let Some(parent) = path.parent_mut() {
                *parent = (*parent).max(Some(date));
            }
        }
        Ok(())
    }
}
