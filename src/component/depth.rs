//! How deep a crawler descends in each tree family

use serde::{Deserialize, Serialize};

use super::ComponentType;

/// Maximum depth a visitor is interested in, per tree family
///
/// A family without a max depth is not visited at all: `FILE` only covers
/// report trees, `LEAVES` covers both families down to their leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlerDepthLimit {
    report_max_depth: Option<ComponentType>,
    views_max_depth: Option<ComponentType>,
}

impl CrawlerDepthLimit {
    pub const PROJECT: Self = Self::report(ComponentType::Project);
    pub const MODULE: Self = Self::report(ComponentType::Module);
    pub const DIRECTORY: Self = Self::report(ComponentType::Directory);
    pub const FILE: Self = Self::report(ComponentType::File);
    pub const VIEW: Self = Self::views(ComponentType::View);
    pub const SUBVIEW: Self = Self::views(ComponentType::Subview);
    pub const PROJECT_VIEW: Self = Self::views(ComponentType::ProjectView);
    pub const LEAVES: Self = Self {
        report_max_depth: Some(ComponentType::File),
        views_max_depth: Some(ComponentType::ProjectView),
    };
    pub const ROOTS: Self = Self {
        report_max_depth: Some(ComponentType::Project),
        views_max_depth: Some(ComponentType::View),
    };

    const fn report(max_depth: ComponentType) -> Self {
        Self {
            report_max_depth: Some(max_depth),
            views_max_depth: None,
        }
    }

    const fn views(max_depth: ComponentType) -> Self {
        Self {
            report_max_depth: None,
            views_max_depth: Some(max_depth),
        }
    }

    /// Limit descending report trees to `report` and views trees to `views`
    pub fn new(report: Option<ComponentType>, views: Option<ComponentType>) -> Self {
        Self {
            report_max_depth: report.filter(|t| t.is_report_type()),
            views_max_depth: views.filter(|t| t.is_views_type()),
        }
    }

    pub fn report_max_depth(&self) -> Option<ComponentType> {
        self.report_max_depth
    }

    pub fn views_max_depth(&self) -> Option<ComponentType> {
        self.views_max_depth
    }

    fn max_depth_for(&self, component_type: ComponentType) -> Option<ComponentType> {
        if component_type.is_report_type() {
            self.report_max_depth
        } else {
            self.views_max_depth
        }
    }

    /// The limit reaches strictly below `component_type`
    pub fn is_deeper_than(&self, component_type: ComponentType) -> bool {
        self.max_depth_for(component_type)
            .is_some_and(|max| max.is_deeper_than(component_type))
    }

    /// The limit stops exactly at `component_type`
    pub fn is_same_as(&self, component_type: ComponentType) -> bool {
        self.max_depth_for(component_type) == Some(component_type)
    }

    /// Components of `component_type` are within the limit
    pub fn allows(&self, component_type: ComponentType) -> bool {
        self.is_same_as(component_type) || self.is_deeper_than(component_type)
    }
}
