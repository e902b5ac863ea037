//! metric-rollup - hierarchical measure computation engine
//!
//! Computes derived code-quality measures for every component of an analysed
//! project (or of a portfolio view) from the raw measures of its leaves, and
//! aggregates them bottom-up: sizes, complexity, comments, coverage, coverage
//! of new code per comparison period, and last commit dates.
//!
//! ```no_run
//! use std::sync::Arc;
//! use metric_rollup::{
//!     AnalysisContext, Component, ComponentType, EngineConfig, MetricRepository, StepSequencer,
//!     TreeRootHolder,
//! };
//!
//! # fn main() -> metric_rollup::Result<()> {
//! let root = Component::builder(ComponentType::Project, 1)
//!     .with_child(Component::builder(ComponentType::File, 2).build())
//!     .build();
//! let context = AnalysisContext::new(TreeRootHolder::new(root)?, Arc::new(MetricRepository::core()));
//! let mut measures = context.new_measure_repository();
//! measures.add_raw_measure(2, "ncloc", metric_rollup::Measure::int(120))?;
//!
//! let summary = StepSequencer::from_config(&EngineConfig::default())?.run(&context, &mut measures)?;
//! println!("{} measures added", summary.measures_added);
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod config;
pub mod crawler;
pub mod engine;
pub mod error;
pub mod formula;
pub mod measure;
pub mod metric;
pub mod period;
pub mod scm;
pub mod steps;

pub use component::{Component, ComponentType, CrawlerDepthLimit, FileAttributes, TreeRootHolder};
pub use config::{load_engine_config, EngineConfig};
pub use engine::{ExecutionSummary, StepSequencer, StepTiming};
pub use error::{ComputeError, Result};
pub use measure::{
    AddedMeasure, MapBasedMeasureRepository, Measure, MeasureRepository, MeasureVariations,
};
pub use metric::{Metric, MetricRepository, MetricType};
pub use period::{Period, PeriodsHolder};
pub use scm::{Changeset, ChangesetRepository, Changesets, InMemoryChangesetRepository};
pub use steps::{default_steps, AnalysisContext, ComputationStep};
