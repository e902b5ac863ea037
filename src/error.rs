//! Errors raised by the computation engine
//!
//! Every variant is fatal for the current pass: a step that hits one of these
//! aborts and the sequencer returns the error to the caller. Missing optional
//! data (no raw measure, no changesets) is never an error, it is absence.

use thiserror::Error;

use crate::metric::MetricType;

/// Errors that can occur while computing measures
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Unknown metric key '{0}'")]
    UnknownMetric(String),

    #[error("Duplicate metric key '{0}' in catalog")]
    DuplicateMetric(String),

    #[error("Unknown component ref {0}")]
    UnknownComponent(u32),

    #[error("Component ref {0} appears more than once in the tree")]
    DuplicateComponentRef(u32),

    #[error("Invalid component {reference}: {reason}")]
    InvalidComponent { reference: u32, reason: String },

    #[error("Tree mixes report component {report} and views component {views}")]
    MixedTree { report: u32, views: u32 },

    #[error("A measure already exists for component {component_ref} and metric '{metric_key}'")]
    MeasureAlreadyExists {
        component_ref: u32,
        metric_key: String,
    },

    #[error("Measure value type {actual} does not match type {expected:?} of metric '{metric_key}'")]
    ValueTypeMismatch {
        metric_key: String,
        expected: MetricType,
        actual: &'static str,
    },

    #[error("value can not be converted to {target} because current value type is a {actual}")]
    ValueConversion {
        target: &'static str,
        actual: &'static str,
    },

    #[error("Value {value} of metric '{metric_key}' overflows an INT measure")]
    IntOverflow { metric_key: String, value: i64 },

    #[error("Malformed data '{data}': {reason}")]
    MalformedData { data: String, reason: String },

    #[error("Invalid period index {0}, must be within 1..=5")]
    InvalidPeriodIndex(usize),

    #[error("Period index {0} is declared more than once")]
    DuplicatePeriod(usize),

    #[error("Line {line} of component {component_ref} has no changeset index")]
    MissingChangesetLine { component_ref: u32, line: u32 },

    #[error("Changeset index {index} of component {component_ref} is out of range ({count} changesets)")]
    ChangesetIndexOutOfRange {
        component_ref: u32,
        index: usize,
        count: usize,
    },

    #[error("Step '{0}' is unknown")]
    UnknownStep(String),

    #[error("Step dependencies can not be ordered, stuck on: {0:?}")]
    StepDependencyCycle(Vec<&'static str>),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ComputeError>;
