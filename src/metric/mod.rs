//! Metric catalog
//!
//! Metrics are immutable definitions looked up by key. The catalog is closed
//! for the duration of an analysis: looking up an unknown key is an error,
//! not an absent value.

pub mod core_metrics;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, Result};

/// Decimal scale applied to FLOAT and PERCENT metrics when none is given
pub const DEFAULT_DECIMAL_SCALE: u32 = 1;

/// Kind of value a metric holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    Int,
    Long,
    Float,
    Percent,
    Bool,
    String,
    Level,
    Distribution,
}

impl MetricType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Float | Self::Percent)
    }

    pub fn is_decimal(self) -> bool {
        matches!(self, Self::Float | Self::Percent)
    }
}

/// A named, typed measurable property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: u32,
    pub key: String,
    pub name: String,
    pub metric_type: MetricType,
    #[serde(default)]
    pub decimal_scale: Option<u32>,
}

impl Metric {
    pub fn new(id: u32, key: impl Into<String>, name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            metric_type,
            decimal_scale: None,
        }
    }

    pub fn with_decimal_scale(mut self, scale: u32) -> Self {
        self.decimal_scale = Some(scale);
        self
    }

    /// Decimal places kept when creating double measures of this metric
    pub fn decimal_scale(&self) -> u32 {
        self.decimal_scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
    }
}

/// Keyed lookup of the metrics known to an analysis
#[derive(Debug, Clone, Default)]
pub struct MetricRepository {
    by_key: FxHashMap<String, Metric>,
    key_by_id: FxHashMap<u32, String>,
}

impl MetricRepository {
    pub fn new(metrics: impl IntoIterator<Item = Metric>) -> Result<Self> {
        let mut repository = Self::default();
        for metric in metrics {
            if repository.by_key.contains_key(&metric.key) {
                return Err(ComputeError::DuplicateMetric(metric.key));
            }
            repository.key_by_id.insert(metric.id, metric.key.clone());
            repository.by_key.insert(metric.key.clone(), metric);
        }
        Ok(repository)
    }

    /// Catalog of every metric the built-in steps read or write
    pub fn core() -> Self {
        let mut repository = Self::default();
        for metric in core_metrics::all() {
            repository.key_by_id.insert(metric.id, metric.key.clone());
            repository.by_key.insert(metric.key.clone(), metric);
        }
        repository
    }

    pub fn get_by_key(&self, key: &str) -> Result<&Metric> {
        self.by_key
            .get(key)
            .ok_or_else(|| ComputeError::UnknownMetric(key.to_string()))
    }

    pub fn get_by_id(&self, id: u32) -> Option<&Metric> {
        self.key_by_id.get(&id).and_then(|key| self.by_key.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
