//! Per-(component, metric) measure storage
//!
//! Raw measures come from the upstream decoder through
//! [`MapBasedMeasureRepository::add_raw_measure`]; steps write their results
//! through [`MeasureRepository::add`]. Both share one key space and every
//! key is write-once for the pass.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::Measure;
use crate::component::{Component, TreeRootHolder};
use crate::error::{ComputeError, Result};
use crate::metric::{Metric, MetricRepository};

/// Read/write access to measures used by visitors and steps
pub trait MeasureRepository {
    /// Raw or already added measure, `None` when absent
    fn get_raw_measure(&self, component: &Component, metric: &Metric) -> Option<&Measure>;

    /// Store a computed measure. Fails if one already exists for the key or
    /// if the value kind does not match the metric type.
    fn add(&mut self, component: &Component, metric: &Metric, measure: Measure) -> Result<()>;
}

/// A measure written by the engine during the pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedMeasure {
    pub component_ref: u32,
    pub metric_key: String,
    pub measure: Measure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Raw,
    Added,
}

#[derive(Debug, Clone)]
struct StoredMeasure {
    measure: Measure,
    origin: Origin,
}

/// Hash map backed repository, the single store of an analysis
#[derive(Debug)]
pub struct MapBasedMeasureRepository {
    metrics: Arc<MetricRepository>,
    known_refs: FxHashSet<u32>,
    measures: FxHashMap<u32, BTreeMap<String, StoredMeasure>>,
}

impl MapBasedMeasureRepository {
    pub fn new(tree: &TreeRootHolder, metrics: Arc<MetricRepository>) -> Self {
        Self {
            metrics,
            known_refs: tree.refs().collect(),
            measures: FxHashMap::default(),
        }
    }

    pub fn metrics(&self) -> &MetricRepository {
        &self.metrics
    }

    fn existing(&self, reference: u32, metric_key: &str) -> Option<&StoredMeasure> {
        self.measures.get(&reference)?.get(metric_key)
    }

    fn insert(&mut self, reference: u32, metric: &Metric, measure: Measure, origin: Origin) -> Result<()> {
        if !self.known_refs.contains(&reference) {
            return Err(ComputeError::UnknownComponent(reference));
        }
        measure.check_compatible(metric)?;
        if self.existing(reference, &metric.key).is_some() {
            return Err(ComputeError::MeasureAlreadyExists {
                component_ref: reference,
                metric_key: metric.key.clone(),
            });
        }
        self.measures
            .entry(reference)
            .or_default()
            .insert(metric.key.clone(), StoredMeasure { measure, origin });
        Ok(())
    }

    /// Supply an input measure before any step runs
    pub fn add_raw_measure(&mut self, reference: u32, metric_key: &str, measure: Measure) -> Result<()> {
        let metrics = Arc::clone(&self.metrics);
        let metric = metrics.get_by_key(metric_key)?;
        self.insert(reference, metric, measure, Origin::Raw)
    }

    /// Raw or added measure by ref and key
    pub fn get(&self, reference: u32, metric_key: &str) -> Option<&Measure> {
        self.existing(reference, metric_key).map(|s| &s.measure)
    }

    /// Measure added by a step for this key during the pass
    pub fn get_added_raw_measure(&self, reference: u32, metric_key: &str) -> Option<&Measure> {
        self.existing(reference, metric_key)
            .filter(|s| s.origin == Origin::Added)
            .map(|s| &s.measure)
    }

    /// Every measure added on `reference`, keyed by metric key
    pub fn get_added_raw_measures(&self, reference: u32) -> BTreeMap<&str, &Measure> {
        self.measures
            .get(&reference)
            .map(|by_key| {
                by_key
                    .iter()
                    .filter(|(_, s)| s.origin == Origin::Added)
                    .map(|(key, s)| (key.as_str(), &s.measure))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All added measures ordered by component ref then metric key
    pub fn added_measures(&self) -> Vec<AddedMeasure> {
        let mut refs: Vec<u32> = self.measures.keys().copied().collect();
        refs.sort_unstable();
        refs.into_iter()
            .flat_map(|reference| {
                self.get_added_raw_measures(reference)
                    .into_iter()
                    .map(move |(key, measure)| AddedMeasure {
                        component_ref: reference,
                        metric_key: key.to_string(),
                        measure: measure.clone(),
                    })
            })
            .collect()
    }

    pub fn added_count(&self) -> usize {
        self.measures
            .values()
            .flat_map(BTreeMap::values)
            .filter(|s| s.origin == Origin::Added)
            .count()
    }

    /// True when no measure at all, raw or added, is stored
    pub fn is_empty(&self) -> bool {
        self.measures.values().all(BTreeMap::is_empty)
    }

    /// Fold the writes of a layered repository back into this store
    pub fn merge_added(&mut self, added: Vec<AddedMeasure>) -> Result<()> {
        let metrics = Arc::clone(&self.metrics);
        for AddedMeasure {
            component_ref,
            metric_key,
            measure,
        } in added
        {
            let metric = metrics.get_by_key(&metric_key)?;
            self.insert(component_ref, metric, measure, Origin::Added)?;
        }
        Ok(())
    }
}

impl MeasureRepository for MapBasedMeasureRepository {
    fn get_raw_measure(&self, component: &Component, metric: &Metric) -> Option<&Measure> {
        self.get(component.reference(), &metric.key)
    }

    fn add(&mut self, component: &Component, metric: &Metric, measure: Measure) -> Result<()> {
        self.insert(component.reference(), metric, measure, Origin::Added)
    }
}

/// Private write layer over a shared base repository
///
/// Reads see the layer first, then the base. Writes only touch the layer and
/// are checked against both so write-once holds across layers.
#[derive(Debug)]
pub struct LayeredMeasureRepository<'a> {
    base: &'a MapBasedMeasureRepository,
    added: FxHashMap<u32, BTreeMap<String, Measure>>,
}

impl<'a> LayeredMeasureRepository<'a> {
    pub fn new(base: &'a MapBasedMeasureRepository) -> Self {
        Self {
            base,
            added: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.added.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes of this layer ordered by component ref then metric key
    pub fn into_added(self) -> Vec<AddedMeasure> {
        let mut added: Vec<AddedMeasure> = self
            .added
            .into_iter()
            .flat_map(|(reference, by_key)| {
                by_key.into_iter().map(move |(metric_key, measure)| AddedMeasure {
                    component_ref: reference,
                    metric_key,
                    measure,
                })
            })
            .collect();
        added.sort_by(|a, b| {
            a.component_ref
                .cmp(&b.component_ref)
                .then_with(|| a.metric_key.cmp(&b.metric_key))
        });
        added
    }
}

impl MeasureRepository for LayeredMeasureRepository<'_> {
    fn get_raw_measure(&self, component: &Component, metric: &Metric) -> Option<&Measure> {
        self.added
            .get(&component.reference())
            .and_then(|by_key| by_key.get(&metric.key))
            .or_else(|| self.base.get_raw_measure(component, metric))
    }

    fn add(&mut self, component: &Component, metric: &Metric, measure: Measure) -> Result<()> {
        let reference = component.reference();
        if !self.base.known_refs.contains(&reference) {
            return Err(ComputeError::UnknownComponent(reference));
        }
        measure.check_compatible(metric)?;
        if self.get_raw_measure(component, metric).is_some() {
            return Err(ComputeError::MeasureAlreadyExists {
                component_ref: reference,
                metric_key: metric.key.clone(),
            });
        }
        self.added
            .entry(reference)
            .or_default()
            .insert(metric.key.clone(), measure);
        Ok(())
    }
}
