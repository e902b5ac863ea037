//! Measure model and storage
//!
//! A [`Measure`] holds at most one value of the kind dictated by its metric
//! plus optional per-period [`MeasureVariations`]. A measure without value
//! and without variations is a *no-value* measure, which is distinct from the
//! absence of a measure.

mod distribution;
pub mod line_data;
mod repository;
mod variations;

pub use distribution::Distribution;
pub use repository::{
    AddedMeasure, LayeredMeasureRepository, MapBasedMeasureRepository, MeasureRepository,
};
pub use variations::{MeasureVariations, MAX_PERIOD_INDEX};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ComputeError, Result};
use crate::metric::{Metric, MetricType};

/// Quality gate level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Ok,
    Warn,
    Error,
}

/// Value payload of a measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MeasureValue {
    NoValue,
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Level(Level),
    Distribution(Distribution),
}

impl MeasureValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NoValue => "NO_VALUE",
            Self::Int(_) => "INT",
            Self::Long(_) => "LONG",
            Self::Double(_) => "DOUBLE",
            Self::Bool(_) => "BOOLEAN",
            Self::String(_) => "STRING",
            Self::Level(_) => "LEVEL",
            Self::Distribution(_) => "DISTRIBUTION",
        }
    }

    /// Whether this value may be stored for a metric of `metric_type`
    pub fn is_compatible_with(&self, metric_type: MetricType) -> bool {
        match self {
            Self::NoValue => true,
            Self::Int(_) => metric_type == MetricType::Int,
            Self::Long(_) => metric_type == MetricType::Long,
            Self::Double(_) => metric_type.is_decimal(),
            Self::Bool(_) => metric_type == MetricType::Bool,
            Self::String(_) => metric_type == MetricType::String,
            Self::Level(_) => metric_type == MetricType::Level,
            Self::Distribution(_) => metric_type == MetricType::Distribution,
        }
    }
}

/// A value of a metric for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    value: MeasureValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variations: Option<MeasureVariations>,
}

impl Measure {
    fn of(value: MeasureValue) -> Self {
        Self {
            value,
            variations: None,
        }
    }

    pub fn no_value() -> Self {
        Self::of(MeasureValue::NoValue)
    }

    pub fn int(value: i32) -> Self {
        Self::of(MeasureValue::Int(value))
    }

    pub fn long(value: i64) -> Self {
        Self::of(MeasureValue::Long(value))
    }

    /// Double measure stored as given
    pub fn double(value: f64) -> Self {
        Self::of(MeasureValue::Double(value))
    }

    /// Double measure rounded half-up to `scale` decimal places
    pub fn double_with_scale(value: f64, scale: u32) -> Self {
        Self::double(round_half_up(value, scale))
    }

    pub fn bool(value: bool) -> Self {
        Self::of(MeasureValue::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::of(MeasureValue::String(value.into()))
    }

    pub fn level(value: Level) -> Self {
        Self::of(MeasureValue::Level(value))
    }

    pub fn distribution(value: Distribution) -> Self {
        Self::of(MeasureValue::Distribution(value))
    }

    /// No-value measure carrying only variations
    pub fn variations_only(variations: MeasureVariations) -> Self {
        Self::no_value().with_variations(variations)
    }

    pub fn with_variations(mut self, variations: MeasureVariations) -> Self {
        self.variations = Some(variations);
        self
    }

    pub fn value(&self) -> &MeasureValue {
        &self.value
    }

    pub fn has_value(&self) -> bool {
        self.value != MeasureValue::NoValue
    }

    pub fn variations(&self) -> Option<&MeasureVariations> {
        self.variations.as_ref()
    }

    /// Variation for `period_index`, `None` when not set
    pub fn variation(&self, period_index: usize) -> Option<f64> {
        self.variations.as_ref().and_then(|v| v.get(period_index))
    }

    fn conversion_error(&self, target: &'static str) -> ComputeError {
        ComputeError::ValueConversion {
            target,
            actual: self.value.type_name(),
        }
    }

    pub fn int_value(&self) -> Result<i32> {
        match self.value {
            MeasureValue::Int(v) => Ok(v),
            _ => Err(self.conversion_error("int")),
        }
    }

    /// INT and LONG values read as long
    pub fn long_value(&self) -> Result<i64> {
        match self.value {
            MeasureValue::Int(v) => Ok(i64::from(v)),
            MeasureValue::Long(v) => Ok(v),
            _ => Err(self.conversion_error("long")),
        }
    }

    /// Any numeric value read as double
    pub fn double_value(&self) -> Result<f64> {
        match self.value {
            MeasureValue::Int(v) => Ok(f64::from(v)),
            MeasureValue::Long(v) => Ok(v as f64),
            MeasureValue::Double(v) => Ok(v),
            _ => Err(self.conversion_error("double")),
        }
    }

    pub fn bool_value(&self) -> Result<bool> {
        match self.value {
            MeasureValue::Bool(v) => Ok(v),
            _ => Err(self.conversion_error("boolean")),
        }
    }

    pub fn string_value(&self) -> Result<&str> {
        match &self.value {
            MeasureValue::String(v) => Ok(v),
            _ => Err(self.conversion_error("string")),
        }
    }

    pub fn level_value(&self) -> Result<Level> {
        match self.value {
            MeasureValue::Level(v) => Ok(v),
            _ => Err(self.conversion_error("level")),
        }
    }

    pub fn distribution_value(&self) -> Result<&Distribution> {
        match &self.value {
            MeasureValue::Distribution(v) => Ok(v),
            _ => Err(self.conversion_error("distribution")),
        }
    }

    /// Reject a measure whose value kind does not fit `metric`
    pub fn check_compatible(&self, metric: &Metric) -> Result<()> {
        if self.value.is_compatible_with(metric.metric_type) {
            Ok(())
        } else {
            Err(ComputeError::ValueTypeMismatch {
                metric_key: metric.key.clone(),
                expected: metric.metric_type,
                actual: self.value.type_name(),
            })
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            MeasureValue::NoValue => write!(f, "<no value>")?,
            MeasureValue::Int(v) => write!(f, "{}", v)?,
            MeasureValue::Long(v) => write!(f, "{}", v)?,
            MeasureValue::Double(v) => write!(f, "{}", v)?,
            MeasureValue::Bool(v) => write!(f, "{}", v)?,
            MeasureValue::String(v) => write!(f, "{}", v)?,
            MeasureValue::Level(v) => write!(f, "{:?}", v)?,
            MeasureValue::Distribution(v) => write!(f, "{}", v)?,
        }
        if let Some(variations) = &self.variations {
            write!(f, " {}", variations)?;
        }
        Ok(())
    }
}

/// Round half-up (away from zero) to `scale` decimal places
///
/// Works on the shortest decimal representation of `value`, so 95.45 rounds
/// to 95.5 even though its binary value is slightly below it.
pub fn round_half_up(value: f64, scale: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // f64's Display never uses exponent notation
    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let scale = scale as usize;
    if frac_part.len() <= scale {
        return value;
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(scale))
        .map(|b| b - b'0')
        .collect();
    if frac_part.as_bytes()[scale] >= b'5' {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - scale;
    let mut rounded = String::with_capacity(digits.len() + 2);
    if value < 0.0 {
        rounded.push('-');
    }
    rounded.extend(digits[..split].iter().map(|d| char::from(b'0' + d)));
    if scale > 0 {
        rounded.push('.');
        rounded.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    }
    rounded.parse().unwrap_or(value)
}
