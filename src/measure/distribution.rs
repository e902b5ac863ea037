use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::line_data::{format_pairs, parse_pairs};
use crate::error::{ComputeError, Result};

/// Histogram value: ordered buckets (lower bound) with a count each
///
/// Serialized as `"0.5=3;3.5=5;6.5=9"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Distribution {
    buckets: Vec<(f64, i64)>,
}

impl Distribution {
    pub fn new(buckets: impl IntoIterator<Item = (f64, i64)>) -> Self {
        Self {
            buckets: buckets.into_iter().collect(),
        }
    }

    pub fn buckets(&self) -> &[(f64, i64)] {
        &self.buckets
    }

    /// Total count across buckets
    pub fn total(&self) -> i64 {
        self.buckets.iter().map(|(_, count)| count).sum()
    }

    pub fn has_same_buckets(&self, other: &Distribution) -> bool {
        self.buckets.len() == other.buckets.len()
            && self
                .buckets
                .iter()
                .zip(&other.buckets)
                .all(|((a, _), (b, _))| a == b)
    }

    /// Add `other` bucket by bucket. Both sides must share bucket bounds.
    pub fn merge(&mut self, other: &Distribution) -> Result<()> {
        if !self.has_same_buckets(other) {
            return Err(ComputeError::MalformedData {
                data: other.to_string(),
                reason: format!("buckets differ from '{}'", self),
            });
        }
        for ((_, count), (_, other_count)) in self.buckets.iter_mut().zip(&other.buckets) {
            *count += other_count;
        }
        Ok(())
    }
}

impl FromStr for Distribution {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self {
            buckets: parse_pairs(s)?,
        })
    }
}

impl TryFrom<String> for Distribution {
    type Error = ComputeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Distribution> for String {
    fn from(value: Distribution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_pairs(self.buckets.iter().copied()))
    }
}
