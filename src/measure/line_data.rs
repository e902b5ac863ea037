//! `key=value;key=value` text format used by line data and distributions

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{ComputeError, Result};

fn malformed(data: &str, reason: impl Into<String>) -> ComputeError {
    ComputeError::MalformedData {
        data: data.to_string(),
        reason: reason.into(),
    }
}

/// Parse `k1=v1;k2=v2` into pairs, keeping input order. Empty segments are
/// ignored so `""` and `"1=2;"` are accepted.
pub fn parse_pairs<K, V>(data: &str) -> Result<Vec<(K, V)>>
where
    K: FromStr,
    V: FromStr,
{
    data.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| malformed(data, format!("missing '=' in '{}'", segment)))?;
            let key = key
                .trim()
                .parse()
                .map_err(|_| malformed(data, format!("invalid key '{}'", key)))?;
            let value = value
                .trim()
                .parse()
                .map_err(|_| malformed(data, format!("invalid value '{}'", value)))?;
            Ok((key, value))
        })
        .collect()
}

/// Parse per-line counts such as coverage hits (`"2=0;3=2"`)
pub fn parse_count_by_line(data: &str) -> Result<BTreeMap<u32, i64>> {
    let mut by_line = BTreeMap::new();
    for (line, count) in parse_pairs::<u32, i64>(data)? {
        if line == 0 {
            return Err(malformed(data, "line numbers start at 1"));
        }
        by_line.insert(line, count);
    }
    Ok(by_line)
}

/// Format pairs back to `k1=v1;k2=v2`
pub fn format_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(";")
}
