// Count series built from raw payload records

use crate::error::{CounterError, Result};
use ecocount_scanner::{Timestamp, parse_timestamp};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;
use tracing::warn;

/// One `{timestamp, traffic: {counts}}` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub timestamp: Timestamp,
    pub counts: u64,
}

#[derive(Deserialize)]
struct RawRecord {
    timestamp: String,
    traffic: RawTraffic,
}

#[derive(Deserialize)]
struct RawTraffic {
    counts: u64,
}

impl Record {
    /// Reads one record, rejecting missing fields, negative or fractional
    /// counts and unparseable timestamps.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawRecord::deserialize(value)
            .map_err(|e| CounterError::MalformedRecord(format!("{}: {}", e, value)))?;
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| {
            CounterError::MalformedRecord(format!("bad timestamp '{}'", raw.timestamp))
        })?;

        Ok(Self {
            timestamp,
            counts: raw.traffic.counts,
        })
    }
}

/// Counts keyed and ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    points: BTreeMap<Timestamp, u64>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a point; an existing timestamp is overwritten.
    pub fn insert(&mut self, timestamp: Timestamp, counts: u64) {
        self.points.insert(timestamp, counts);
    }

    pub fn get(&self, timestamp: &Timestamp) -> Option<u64> {
        self.points.get(timestamp).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Timestamp, u64> {
        self.points.iter()
    }

    pub fn total(&self) -> u64 {
        self.points.values().sum()
    }
}

impl FromIterator<(Timestamp, u64)> for Series {
    fn from_iter<I: IntoIterator<Item = (Timestamp, u64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = (&'a Timestamp, &'a u64);
    type IntoIter = btree_map::Iter<'a, Timestamp, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Builds a series from raw records.
///
/// Malformed records are logged and skipped; the rest of the batch is kept.
/// A later record with the same timestamp replaces an earlier one.
pub fn build_series(records: &[Value]) -> Series {
    let mut series = Series::new();
    let mut skipped = 0usize;

    for value in records {
        match Record::from_value(value) {
            Ok(record) => series.insert(record.timestamp, record.counts),
            Err(e) => {
                skipped += 1;
                warn!("Skipping record: {}", e);
            }
        }
    }

    if skipped > 0 {
        warn!(
            "Skipped {} of {} records while building series",
            skipped,
            records.len()
        );
    }

    series
}
