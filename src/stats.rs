//! Descriptive interval statistics over the normalized run table.

use crate::table::{Payload, RunTable, Sample};
use log::warn;
use std::collections::BTreeMap;
use std::fmt;

/// Which payload field to aggregate. Rows of other kinds are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    BitsPerSecond,
    RttMs,
    Cwnd,
}

impl Value {
    fn extract(&self, sample: &Sample) -> Option<f64> {
        match (self, &sample.payload) {
            (Value::BitsPerSecond, Payload::Throughput { bits_per_second, .. }) => {
                Some(*bits_per_second)
            }
            (Value::RttMs, Payload::Rtt { rtt_ms, .. }) => Some(*rtt_ms),
            (Value::Cwnd, Payload::Socket(sock)) => Some(sock.cwnd),
            _ => None,
        }
    }
}

/// Grouping column for the statistics (and for window overlap computation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Program,
    CongestionControl,
    Host,
    HostGroup,
    /// Sender vs. receiver side of a throughput sample.
    Direction,
    Flow,
}

impl GroupKey {
    fn extract(&self, sample: &Sample) -> Option<String> {
        match self {
            GroupKey::Program => Some(sample.program.clone()),
            GroupKey::CongestionControl => Some(sample.congestion_control.clone()),
            GroupKey::Host => Some(sample.host.clone()),
            GroupKey::HostGroup => match &sample.payload {
                Payload::Socket(sock) => sock.host_group.clone(),
                _ => None,
            },
            GroupKey::Direction => match &sample.payload {
                Payload::Throughput { sender, .. } => {
                    Some(if *sender { "sender" } else { "receiver" }.to_string())
                }
                _ => None,
            },
            GroupKey::Flow => match &sample.payload {
                Payload::Socket(sock) => sock.flow_id.as_ref().map(|f| f.to_string()),
                _ => None,
            },
        }
    }
}

/// Inclusive window over `relative_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub lo: f64,
    pub hi: f64,
}

impl Window {
    pub fn contains(&self, t: f64) -> bool {
        self.lo <= t && t <= self.hi
    }

    /// The default reporting window: the overlap of per-group relative-time
    /// ranges, i.e. from the latest group start to the earliest group end.
    ///
    /// Using the overlap instead of the full data extent means every group
    /// contributes the complete window, at the cost of silently shrinking it
    /// relative to the data. `None` when the table is empty or the group
    /// ranges do not intersect.
    pub fn overlap_by(table: &RunTable, key: GroupKey) -> Option<Window> {
        let mut ranges: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for s in &table.samples {
            let Some(group) = key.extract(s) else {
                continue;
            };
            let range = ranges
                .entry(group)
                .or_insert((s.relative_time, s.relative_time));
            range.0 = range.0.min(s.relative_time);
            range.1 = range.1.max(s.relative_time);
        }

        let lo = ranges.values().map(|r| r.0).fold(f64::NEG_INFINITY, f64::max);
        let hi = ranges.values().map(|r| r.1).fold(f64::INFINITY, f64::min);
        (!ranges.is_empty() && lo <= hi).then_some(Window { lo, hi })
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.lo, self.hi)
    }
}

/// count/mean/std/min/max, rounded to two decimals. `std` is the sample
/// standard deviation and absent below two observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptive {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl Descriptive {
    fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            round2((ss / (count - 1) as f64).sqrt())
        });
        Self {
            count,
            mean: round2(mean),
            std,
            min: round2(values.iter().copied().fold(f64::INFINITY, f64::min)),
            max: round2(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        }
    }
}

impl fmt::Display for Descriptive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "count={} mean={:.2} std={} min={:.2} max={:.2}",
            self.count,
            self.mean,
            self.std.map_or("-".to_string(), |s| format!("{s:.2}")),
            self.min,
            self.max
        )
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Descriptive statistics of `value` over rows whose `relative_time` falls in
/// `window`, one result per distinct group-key tuple (or a single result
/// under the empty tuple when `group_by` is empty).
///
/// Rows lacking the value column or any grouping key are skipped silently.
/// An empty result is returned, with a diagnostic, when nothing qualifies;
/// callers must handle it before indexing.
pub fn interval_stats(
    table: &RunTable,
    value: Value,
    window: &Window,
    group_by: &[GroupKey],
) -> Vec<(Vec<String>, Descriptive)> {
    let mut buckets: BTreeMap<Vec<String>, Vec<f64>> = BTreeMap::new();
    for s in &table.samples {
        if !window.contains(s.relative_time) {
            continue;
        }
        let Some(v) = value.extract(s) else {
            continue;
        };
        let keys: Option<Vec<String>> = group_by.iter().map(|k| k.extract(s)).collect();
        let Some(keys) = keys else {
            continue;
        };
        buckets.entry(keys).or_default().push(v);
    }

    if buckets.is_empty() {
        warn!("no samples in window {window} for {value:?}");
        return Vec::new();
    }

    buckets
        .into_iter()
        .map(|(keys, values)| (keys, Descriptive::from_values(&values)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::rtt_sample;
    use pretty_assertions::assert_eq;

    fn aligned(samples: Vec<Sample>) -> RunTable {
        let mut table = RunTable::from_samples(samples);
        table.align();
        table
    }

    #[test]
    fn ungrouped_stats_over_window() {
        let table = aligned(vec![
            rtt_sample(0.0, "cubic", "vm2", 0, 10.0),
            rtt_sample(1.0, "cubic", "vm2", 1, 14.0),
            rtt_sample(2.0, "cubic", "vm2", 2, 12.0),
            rtt_sample(9.0, "cubic", "vm2", 3, 99.0),
        ]);
        let out = interval_stats(&table, Value::RttMs, &Window { lo: 0.0, hi: 2.0 }, &[]);
        assert_eq!(out.len(), 1);
        let (keys, stats) = &out[0];
        assert!(keys.is_empty());
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 12.0);
        assert_eq!(stats.std, Some(2.0));
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 14.0);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let table = aligned(vec![
            rtt_sample(0.0, "cubic", "vm2", 0, 10.0),
            rtt_sample(2.0, "cubic", "vm2", 2, 12.0),
        ]);
        let out = interval_stats(&table, Value::RttMs, &Window { lo: 0.0, hi: 2.0 }, &[]);
        assert_eq!(out[0].1.count, 2);
    }

    #[test]
    fn grouped_stats_produce_one_row_per_key() {
        let table = aligned(vec![
            rtt_sample(0.0, "cubic", "vm2", 0, 10.0),
            rtt_sample(0.5, "cubic", "vm3", 0, 20.0),
            rtt_sample(1.0, "cubic", "vm2", 1, 30.0),
        ]);
        let out = interval_stats(
            &table,
            Value::RttMs,
            &Window { lo: 0.0, hi: 10.0 },
            &[GroupKey::Host],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, vec!["vm2".to_string()]);
        assert_eq!(out[0].1.count, 2);
        assert_eq!(out[1].0, vec!["vm3".to_string()]);
        assert_eq!(out[1].1.count, 1);
        assert_eq!(out[1].1.std, None);
    }

    #[test]
    fn empty_window_returns_empty_not_error() {
        let table = aligned(vec![rtt_sample(0.0, "cubic", "vm2", 0, 10.0)]);
        let out = interval_stats(
            &table,
            Value::RttMs,
            &Window { lo: 100.0, hi: 200.0 },
            &[GroupKey::Host],
        );
        assert!(out.is_empty());
    }

    #[test]
    fn overlap_window_spans_latest_start_to_earliest_end() {
        // vm2 covers [0, 10]; vm3 covers [2, 8] (within its own group the
        // relative times start at 0, so use one congestion control and two
        // hosts offset inside it).
        let table = aligned(vec![
            rtt_sample(100.0, "cubic", "vm2", 0, 1.0),
            rtt_sample(110.0, "cubic", "vm2", 1, 1.0),
            rtt_sample(102.0, "cubic", "vm3", 0, 1.0),
            rtt_sample(108.0, "cubic", "vm3", 1, 1.0),
        ]);
        let window = Window::overlap_by(&table, GroupKey::Host).unwrap();
        assert_eq!(window, Window { lo: 2.0, hi: 8.0 });
    }

    #[test]
    fn disjoint_group_ranges_have_no_overlap_window() {
        let table = aligned(vec![
            rtt_sample(100.0, "cubic", "vm2", 0, 1.0),
            rtt_sample(101.0, "cubic", "vm2", 1, 1.0),
            rtt_sample(105.0, "cubic", "vm3", 0, 1.0),
            rtt_sample(106.0, "cubic", "vm3", 1, 1.0),
        ]);
        assert_eq!(Window::overlap_by(&table, GroupKey::Host), None);
    }

    #[test]
    fn overlap_of_empty_table_is_none() {
        let table = RunTable::default();
        assert_eq!(Window::overlap_by(&table, GroupKey::Host), None);
    }
}
