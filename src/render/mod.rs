//! Chart rendering and emission.
//!
//! The analysis core hands a normalized [`RunTable`](crate::table::RunTable)
//! to the chart modules here; everything below this line is presentation.
//! Charts are rendered to SVG in memory and emitted in one of two modes: when
//! stdout is an interactive terminal the chart is saved next to the logs,
//! otherwise the bytes stream to stdout so the tool can sit in a pipe.

pub mod cwnd;
pub mod rtt;
pub mod throughput;
pub mod topology;

use crate::Result;
use anyhow::Context;
use log::info;
use plotters::style::RGBColor;
use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};
use std::ops::Range;

/// Write the chart to `plot_<name>.svg` (interactive) or stdout (piped).
pub fn emit(name: &str, svg: &str) -> Result<()> {
    if std::io::stdout().is_terminal() {
        let path = format!("plot_{name}.svg");
        std::fs::write(&path, svg).with_context(|| format!("write {path}"))?;
        info!("wrote {path}");
    } else {
        std::io::stdout()
            .write_all(svg.as_bytes())
            .context("write chart to stdout")?;
    }
    Ok(())
}

const PALETTE: [RGBColor; 6] = [
    RGBColor(0x1f, 0x4e, 0x79),
    RGBColor(0x2e, 0x86, 0x6d),
    RGBColor(0x6b, 0xa3, 0x68),
    RGBColor(0xc9, 0x7b, 0x2d),
    RGBColor(0x8c, 0x56, 0x4a),
    RGBColor(0x5c, 0x5c, 0x8a),
];

/// Deterministic color per key: sorted key order indexes a fixed palette, so
/// the same host or flow pair keeps its color across panels and charts.
pub(crate) fn color_map<I>(keys: I) -> BTreeMap<String, RGBColor>
where
    I: IntoIterator<Item = String>,
{
    let sorted: std::collections::BTreeSet<String> = keys.into_iter().collect();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, k)| (k, PALETTE[i % PALETTE.len()]))
        .collect()
}

/// Collapse (relative_time, value) points into one-second buckets of
/// (second, mean, min, max), ordered by time.
pub(crate) fn per_second_stats<I>(points: I) -> Vec<(f64, f64, f64, f64)>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (t, v) in points {
        buckets.entry(t.floor() as i64).or_default().push(v);
    }
    buckets
        .into_iter()
        .map(|(sec, vs)| {
            let mean = vs.iter().sum::<f64>() / vs.len() as f64;
            let min = vs.iter().copied().fold(f64::INFINITY, f64::min);
            let max = vs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (sec as f64, mean, min, max)
        })
        .collect()
}

/// Pad a data range for axis limits; degenerate ranges get a unit span so
/// plotters always receives a non-empty axis.
pub(crate) fn pad_range(lo: f64, hi: f64) -> Range<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if hi <= lo {
        return lo..lo + 1.0;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}
