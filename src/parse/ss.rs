//! `ss` socket-statistics CSV parser.

use crate::Result;
use crate::locate::LogFileRef;
use crate::table::{Payload, Sample, SocketSample};
use anyhow::{Context, bail};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

/// Timestamp granularity of the produced samples.
///
/// Coarse one-second buckets suit side-by-side display (samples from
/// different hosts collapse onto shared ticks); flow-level analysis needs the
/// full capture precision. Both consumers exist, so the caller chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    FloorSeconds,
    Full,
}

#[derive(Debug, Deserialize)]
struct Row {
    time: String,
    source: String,
    destination: String,
    cwnd: f64,
    #[serde(default)]
    rtt: Option<f64>,
    #[serde(default)]
    ssthresh: Option<f64>,
}

/// Parse one `ss` CSV log. The header row must provide at least `time`,
/// `source`, `destination` and `cwnd`; extra columns are ignored, and the
/// optional TCP counters are carried when present. Any row-level failure
/// fails the whole file, which the caller logs and skips.
pub fn parse_file(file: &LogFileRef, mode: TimeMode) -> Result<Vec<Sample>> {
    let mut reader = csv::Reader::from_path(&file.path)
        .with_context(|| format!("read ss log {}", file.path.display()))?;

    let mut samples = Vec::new();
    for (idx, record) in reader.deserialize::<Row>().enumerate() {
        let row = record.with_context(|| format!("{}: bad CSV row {}", file.basename, idx + 1))?;
        let time = parse_time(row.time.trim())
            .with_context(|| format!("{}: bad time in row {}", file.basename, idx + 1))?;
        let time = match mode {
            TimeMode::FloorSeconds => time.floor(),
            TimeMode::Full => time,
        };

        let mut sock = SocketSample::new(row.source, row.destination, row.cwnd);
        sock.rtt_ms = row.rtt;
        sock.ssthresh = row.ssthresh;
        samples.push(super::sample(file, time, Payload::Socket(sock)));
    }

    Ok(samples)
}

/// Accepts RFC 3339, naive `YYYY-MM-DD HH:MM:SS[.frac]` (space or `T`
/// separated), or a plain epoch-seconds number.
fn parse_time(s: &str) -> Result<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_micros() as f64 / 1e6);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc().timestamp_micros() as f64 / 1e6);
        }
    }
    if let Ok(secs) = s.parse::<f64>() {
        return Ok(secs);
    }
    bail!("unrecognized timestamp: {s:?}")
}
