//! Ping text parser: per-probe RTT samples.
//!
//! Ping logs carry no per-line wall-clock time, so probe timestamps are
//! reconstructed as `seq * probe_interval` seconds from an epoch-zero origin.
//! Group alignment later turns those into comparable relative times.

use crate::Result;
use crate::locate::LogFileRef;
use crate::table::{Payload, Sample};
use anyhow::Context;
use regex::Regex;
use std::fs;

/// Parse one ping log. Only reply lines (containing `bytes from` and matching
/// `seq=<int> ... time=<float> ms`) yield samples; everything else, including
/// the statistics footer, is ignored. Zero matches is a valid empty result.
pub fn parse_file(file: &LogFileRef, probe_interval: f64) -> Result<Vec<Sample>> {
    let text = fs::read_to_string(&file.path)
        .with_context(|| format!("read ping log {}", file.path.display()))?;

    let re = Regex::new(r"seq=(\d+).*time=([\d.]+) ms")?;

    let mut samples = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if !line.contains("bytes from") {
            continue;
        }
        let Some(caps) = re.captures(line) else {
            continue;
        };
        // Both groups are guaranteed digits by the pattern.
        let seq: u64 = caps[1].parse()?;
        let rtt_ms: f64 = caps[2].parse()?;

        samples.push(super::sample(
            file,
            seq as f64 * probe_interval,
            Payload::Rtt { seq, rtt_ms },
        ));
    }

    Ok(samples)
}
