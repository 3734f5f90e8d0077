//! iperf3 JSON parser: per-interval throughput samples.

use crate::Result;
use crate::locate::LogFileRef;
use crate::table::{Payload, Sample};
use anyhow::{Context, bail};
use log::warn;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct Document {
    start: Start,
    intervals: Vec<Interval>,
}

#[derive(Debug, Deserialize)]
struct Start {
    timestamp: StartTimestamp,
}

#[derive(Debug, Deserialize)]
struct StartTimestamp {
    timesecs: i64,
}

#[derive(Debug, Deserialize)]
struct Interval {
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    start: f64,
    bits_per_second: f64,
    sender: bool,
}

/// Parse one iperf3 JSON log. Each interval yields one sample at
/// `timesecs + streams[0].start`, floored to whole seconds so samples from
/// different hosts land in the same one-second bucket.
///
/// Only the first stream per interval is read. Multi-stream captures are not
/// supported; extra streams are reported, never averaged in silently.
pub fn parse_file(file: &LogFileRef) -> Result<Vec<Sample>> {
    let text = fs::read_to_string(&file.path)
        .with_context(|| format!("read iperf3 log {}", file.path.display()))?;
    let doc: Document = serde_json::from_str(&text)
        .with_context(|| format!("malformed JSON in {}", file.basename))?;

    let epoch = doc.start.timestamp.timesecs as f64;
    let mut samples = Vec::with_capacity(doc.intervals.len());
    for (idx, interval) in doc.intervals.iter().enumerate() {
        if interval.streams.len() > 1 {
            warn!(
                "{}: interval {} has {} streams, only the first is used",
                file.basename,
                idx,
                interval.streams.len()
            );
        }
        let Some(stream) = interval.streams.first() else {
            bail!("{}: interval {} has no streams", file.basename, idx);
        };

        samples.push(super::sample(
            file,
            (epoch + stream.start).floor(),
            Payload::Throughput {
                bits_per_second: stream.bits_per_second,
                sender: stream.sender,
            },
        ));
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture(name: &str, contents: &str) -> LogFileRef {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("testbed-viz-iperf3-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write fixture");
        LogFileRef::from_path(path).expect("fixture path")
    }

    #[test]
    fn interval_yields_sample_at_epoch_plus_offset() {
        let file = fixture(
            "20240101000000_iperf3_cubic_vm2.json",
            r#"{
                "start": { "timestamp": { "timesecs": 1000 } },
                "intervals": [
                    { "streams": [ { "start": 2.0, "bits_per_second": 5000000.0, "sender": true } ] }
                ]
            }"#,
        );
        let samples = parse_file(&file).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].time, 1002.0);
        assert_eq!(samples[0].congestion_control, "cubic");
        assert_eq!(samples[0].host, "vm2");
        assert_eq!(
            samples[0].payload,
            Payload::Throughput {
                bits_per_second: 5_000_000.0,
                sender: true
            }
        );
    }

    #[test]
    fn fractional_offsets_floor_into_second_buckets() {
        let file = fixture(
            "20240101000000_iperf3_cubic_vm2.json",
            r#"{
                "start": { "timestamp": { "timesecs": 1000 } },
                "intervals": [
                    { "streams": [ { "start": 0.99, "bits_per_second": 1.0, "sender": false } ] },
                    { "streams": [ { "start": 1.01, "bits_per_second": 2.0, "sender": false } ] }
                ]
            }"#,
        );
        let samples = parse_file(&file).unwrap();
        assert_eq!(samples[0].time, 1000.0);
        assert_eq!(samples[1].time, 1001.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let file = fixture("20240101000000_iperf3_cubic_vm2.json", "{ not json");
        assert!(parse_file(&file).is_err());
    }

    #[test]
    fn interval_without_streams_is_an_error() {
        let file = fixture(
            "20240101000000_iperf3_cubic_vm2.json",
            r#"{ "start": { "timestamp": { "timesecs": 1000 } }, "intervals": [ { "streams": [] } ] }"#,
        );
        assert!(parse_file(&file).is_err());
    }
}
