//! Format parsers: one pure function per log kind, each turning a discovered
//! file into normalized samples. An `Err` from any of them means "skip this
//! file, keep going with the rest of the run" at the call site.

pub mod iperf3;
pub mod ping;
pub mod ss;

pub use ss::TimeMode;

use crate::locate::LogFileRef;
use crate::table::{Payload, Sample};

/// Stamp a payload with the provenance carried in the filename metadata.
fn sample(file: &LogFileRef, time: f64, payload: Payload) -> Sample {
    Sample {
        time,
        relative_time: 0.0,
        program: file.program().to_string(),
        congestion_control: file.congestion_control().to_string(),
        host: file.host().to_string(),
        payload,
    }
}
