//! The normalized run table: every parser feeds into `Sample`, and all
//! alignment, filtering and statistics operate on this one shape.

pub mod flow;

pub use flow::FlowId;

use crate::config::TestbedConfig;
use std::collections::BTreeMap;

/// One normalized observation. `time` is absolute epoch seconds;
/// `relative_time` is filled in by [`RunTable::align`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub relative_time: f64,
    pub program: String,
    pub congestion_control: String,
    pub host: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Throughput { bits_per_second: f64, sender: bool },
    Rtt { seq: u64, rtt_ms: f64 },
    Socket(SocketSample),
}

/// A socket-statistics row. The endpoint strings come straight from the CSV;
/// the remaining fields are derived during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketSample {
    pub source: String,
    pub destination: String,
    pub cwnd: f64,
    pub rtt_ms: Option<f64>,
    pub ssthresh: Option<f64>,

    pub src_addr: String,
    pub src_port: Option<u16>,
    pub dst_addr: String,
    pub dst_port: Option<u16>,
    pub src_host: String,
    pub dst_host: String,
    pub host_group: Option<String>,
    pub flow_id: Option<FlowId>,
}

impl SocketSample {
    pub fn new(source: String, destination: String, cwnd: f64) -> Self {
        Self {
            source,
            destination,
            cwnd,
            rtt_ms: None,
            ssthresh: None,
            src_addr: String::new(),
            src_port: None,
            dst_addr: String::new(),
            dst_port: None,
            src_host: String::new(),
            dst_host: String::new(),
            host_group: None,
            flow_id: None,
        }
    }

    /// "vm2–vm3" style pair label used for chart coloring.
    pub fn src_dest(&self) -> String {
        format!("{}\u{2013}{}", self.src_host, self.dst_host)
    }
}

/// All samples of one run, sorted by absolute time.
#[derive(Debug, Clone, Default)]
pub struct RunTable {
    pub samples: Vec<Sample>,
}

impl RunTable {
    pub fn from_samples(mut samples: Vec<Sample>) -> Self {
        // Stable: ties keep their original (per-file) order.
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Socket normalization: endpoint splitting, management-traffic and
    /// bootstrap-host exclusion, host/group labeling, flow identity, and the
    /// control-flow drop. Every filter here is a silent row drop; data-shape
    /// anomalies never abort the run. Non-socket samples pass through
    /// untouched.
    pub fn normalize_sockets(&mut self, cfg: &TestbedConfig) {
        self.split_endpoints();
        self.drop_management_traffic(cfg.management_port);
        self.label_hosts(cfg);
        self.label_host_groups(cfg);
        self.derive_flow_ids();
        flow::drop_control_flows(&mut self.samples, cfg.cwnd_threshold);
    }

    /// Per-group time alignment: within each congestion-control group,
    /// `relative_time` counts seconds from the group's earliest sample.
    ///
    /// Groups are anchored independently because trials for different
    /// algorithms run concurrently; a global minimum would skew every group
    /// but the earliest one. Run this after all row filters so each group
    /// minimum is exactly zero in the final table.
    pub fn align(&mut self) {
        let mut group_start: BTreeMap<&str, f64> = BTreeMap::new();
        for s in &self.samples {
            group_start
                .entry(s.congestion_control.as_str())
                .and_modify(|m| *m = m.min(s.time))
                .or_insert(s.time);
        }
        let group_start: BTreeMap<String, f64> = group_start
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        for s in &mut self.samples {
            s.relative_time = s.time - group_start[&s.congestion_control];
        }
    }

    fn split_endpoints(&mut self) {
        for s in &mut self.samples {
            if let Payload::Socket(sock) = &mut s.payload {
                let (src_addr, src_port) = flow::split_endpoint(&sock.source);
                let (dst_addr, dst_port) = flow::split_endpoint(&sock.destination);
                sock.src_addr = src_addr;
                sock.src_port = src_port;
                sock.dst_addr = dst_addr;
                sock.dst_port = dst_port;
            }
        }
    }

    fn drop_management_traffic(&mut self, port: u16) {
        self.samples.retain(|s| match &s.payload {
            Payload::Socket(sock) => {
                sock.src_port != Some(port) && sock.dst_port != Some(port)
            }
            _ => true,
        });
    }

    /// Map addresses to host labels (unknown addresses keep the raw address)
    /// and drop rows originating from the bootstrap host.
    fn label_hosts(&mut self, cfg: &TestbedConfig) {
        for s in &mut self.samples {
            if let Payload::Socket(sock) = &mut s.payload {
                sock.src_host = cfg.host_label(&sock.src_addr);
                sock.dst_host = cfg.host_label(&sock.dst_addr);
            }
        }
        self.samples.retain(|s| match &s.payload {
            Payload::Socket(sock) => sock.src_host != cfg.bootstrap_host,
            _ => true,
        });
    }

    /// Attach the display group of the capturing host; rows captured on a
    /// host with no group mapping are dropped.
    fn label_host_groups(&mut self, cfg: &TestbedConfig) {
        for s in &mut self.samples {
            if let Payload::Socket(sock) = &mut s.payload {
                sock.host_group = cfg.host_groups.get(&s.host).cloned();
            }
        }
        self.samples.retain(|s| match &s.payload {
            Payload::Socket(sock) => sock.host_group.is_some(),
            _ => true,
        });
    }

    fn derive_flow_ids(&mut self) {
        for s in &mut self.samples {
            if let Payload::Socket(sock) = &mut s.payload {
                sock.flow_id = match (sock.src_port, sock.dst_port) {
                    (Some(sp), Some(dp)) => Some(FlowId {
                        src_host: sock.src_host.clone(),
                        src_port: sp,
                        dst_host: sock.dst_host.clone(),
                        dst_port: dp,
                    }),
                    // Unparsable ports propagate as missing identity.
                    _ => None,
                };
            }
        }
    }
}
