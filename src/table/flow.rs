//! Flow identity for socket-statistics rows, plus the control-flow drop.

use crate::table::{Payload, Sample};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A TCP flow, identified by its labeled endpoints.
///
/// Rendered as `src_host:src_port->dst_host:dst_port`; `FromStr` round-trips
/// that form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlowId {
    pub src_host: String,
    pub src_port: u16,
    pub dst_host: String,
    pub dst_port: u16,
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}:{}",
            self.src_host, self.src_port, self.dst_host, self.dst_port
        )
    }
}

impl FromStr for FlowId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (src, dst) = s
            .split_once("->")
            .ok_or_else(|| format!("flow id without '->': {s}"))?;
        let (src_host, src_port) = split_labeled_endpoint(src)?;
        let (dst_host, dst_port) = split_labeled_endpoint(dst)?;
        Ok(Self {
            src_host,
            src_port,
            dst_host,
            dst_port,
        })
    }
}

fn split_labeled_endpoint(s: &str) -> Result<(String, u16), String> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("endpoint without port: {s}"))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| format!("bad port in endpoint: {s}"))?;
    Ok((host.to_string(), port))
}

/// Split an `addr:port` endpoint string on the last colon. A missing or
/// non-numeric port yields `None`; the address part is always kept.
pub fn split_endpoint(s: &str) -> (String, Option<u16>) {
    let s = s.trim();
    match s.rsplit_once(':') {
        Some((addr, port)) => (addr.to_string(), port.parse::<u16>().ok()),
        None => (s.to_string(), None),
    }
}

/// Drop measurement-tool control channels.
///
/// Tools like iperf3 open a low-numbered control connection next to the data
/// connection. Within each (src_addr, dst_addr, congestion_control) group the
/// flow holding the lowest source port is taken to be that channel iff its
/// cwnd never reaches `threshold`. Flows to drop are decided in one pass over
/// the original groups and removed together, so re-applying the filter to its
/// own output removes nothing further in realistic data (data flows sit above
/// the threshold).
pub fn drop_control_flows(samples: &mut Vec<Sample>, threshold: f64) {
    // (src_addr, dst_addr, cong) -> src_port -> flow key -> max cwnd
    type GroupKey = (String, String, String);
    let mut groups: BTreeMap<GroupKey, BTreeMap<u16, BTreeMap<String, f64>>> = BTreeMap::new();

    for s in samples.iter() {
        let Payload::Socket(sock) = &s.payload else {
            continue;
        };
        let Some(flow) = &sock.flow_id else {
            continue;
        };
        let key = (
            sock.src_addr.clone(),
            sock.dst_addr.clone(),
            s.congestion_control.clone(),
        );
        let max_cwnd = groups
            .entry(key)
            .or_default()
            .entry(flow.src_port)
            .or_default()
            .entry(flow.to_string())
            .or_insert(f64::NEG_INFINITY);
        *max_cwnd = max_cwnd.max(sock.cwnd);
    }

    let mut drop: BTreeSet<(String, String)> = BTreeSet::new();
    for ((_, _, cong), by_port) in &groups {
        let Some((_, flows)) = by_port.iter().next() else {
            continue;
        };
        for (flow, max_cwnd) in flows {
            if *max_cwnd < threshold {
                drop.insert((cong.clone(), flow.clone()));
            }
        }
    }

    samples.retain(|s| match &s.payload {
        Payload::Socket(sock) => match &sock.flow_id {
            Some(flow) => !drop.contains(&(s.congestion_control.clone(), flow.to_string())),
            None => true,
        },
        _ => true,
    });
}
