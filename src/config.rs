//! Fixed testbed description and pipeline constants.
//!
//! Everything here is static knowledge about the VM testbed: which addresses
//! belong to which guest, how hosts are grouped for display, and the tuning
//! constants of the analysis pipeline. It is bundled into one struct so tests
//! can substitute a synthetic topology instead of patching globals.

use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TestbedConfig {
    /// Endpoint address -> human host label (e.g. "10.0.2.101" -> "vm2").
    pub hostnames: BTreeMap<String, String>,

    /// Host label -> display group (e.g. "vm3" -> "VM2, VM3, VM4").
    pub host_groups: BTreeMap<String, String>,

    /// Congestion-control token -> display name (e.g. "cubic" -> "CUBIC").
    pub cong_names: BTreeMap<String, String>,

    /// Non-participating infrastructure host, always excluded from the
    /// source position of socket samples.
    pub bootstrap_host: String,

    /// SSH/management port; traffic on it is never experiment traffic.
    pub management_port: u16,

    /// Ping probe interval in seconds, used to reconstruct per-probe
    /// timestamps from sequence numbers.
    pub probe_interval: f64,

    /// A flow whose cwnd never reaches this value is a candidate control
    /// channel (see `table::flow::drop_control_flows`).
    pub cwnd_threshold: f64,

    /// Directory scanned for experiment logs.
    pub log_dir: PathBuf,
}

impl Default for TestbedConfig {
    fn default() -> Self {
        let hostnames = BTreeMap::from(
            [
                ("10.0.1.101", "vm1"),
                ("10.0.2.101", "vm2"),
                ("10.0.3.101", "vm3"),
                ("10.0.4.101", "vm4"),
            ]
            .map(|(a, h)| (a.to_string(), h.to_string())),
        );

        let host_groups = BTreeMap::from(
            [
                ("vm2", "VM2, VM3, VM4"),
                ("vm3", "VM2, VM3, VM4"),
                ("vm4", "VM2, VM3, VM4"),
                ("router1", "Router"),
            ]
            .map(|(h, g)| (h.to_string(), g.to_string())),
        );

        let cong_names = BTreeMap::from(
            [
                ("reno", "Reno"),
                ("cubic", "CUBIC"),
                ("lgc", "LGC"),
                ("lgcc", "LGCC"),
                ("dctcp", "DCTCP"),
                ("bbr", "BBR"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        Self {
            hostnames,
            host_groups,
            cong_names,
            bootstrap_host: "vm1".to_string(),
            management_port: 22,
            probe_interval: 0.1,
            cwnd_threshold: 20.0,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl TestbedConfig {
    /// Display name for a congestion-control token, falling back to the raw
    /// token for algorithms the table does not know.
    pub fn cong_display(&self, cong: &str) -> String {
        self.cong_names
            .get(cong)
            .cloned()
            .unwrap_or_else(|| cong.to_string())
    }

    /// Host label for an endpoint address. Unknown addresses keep the raw
    /// address as their label rather than being dropped.
    pub fn host_label(&self, addr: &str) -> String {
        self.hostnames
            .get(addr)
            .cloned()
            .unwrap_or_else(|| addr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cong_display_falls_back_to_token() {
        let cfg = TestbedConfig::default();
        assert_eq!(cfg.cong_display("cubic"), "CUBIC");
        assert_eq!(cfg.cong_display("vegas"), "vegas");
    }

    #[test]
    fn host_label_falls_back_to_address() {
        let cfg = TestbedConfig::default();
        assert_eq!(cfg.host_label("10.0.3.101"), "vm3");
        assert_eq!(cfg.host_label("192.168.0.9"), "192.168.0.9");
    }
}
