use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "testbed-viz-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(dir.join("logs")).expect("create temp log dir");
    dir
}

fn write_log(dir: &PathBuf, name: &str, contents: &str) {
    fs::write(dir.join("logs").join(name), contents).expect("write log fixture");
}

fn run(dir: &PathBuf, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_testbed-viz"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn testbed-viz")
}

const IPERF3_DOC: &str = r#"{
    "start": { "timestamp": { "timesecs": 1700000000 } },
    "intervals": [
        { "streams": [ { "start": 0.0, "bits_per_second": 4000000.0, "sender": true } ] },
        { "streams": [ { "start": 1.0, "bits_per_second": 5000000.0, "sender": true } ] },
        { "streams": [ { "start": 2.0, "bits_per_second": 6000000.0, "sender": true } ] }
    ]
}"#;

#[test]
fn iperf3_pipeline_streams_svg_when_piped() {
    let dir = unique_temp_dir("iperf3");
    write_log(&dir, "20240101000000_iperf3_cubic_vm2.json", IPERF3_DOC);

    let output = run(&dir, &["iperf3"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<svg"), "expected SVG on stdout");
}

#[test]
fn empty_log_directory_is_a_fatal_error() {
    let dir = unique_temp_dir("empty");

    let output = run(&dir, &["iperf3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no .json logs"), "stderr: {stderr}");
}

#[test]
fn malformed_file_is_skipped_but_all_malformed_run_is_fatal() {
    let dir = unique_temp_dir("malformed");
    write_log(&dir, "20240101000000_iperf3_cubic_vm2.json", "{ not json");
    write_log(&dir, "20240101000000_iperf3_cubic_vm3.json", IPERF3_DOC);

    // One good file keeps the run alive.
    let output = run(&dir, &["iperf3"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    // A run with only malformed files dies with a diagnostic.
    let dir = unique_temp_dir("all-malformed");
    write_log(&dir, "20240101000000_iperf3_cubic_vm2.json", "{ not json");
    let output = run(&dir, &["iperf3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no usable samples"), "stderr: {stderr}");
}

#[test]
fn timestamp_flag_selects_the_named_run() {
    let dir = unique_temp_dir("target-run");
    write_log(&dir, "20240101000000_iperf3_cubic_vm2.json", IPERF3_DOC);
    write_log(&dir, "20240102000000_iperf3_cubic_vm2.json", "{ broken");

    // Default picks the most recent run, which has no usable data.
    let output = run(&dir, &["iperf3"]);
    assert!(!output.status.success());

    // Naming the older run succeeds.
    let output = run(&dir, &["iperf3", "-t", "20240101000000"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("<svg"));
}

#[test]
fn ping_pipeline_streams_svg_when_piped() {
    let dir = unique_temp_dir("ping");
    write_log(
        &dir,
        "20240101000000_ping_cubic_vm2.log",
        "PING 10.0.3.101 (10.0.3.101) 56(84) bytes of data.\n\
         64 bytes from 10.0.3.101: icmp_seq=1 ttl=64 time=10.1 ms\n\
         64 bytes from 10.0.3.101: icmp_seq=2 ttl=64 time=11.5 ms\n\
         64 bytes from 10.0.3.101: icmp_seq=3 ttl=64 time=9.8 ms\n",
    );

    let output = run(&dir, &["ping"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("<svg"));
}

#[test]
fn ping_run_without_reply_lines_is_fatal() {
    let dir = unique_temp_dir("ping-empty");
    write_log(
        &dir,
        "20240101000000_ping_cubic_vm2.log",
        "--- 10.0.3.101 ping statistics ---\n",
    );

    let output = run(&dir, &["ping"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no usable samples"), "stderr: {stderr}");
}

#[test]
fn ss_pipeline_filters_and_streams_svg() {
    let dir = unique_temp_dir("ss");
    write_log(
        &dir,
        "20240101000000_ss_cubic_vm2.log",
        "time,source,destination,cwnd\n\
         2024-01-01 00:00:00.0,10.0.2.101:45002,10.0.3.101:5201,80\n\
         2024-01-01 00:00:01.0,10.0.2.101:45002,10.0.3.101:5201,120\n\
         2024-01-01 00:00:00.5,10.0.2.101:45900,10.0.3.101:22,40\n",
    );

    let output = run(&dir, &["ss"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("<svg"));
}

#[test]
fn ss_run_selection_ignores_ping_logs_sharing_the_extension() {
    let dir = unique_temp_dir("ss-vs-ping");
    write_log(
        &dir,
        "20240101000000_ping_cubic_vm2.log",
        "64 bytes from 10.0.3.101: icmp_seq=1 ttl=64 time=10.1 ms\n",
    );

    // The run exists but holds no ss logs.
    let output = run(&dir, &["ss"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no ss logs"), "stderr: {stderr}");
}

#[test]
fn topology_diagram_streams_svg_when_piped() {
    let dir = unique_temp_dir("topology");

    let output = run(&dir, &["topology"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("<svg"));
}
