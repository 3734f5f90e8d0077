use anyhow::bail;
use clap::{Parser, Subcommand};
use log::{info, warn};

mod config;
mod locate;
mod parse;
mod render;
mod stats;
mod table;

use config::TestbedConfig;
use locate::LogFileRef;
use stats::{GroupKey, Value, Window};
use table::RunTable;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "testbed-viz")]
#[command(about = "Comparison charts from congestion-control testbed logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Throughput comparison from iperf3 JSON logs.
    Iperf3 {
        /// Run to analyze (YYYYMMDDHHMMSS); defaults to the most recent run.
        #[arg(short = 't', long)]
        timestamp: Option<String>,
    },
    /// Round-trip-time comparison from ping logs.
    Ping {
        /// Run to analyze (YYYYMMDDHHMMSS); defaults to the most recent run.
        #[arg(short = 't', long)]
        timestamp: Option<String>,
    },
    /// Congestion-window comparison from `ss` CSV logs.
    Ss {
        /// Run to analyze (YYYYMMDDHHMMSS); defaults to the most recent run.
        #[arg(short = 't', long)]
        timestamp: Option<String>,
    },
    /// Static diagram of the testbed topology.
    Topology,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let cfg = TestbedConfig::default();

    match cli.cmd {
        Commands::Iperf3 { timestamp } => iperf3_chart(&cfg, timestamp.as_deref()),
        Commands::Ping { timestamp } => ping_chart(&cfg, timestamp.as_deref()),
        Commands::Ss { timestamp } => ss_chart(&cfg, timestamp.as_deref()),
        Commands::Topology => render::emit("topology", &render::topology::render()?),
    }
}

/// Pick the run to analyze and keep only the files the given program wrote.
/// Ping and `ss` logs share the `.log` extension, so the program token in the
/// filename decides which parser a file belongs to.
fn select_run(
    cfg: &TestbedConfig,
    ext: &str,
    program: &str,
    target: Option<&str>,
) -> Result<(String, Vec<LogFileRef>)> {
    let runs = locate::logs_by_timestamp(&cfg.log_dir, ext, target)?;
    let (stamp, files) = locate::latest_run(runs, ext)?;
    let files: Vec<LogFileRef> = files
        .into_iter()
        .filter(|f| f.program() == program)
        .collect();
    if files.is_empty() {
        bail!("run {stamp} has no {program} logs");
    }
    info!("run {stamp}: {} {program} log(s)", files.len());
    Ok((stamp, files))
}

/// Parse every file of the run, skipping malformed ones. Zero usable samples
/// across the whole run is fatal.
fn parse_run<F>(stamp: &str, files: &[LogFileRef], mut parse: F) -> Result<Vec<table::Sample>>
where
    F: FnMut(&LogFileRef) -> Result<Vec<table::Sample>>,
{
    let mut samples = Vec::new();
    for file in files {
        match parse(file) {
            Ok(mut parsed) => samples.append(&mut parsed),
            Err(err) => warn!("skipping {}: {err:#}", file.basename),
        }
    }
    if samples.is_empty() {
        bail!("run {stamp} yielded no usable samples");
    }
    Ok(samples)
}

/// Log descriptive statistics over the default reporting window: the overlap
/// of per-group relative-time ranges, so every group contributes the complete
/// window.
fn report_stats(table: &RunTable, value: Value, window_key: GroupKey, group_by: &[GroupKey]) {
    let Some(window) = Window::overlap_by(table, window_key) else {
        warn!("no common time window across groups, skipping statistics");
        return;
    };
    let rows = stats::interval_stats(table, value, &window, group_by);
    for (keys, descriptive) in rows {
        info!("{value:?} {window} {}: {descriptive}", keys.join(" / "));
    }
}

fn iperf3_chart(cfg: &TestbedConfig, target: Option<&str>) -> Result<()> {
    let (stamp, files) = select_run(cfg, "json", "iperf3", target)?;
    let samples = parse_run(&stamp, &files, parse::iperf3::parse_file)?;

    let mut table = RunTable::from_samples(samples);
    table.align();

    report_stats(
        &table,
        Value::BitsPerSecond,
        GroupKey::CongestionControl,
        &[
            GroupKey::CongestionControl,
            GroupKey::Host,
            GroupKey::Direction,
        ],
    );
    render::emit("iperf3", &render::throughput::render(&table, cfg)?)
}

fn ping_chart(cfg: &TestbedConfig, target: Option<&str>) -> Result<()> {
    let (stamp, files) = select_run(cfg, "log", "ping", target)?;
    let samples = parse_run(&stamp, &files, |f| {
        parse::ping::parse_file(f, cfg.probe_interval)
    })?;

    let mut table = RunTable::from_samples(samples);
    // The bootstrap host does not participate in the experiment traffic.
    table.samples.retain(|s| s.host != cfg.bootstrap_host);
    if table.is_empty() {
        bail!("run {stamp} yielded no usable samples");
    }
    table.align();

    report_stats(
        &table,
        Value::RttMs,
        GroupKey::CongestionControl,
        &[GroupKey::CongestionControl, GroupKey::Host],
    );
    render::emit("ping", &render::rtt::render(&table, cfg)?)
}

fn ss_chart(cfg: &TestbedConfig, target: Option<&str>) -> Result<()> {
    let (stamp, files) = select_run(cfg, "log", "ss", target)?;
    // Flow-level cwnd traces need the capture's full time precision; the
    // floor-to-second mode exists for coarse side-by-side displays.
    let samples = parse_run(&stamp, &files, |f| {
        parse::ss::parse_file(f, parse::TimeMode::Full)
    })?;

    let mut table = RunTable::from_samples(samples);
    table.samples.retain(|s| s.host != cfg.bootstrap_host);
    table.normalize_sockets(cfg);
    if table.is_empty() {
        bail!("run {stamp} yielded no usable samples");
    }
    table.align();

    report_stats(
        &table,
        Value::Cwnd,
        GroupKey::CongestionControl,
        &[GroupKey::CongestionControl, GroupKey::HostGroup],
    );
    render::emit("ss", &render::cwnd::render(&table, cfg)?)
}
