//! Log discovery: group experiment files into runs by the timestamp encoded
//! in their filenames.
//!
//! Files are named `<YYYYMMDDHHMMSS>_<program>_<congestion_control>[..]_<host>.<ext>`.
//! All files sharing one leading timestamp belong to the same run.

use crate::Result;
use anyhow::{Context, bail};
use chrono::NaiveDateTime;
use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One discovered log file plus the metadata tokens from its basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileRef {
    pub path: PathBuf,
    pub basename: String,
    pub metadata: Vec<String>,
}

impl LogFileRef {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let basename = path.file_stem()?.to_str()?.to_string();
        let metadata = basename.split('_').map(str::to_string).collect();
        Some(Self {
            path,
            basename,
            metadata,
        })
    }

    pub fn timestamp(&self) -> &str {
        &self.metadata[0]
    }

    pub fn program(&self) -> &str {
        self.metadata.get(1).map(String::as_str).unwrap_or("unknown")
    }

    pub fn congestion_control(&self) -> &str {
        self.metadata.get(2).map(String::as_str).unwrap_or("unknown")
    }

    /// The host is the last metadata token; producers that omit it (fewer
    /// than four tokens) get the "unknown" sentinel.
    pub fn host(&self) -> &str {
        if self.metadata.len() >= 4 {
            self.metadata.last().map(String::as_str).unwrap_or("unknown")
        } else {
            "unknown"
        }
    }
}

/// Scan `dir` for files with extension `ext` (without the dot, matched
/// case-insensitively) and group them by the run timestamp parsed from the
/// leading filename token.
///
/// Files whose leading token does not parse as `YYYYMMDDHHMMSS` are skipped
/// with a warning. If `target` is given, only that run is retained; files of
/// other runs are skipped silently.
pub fn logs_by_timestamp(
    dir: &Path,
    ext: &str,
    target: Option<&str>,
) -> Result<BTreeMap<String, Vec<LogFileRef>>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read log directory {}", dir.display()))?;

    let mut runs: BTreeMap<String, Vec<LogFileRef>> = BTreeMap::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if !matches_ext {
            continue;
        }

        let Some(file) = LogFileRef::from_path(path) else {
            continue;
        };

        let stamp = file.timestamp();
        if NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_err() {
            warn!("cannot parse timestamp for file: {}", file.basename);
            continue;
        }
        if let Some(t) = target {
            if stamp != t {
                continue;
            }
        }

        runs.entry(stamp.to_string()).or_default().push(file);
    }

    // Stable order inside a run, independent of directory iteration order.
    for files in runs.values_mut() {
        files.sort_by(|a, b| a.basename.cmp(&b.basename));
    }

    Ok(runs)
}

/// Select the most recent run. The fixed-width timestamp format makes the
/// lexicographically largest key the chronologically latest one.
pub fn latest_run(
    runs: BTreeMap<String, Vec<LogFileRef>>,
    ext: &str,
) -> Result<(String, Vec<LogFileRef>)> {
    match runs.into_iter().next_back() {
        Some(run) => Ok(run),
        None => bail!("no .{ext} logs found for the requested run"),
    }
}
