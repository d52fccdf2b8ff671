//! Output artifacts: per-row output files and the run-wide timestamp that
//! names them.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Used in file names when a row has no ticket id.
pub const NO_TICKET: &str = "NO_TICKET";

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp captured once per run. Every file the run writes carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp(String);

impl RunStamp {
    /// Capture the current local time, adding a `_2`, `_3`… suffix if a run
    /// with the same stamp already left a summary in `output_dir`.
    pub fn capture(output_dir: &Path) -> Self {
        Self::unique(Local::now(), output_dir)
    }

    fn unique(now: DateTime<Local>, output_dir: &Path) -> Self {
        let base = now.format(STAMP_FORMAT).to_string();
        let mut stamp = base.clone();
        let mut n = 1;
        while output_dir.join(summary_file_name(&stamp)).exists() {
            n += 1;
            stamp = format!("{base}_{n}");
        }
        RunStamp(stamp)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Name of the run's summary table.
pub fn summary_file_name(stamp: &str) -> String {
    format!("summary_{stamp}.csv")
}

/// Replace characters that are not allowed in file names.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `<ticket>_<host>_<action>_<stamp>.txt`, sanitized.
pub fn file_name(ticket_id: &str, host: &str, action: &str, stamp: &RunStamp) -> String {
    let ticket = if ticket_id.is_empty() { NO_TICKET } else { ticket_id };
    sanitize(&format!("{ticket}_{host}_{action}_{}.txt", stamp.as_str()))
}

/// Hands out artifact paths for one run, so that two rows with the same
/// ticket, host and action never share a file.
#[derive(Debug)]
pub struct ArtifactNamer {
    dir: PathBuf,
    stamp: RunStamp,
    seen: HashMap<String, usize>,
}

impl ArtifactNamer {
    pub fn new(dir: impl Into<PathBuf>, stamp: RunStamp) -> Self {
        Self {
            dir: dir.into(),
            stamp,
            seen: HashMap::new(),
        }
    }

    /// Path for the next row. Repeats get `_2`, `_3`… before the extension.
    pub fn next(&mut self, ticket_id: &str, host: &str, action: &str) -> PathBuf {
        let name = file_name(ticket_id, host, action, &self.stamp);
        let count = self.seen.entry(name.clone()).or_insert(0);
        *count += 1;

        match *count {
            1 => self.dir.join(name),
            n => {
                let stem = name.strip_suffix(".txt").unwrap_or(&name);
                self.dir.join(format!("{stem}_{n}.txt"))
            }
        }
    }
}

/// Write a row's output, creating or truncating the file.
pub fn write(path: &Path, text: &str) -> io::Result<()> {
    fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> RunStamp {
        RunStamp("20261019_101500".into())
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("CHG42", "10.0.0.1", "AUDIT", &stamp()),
            "CHG42_10.0.0.1_AUDIT_20261019_101500.txt"
        );
    }

    #[test]
    fn test_missing_ticket_uses_placeholder() {
        assert_eq!(
            file_name("", "r1", "BACKUP", &stamp()),
            "NO_TICKET_r1_BACKUP_20261019_101500.txt"
        );
    }

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(
            file_name("INC/7", "fe80::1", "PU*SH", &stamp()),
            "INC_7_fe80__1_PU_SH_20261019_101500.txt"
        );
        assert_eq!(sanitize("a\tb\"c?"), "a_b_c_");
    }

    #[test]
    fn test_namer_deduplicates_in_order() {
        let mut namer = ArtifactNamer::new("/out", stamp());
        let first = namer.next("", "r1", "AUDIT");
        let second = namer.next("", "r1", "AUDIT");
        let other = namer.next("", "r2", "AUDIT");

        assert_eq!(first, Path::new("/out/NO_TICKET_r1_AUDIT_20261019_101500.txt"));
        assert_eq!(second, Path::new("/out/NO_TICKET_r1_AUDIT_20261019_101500_2.txt"));
        assert_eq!(other, Path::new("/out/NO_TICKET_r2_AUDIT_20261019_101500.txt"));
    }

    #[test]
    fn test_stamp_skips_existing_summary() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2026, 10, 19, 10, 15, 0).unwrap();

        let first = RunStamp::unique(now, dir.path());
        assert_eq!(first.as_str(), "20261019_101500");

        fs::write(dir.path().join(summary_file_name(first.as_str())), "").unwrap();
        let second = RunStamp::unique(now, dir.path());
        assert_eq!(second.as_str(), "20261019_101500_2");
    }
}
