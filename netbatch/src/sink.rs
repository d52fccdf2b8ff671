//! Result sink: one record per inventory row, serialized once at the end of
//! the run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::RunError;
use crate::inventory::FIELD_DELIMITER;

/// Outcome of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Skip,
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::Skip => "SKIP",
            Status::Fail => "FAIL",
        })
    }
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "Ticket_ID")]
    pub ticket_id: String,
    #[serde(rename = "IP")]
    pub host: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Output_File")]
    pub output_file: PathBuf,
}

/// Per-status totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub ok: usize,
    pub skip: usize,
    pub fail: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.ok + self.skip + self.fail
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} OK, {} SKIP, {} FAIL", self.ok, self.skip, self.fail)
    }
}

/// Ordered collection of [`ResultRecord`]s.
#[derive(Debug, Default)]
pub struct ResultSink {
    records: Vec<ResultRecord>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn counts(&self) -> Counts {
        self.records.iter().fold(Counts::default(), |mut c, r| {
            match r.status {
                Status::Ok => c.ok += 1,
                Status::Skip => c.skip += 1,
                Status::Fail => c.fail += 1,
            }
            c
        })
    }

    /// Write the summary table to `path`.
    pub fn write_summary(&self, path: &Path) -> Result<(), RunError> {
        let summary_error = |source| RunError::Summary {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .from_path(path)
            .map_err(summary_error)?;

        if self.records.is_empty() {
            writer
                .write_record(["Ticket_ID", "IP", "Action", "Status", "Message", "Output_File"])
                .map_err(summary_error)?;
        }
        for record in &self.records {
            writer.serialize(record).map_err(summary_error)?;
        }
        writer.flush().map_err(|e| summary_error(e.into()))?;
        Ok(())
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticket: &str, status: Status, message: &str) -> ResultRecord {
        ResultRecord {
            ticket_id: ticket.into(),
            host: "10.0.0.1".into(),
            action: "AUDIT".into(),
            status,
            message: message.into(),
            output_file: PathBuf::from(format!("outputs/{ticket}.txt")),
        }
    }

    #[test]
    fn test_counts() {
        let mut sink = ResultSink::new();
        sink.push(record("T1", Status::Ok, ""));
        sink.push(record("T2", Status::Fail, "ConnectionTimeout: x"));
        sink.push(record("T3", Status::Skip, "unknown action: FOO"));
        sink.push(record("T4", Status::Ok, ""));

        let counts = sink.counts();
        assert_eq!(counts, Counts { ok: 2, skip: 1, fail: 1 });
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.to_string(), "2 OK, 1 SKIP, 1 FAIL");
    }

    #[test]
    fn test_summary_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let mut sink = ResultSink::new();
        sink.push(record("T1", Status::Ok, ""));
        sink.push(record("T2", Status::Fail, "ERROR: CommandRejected: 'x'; bad"));
        sink.write_summary(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Ticket_ID;IP;Action;Status;Message;Output_File");
        assert_eq!(lines[1], "T1;10.0.0.1;AUDIT;OK;;outputs/T1.txt");
        assert_eq!(
            lines[2],
            "T2;10.0.0.1;AUDIT;FAIL;\"ERROR: CommandRejected: 'x'; bad\";outputs/T2.txt"
        );
    }

    #[test]
    fn test_empty_summary_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        ResultSink::new().write_summary(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Ticket_ID;IP;Action;Status;Message;Output_File\n");
    }

    #[test]
    fn test_unwritable_summary() {
        let err = ResultSink::new()
            .write_summary(Path::new("/nonexistent/dir/summary.csv"))
            .unwrap_err();
        assert!(matches!(err, RunError::Summary { .. }));
    }
}
