//! Task runner: one pass over the inventory.
//!
//! Each row is normalized at load time; here it is dispatched, executed
//! against its own session, classified, and recorded. Rows run on a bounded
//! pool but results keep inventory order. A row never affects another row,
//! and only run-level problems (output directory, summary file) abort the run.

use std::any::Any;
use std::fs;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::{FutureExt, StreamExt, stream};
use log::{debug, info, warn};
use secrecy::SecretString;
use tokio::time::timeout;

use crate::action::{Handler, OutputBuffer};
use crate::artifact::{self, ArtifactNamer, RunStamp};
use crate::error::{ConnectError, ExecError, RowError, RunError};
use crate::inventory::InventoryRow;
use crate::session::{ConnectionParams, DeviceSession, SessionConnector, SessionState};
use crate::sink::{Counts, ResultRecord, ResultSink, Status};

/// Run-wide settings.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Most sessions open at once. `1` processes rows strictly one by one.
    pub concurrency: usize,
    /// Bound on `open` and `elevate`.
    pub connect_timeout: Duration,
    /// Bound on each command and config set.
    pub command_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            concurrency: 4,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(60),
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub stamp: RunStamp,
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
    pub counts: Counts,
    pub records: Vec<ResultRecord>,
}

/// Drives every inventory row through its action handler.
#[derive(Debug)]
pub struct TaskRunner<C> {
    connector: C,
    config: RunConfig,
}

impl<C: SessionConnector> TaskRunner<C> {
    pub fn new(connector: C, config: RunConfig) -> Self {
        Self { connector, config }
    }

    /// Process every row and write the summary.
    pub async fn run(&self, rows: Vec<InventoryRow>) -> Result<RunReport, RunError> {
        let dir = self.config.output_dir.clone();
        fs::create_dir_all(&dir).map_err(|source| RunError::OutputDir {
            path: dir.clone(),
            source,
        })?;

        let stamp = RunStamp::capture(&dir);
        info!(
            "run {}: {} rows, concurrency {}",
            stamp.as_str(),
            rows.len(),
            self.config.concurrency.max(1)
        );

        // Names are fixed up front so collisions resolve in inventory order
        let mut namer = ArtifactNamer::new(&dir, stamp.clone());
        let jobs: Vec<(InventoryRow, PathBuf)> = rows
            .into_iter()
            .map(|row| {
                let path = namer.next(&row.ticket_id, &row.host, row.action.as_str());
                (row, path)
            })
            .collect();

        let records: Vec<ResultRecord> = stream::iter(jobs)
            .map(|(row, path)| self.process(row, path))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut sink = ResultSink::new();
        for record in records {
            sink.push(record);
        }

        let summary_path = dir.join(artifact::summary_file_name(stamp.as_str()));
        sink.write_summary(&summary_path)?;

        let counts = sink.counts();
        info!("run {} finished: {}", stamp.as_str(), counts);

        Ok(RunReport {
            stamp,
            output_dir: dir,
            summary_path,
            counts,
            records: sink.into_records(),
        })
    }

    /// Handle one row end to end. Never fails; every outcome is a record.
    async fn process(&self, row: InventoryRow, artifact_path: PathBuf) -> ResultRecord {
        let line = row.line;
        let ticket_id = row.ticket_id.clone();
        let host = row.host.clone();
        let action = row.action.as_str().to_string();
        let mut out = OutputBuffer::new();

        let (mut status, mut message) = match Handler::for_action(&row.action) {
            None => (Status::Skip, format!("unknown action: {action}")),
            Some(handler) => {
                let result = AssertUnwindSafe(self.execute(row, handler, &mut out))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(RowError::Panic(panic_message(payload))));
                match result {
                    Ok(()) => (Status::Ok, String::new()),
                    Err(e) => (Status::Fail, e.message()),
                }
            }
        };

        if let Err(source) = artifact::write(&artifact_path, &out.join()) {
            let err = RowError::Artifact {
                path: artifact_path.clone(),
                source,
            };
            message = match status {
                Status::Fail => format!("{message}; {}", err.message()),
                _ => err.message(),
            };
            status = Status::Fail;
        }

        match status {
            Status::Fail => warn!("line {line}: {host} {action} FAIL: {message}"),
            Status::Skip => info!("line {line}: {host} SKIP: {message}"),
            Status::Ok => info!("line {line}: {host} {action} OK"),
        }

        ResultRecord {
            ticket_id,
            host,
            action,
            status,
            message,
            output_file: artifact_path,
        }
    }

    async fn execute(&self, row: InventoryRow, handler: Handler, out: &mut OutputBuffer) -> Result<(), RowError> {
        let InventoryRow {
            host,
            device_kind,
            username,
            password,
            enable_secret,
            commands,
            problem,
            ..
        } = row;

        if let Some(problem) = problem {
            return Err(RowError::InvalidRow(problem));
        }

        let session = self.connector.session(ConnectionParams {
            host: host.clone(),
            device_kind,
            username,
            password,
        })?;
        let mut session = TimedSession::new(session, &self.config);

        session.open().await?;
        debug!("{host}: running {handler:?}");

        let result = AssertUnwindSafe(drive(&mut session, handler, enable_secret.as_ref(), &commands, out))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(RowError::Panic(panic_message(payload))));

        if session.state().is_open() {
            session.close().await;
        }
        result
    }
}

/// Elevate when a secret is present, then run the handler.
async fn drive<S: DeviceSession>(
    session: &mut S,
    handler: Handler,
    enable_secret: Option<&SecretString>,
    commands: &[String],
    out: &mut OutputBuffer,
) -> Result<(), RowError> {
    if let Some(secret) = enable_secret {
        session.elevate(secret).await?;
    }
    handler.run(session, commands, out).await?;
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Puts a time bound on every operation of the wrapped session.
#[derive(Debug)]
struct TimedSession<S> {
    inner: S,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl<S: DeviceSession> TimedSession<S> {
    fn new(inner: S, config: &RunConfig) -> Self {
        Self {
            inner,
            connect_timeout: config.connect_timeout,
            command_timeout: config.command_timeout,
        }
    }
}

impl<S: DeviceSession> DeviceSession for TimedSession<S> {
    async fn open(&mut self) -> Result<(), ConnectError> {
        let after = self.connect_timeout;
        let outcome = timeout(after, self.inner.open()).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                // The transport may already be up even though open never finished
                self.close().await;
                Err(ConnectError::Unreachable(format!("connection timed out after {after:?}")))
            }
        }
    }

    async fn elevate(&mut self, secret: &SecretString) -> Result<(), ConnectError> {
        let after = self.connect_timeout;
        timeout(after, self.inner.elevate(secret))
            .await
            .unwrap_or_else(|_| Err(ConnectError::Unreachable(format!("privilege escalation timed out after {after:?}"))))
    }

    async fn run_command(&mut self, command: &str) -> Result<String, ExecError> {
        let after = self.command_timeout;
        timeout(after, self.inner.run_command(command))
            .await
            .unwrap_or_else(|_| {
                Err(ExecError::Timeout {
                    command: command.to_string(),
                    after,
                })
            })
    }

    async fn run_config_set(&mut self, lines: &[String]) -> Result<String, ExecError> {
        let after = self.command_timeout;
        timeout(after, self.inner.run_config_set(lines))
            .await
            .unwrap_or_else(|_| {
                Err(ExecError::Timeout {
                    command: "config set".to_string(),
                    after,
                })
            })
    }

    async fn close(&mut self) {
        if timeout(self.connect_timeout, self.inner.close()).await.is_err() {
            warn!("close timed out after {:?}", self.connect_timeout);
        }
    }

    fn state(&self) -> SessionState {
        self.inner.state()
    }
}
