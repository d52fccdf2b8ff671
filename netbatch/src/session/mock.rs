//! Scripted in-memory sessions for runner tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;

use super::{ConnectionParams, DeviceSession, SessionConnector, SessionState};
use crate::error::{ConnectError, ExecError, RowError};

/// How every session built by a [`MockConnector`] behaves.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub open: Option<ConnectError>,
    /// Host whose `open` never answers.
    pub open_hangs_on: Option<String>,
    pub elevate: Option<ConnectError>,
    /// Responses by command; unknown commands echo `output of <cmd>`.
    pub responses: HashMap<String, Result<String, ExecError>>,
    pub config_error: Option<ExecError>,
    /// Commands that panic when run.
    pub panics_on: Option<String>,
    /// Commands that never answer.
    pub hangs_on: Option<String>,
    /// Per-host overrides of `open`.
    pub open_by_host: HashMap<String, ConnectError>,
}

impl Script {
    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(command.to_string(), Ok(output.to_string()));
        self
    }

    pub fn fail(mut self, command: &str, err: ExecError) -> Self {
        self.responses.insert(command.to_string(), Err(err));
        self
    }
}

/// Counters shared by every session a connector created.
#[derive(Debug, Default)]
pub struct CallLog {
    pub sessions: AtomicUsize,
    pub opens: AtomicUsize,
    pub elevates: AtomicUsize,
    pub closes: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
    pub config_sets: Mutex<Vec<Vec<String>>>,
    /// Highest number of sessions open at the same time.
    pub peak_open: AtomicUsize,
    open_now: AtomicUsize,
}

impl CallLog {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn config_sets(&self) -> Vec<Vec<String>> {
        self.config_sets.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub struct MockConnector {
    pub script: Script,
    pub log: Arc<CallLog>,
    /// Pause inside every command, to let concurrent rows overlap.
    pub delay: Option<Duration>,
}

impl MockConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }
}

impl SessionConnector for MockConnector {
    type Session = MockSession;

    fn session(&self, params: ConnectionParams) -> Result<MockSession, RowError> {
        if params.device_kind == "unsupported" {
            return Err(RowError::UnsupportedDevice(params.device_kind));
        }
        self.log.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            host: params.host,
            script: self.script.clone(),
            log: self.log.clone(),
            delay: self.delay,
            state: SessionState::Unopened,
        })
    }
}

#[derive(Debug)]
pub struct MockSession {
    host: String,
    script: Script,
    log: Arc<CallLog>,
    delay: Option<Duration>,
    state: SessionState,
}

impl DeviceSession for MockSession {
    async fn open(&mut self) -> Result<(), ConnectError> {
        assert_eq!(self.state, SessionState::Unopened, "open called twice");
        self.log.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.script.open_by_host.get(&self.host).or(self.script.open.as_ref()) {
            return Err(err.clone());
        }
        if self.script.open_hangs_on.as_deref() == Some(self.host.as_str()) {
            std::future::pending::<()>().await;
        }
        let now = self.log.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.peak_open.fetch_max(now, Ordering::SeqCst);
        self.state = SessionState::Open;
        Ok(())
    }

    async fn elevate(&mut self, _secret: &SecretString) -> Result<(), ConnectError> {
        assert_eq!(self.state, SessionState::Open, "elevate before open");
        self.log.elevates.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.script.elevate {
            return Err(err.clone());
        }
        self.state = SessionState::Elevated;
        Ok(())
    }

    async fn run_command(&mut self, command: &str) -> Result<String, ExecError> {
        assert!(self.state.is_open(), "command on {} session", self.state);
        self.log.commands.lock().unwrap().push(command.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.panics_on.as_deref() == Some(command) {
            panic!("scripted panic on {command}");
        }
        if self.script.hangs_on.as_deref() == Some(command) {
            std::future::pending::<()>().await;
        }
        match self.script.responses.get(command) {
            Some(result) => result.clone(),
            None => Ok(format!("output of {command}")),
        }
    }

    async fn run_config_set(&mut self, lines: &[String]) -> Result<String, ExecError> {
        assert!(self.state.is_open(), "config set on {} session", self.state);
        self.log.config_sets.lock().unwrap().push(lines.to_vec());
        if let Some(err) = &self.script.config_error {
            return Err(err.clone());
        }
        Ok(lines.iter().map(|l| format!("{l}\n")).collect())
    }

    async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        if self.state.is_open() {
            self.log.open_now.fetch_sub(1, Ordering::SeqCst);
        }
        self.state = SessionState::Closed;
    }

    fn state(&self) -> SessionState {
        self.state
    }
}
