//! Device sessions: one administrative channel to one device for one row.
//!
//! A session moves through a fixed set of states:
//!
//! ```text
//! Unopened --open--> Open --elevate--> Elevated
//!                      \                  |
//!                       +-----close-------+--> Closed
//! ```
//!
//! `Elevated` is only entered when the row carries an enable secret. Once a
//! session has reached `Open`, the task runner closes it on every exit path.

#[cfg(test)]
pub(crate) mod mock;
mod ssh;

pub use ssh::{SshConnector, SshOptions, SshSession};

use std::fmt;
use std::future::Future;

use secrecy::SecretString;

use crate::error::{ConnectError, ExecError, RowError};

/// Lifecycle state of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Elevated,
    Closed,
}

impl SessionState {
    /// Whether commands can be sent and `close` must eventually run.
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::Open | SessionState::Elevated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unopened => "unopened",
            SessionState::Open => "open",
            SessionState::Elevated => "elevated",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Everything needed to reach and log into one device. The enable secret
/// is not part of it; it goes to [`DeviceSession::elevate`].
#[derive(Debug)]
pub struct ConnectionParams {
    pub host: String,
    pub device_kind: String,
    pub username: String,
    pub password: SecretString,
}

/// One administrative channel to one device.
pub trait DeviceSession: Send {
    /// Establish the channel and log in.
    fn open(&mut self) -> impl Future<Output = Result<(), ConnectError>> + Send;

    /// Raise the session's privilege using `secret`.
    fn elevate(&mut self, secret: &SecretString) -> impl Future<Output = Result<(), ConnectError>> + Send;

    /// Run one read-only command and return its raw output.
    fn run_command(&mut self, command: &str) -> impl Future<Output = Result<String, ExecError>> + Send;

    /// Enter configuration mode, apply `lines` in order, leave configuration
    /// mode, and return the combined echo and output.
    ///
    /// Mode-entry, mode-exit and save lines must already be filtered out.
    fn run_config_set(&mut self, lines: &[String]) -> impl Future<Output = Result<String, ExecError>> + Send;

    /// Release the channel. Calling it again is a no-op.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;
}

/// Builds unopened sessions for inventory rows.
pub trait SessionConnector: Send + Sync {
    type Session: DeviceSession;

    /// Create an unopened session for `params`.
    ///
    /// Fails without touching the network when the device kind is unknown.
    fn session(&self, params: ConnectionParams) -> Result<Self::Session, RowError>;
}
