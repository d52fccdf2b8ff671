//! Error types for netbatch.
//!
//! Two families live here. The SSH stack (`transport`, `channel`, `driver`,
//! `platform`) reports through [`Error`]. The batch layer classifies every
//! row-level failure into [`RowError`] and every run-level failure into
//! [`RunError`].

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from the SSH stack, by layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    #[error("driver: {0}")]
    Driver(#[from] DriverError),

    #[error("platform: {0}")]
    Platform(#[from] PlatformError),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("ssh: {0}")]
    Ssh(#[from] russh::Error),

    #[error("authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    #[error("host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    #[error("host key for {host}:{port} does not match known_hosts line {line}")]
    HostKeyChanged { host: String, port: u16, line: usize },

    #[error("known_hosts: {0}")]
    KnownHosts(String),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum ChannelError {
    /// No prompt arrived in time.
    #[error("no prompt within {0:?}")]
    PatternTimeout(Duration),

    #[error("channel closed by peer")]
    Closed,

    #[error("ssh: {0}")]
    Ssh(russh::Error),
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    /// The device refused the escalation, usually a wrong enable secret.
    #[error("could not reach privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    #[error("privilege level '{target}' asks for a password but no secret was given")]
    SecretRequired { target: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("no privilege level matches prompt '{prompt}'")]
    UnknownPrivilege { prompt: String },

    #[error("no way from privilege level '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("invalid dialect {message}")]
    InvalidDefinition { message: String },

    #[error("unknown platform '{name}'")]
    UnknownPlatform { name: String },

    #[error("platform name already registered: '{name}'")]
    AlreadyRegistered { name: String },
}

/// Result of an SSH stack operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure while opening a device session or elevating its privilege.
///
/// These are the two recognized connection-failure kinds. Either one ends
/// the row before any action runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The device rejected the credentials or the enable secret.
    #[error("{0}")]
    Authentication(String),

    /// The device could not be reached, or did not answer in time.
    #[error("{0}")]
    Unreachable(String),
}

impl ConnectError {
    /// Label used in the summary message.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectError::Authentication(_) => "AuthenticationError",
            ConnectError::Unreachable(_) => "ConnectionTimeout",
        }
    }
}

/// Failure of a command or config set on an established session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The session broke while the command was running.
    #[error("'{command}': {detail}")]
    Transport { command: String, detail: String },

    /// The device answered with one of its failure markers. `output` holds
    /// what the device printed up to and including the rejection.
    #[error("'{command}' rejected by device: {message}")]
    Rejected {
        command: String,
        message: String,
        output: String,
    },

    /// No prompt came back within the command timeout.
    #[error("'{command}' timed out after {after:?}")]
    Timeout { command: String, after: Duration },
}

impl ExecError {
    /// Label used in the summary message.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecError::Transport { .. } => "CommandError",
            ExecError::Rejected { .. } => "CommandRejected",
            ExecError::Timeout { .. } => "CommandTimeout",
        }
    }

    /// Device output received before the failure, if any.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            ExecError::Rejected { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Everything that can end a single inventory row in FAIL.
#[derive(Error, Debug)]
pub enum RowError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The row was flagged at load time.
    #[error("{0}")]
    InvalidRow(String),

    /// No dialect is registered for the row's device type.
    #[error("unsupported device type '{0}'")]
    UnsupportedDevice(String),

    /// The row's output file could not be written.
    #[error("{path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Last-resort catch at the row boundary.
    #[error("{0}")]
    Panic(String),
}

impl RowError {
    /// Label used in the summary message.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::Connect(e) => e.kind(),
            RowError::Exec(e) => e.kind(),
            RowError::InvalidRow(_) => "InvalidRow",
            RowError::UnsupportedDevice(_) => "UnsupportedDevice",
            RowError::Artifact { .. } => "ArtifactWriteError",
            RowError::Panic(_) => "Panic",
        }
    }

    /// Whether this failure happened while connecting or elevating.
    pub fn is_connect(&self) -> bool {
        matches!(self, RowError::Connect(_))
    }

    /// Summary message for this failure.
    ///
    /// Connection-class failures read `<Kind>: <detail>`; everything else is
    /// labelled generically as `ERROR: <Kind>: <detail>`.
    pub fn message(&self) -> String {
        if self.is_connect() {
            format!("{}: {}", self.kind(), self)
        } else {
            format!("ERROR: {}: {}", self.kind(), self)
        }
    }
}

/// Failures that abort the whole run.
#[derive(Error, Debug)]
pub enum RunError {
    /// The inventory file could not be opened or read.
    #[error("cannot read inventory {path}: {source}")]
    InventoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The inventory file is not valid `;`-separated CSV.
    #[error("malformed inventory {path}: {source}")]
    InventoryFormat {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The summary table could not be written.
    #[error("cannot write summary {path}: {source}")]
    Summary {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
