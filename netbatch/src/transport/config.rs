//! Per-device connection settings.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

/// What to do with a server key that known_hosts does not vouch for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HostKeyVerification {
    /// Only hosts already in known_hosts are accepted.
    Strict,
    /// New hosts are recorded and accepted; a changed key is refused.
    #[default]
    AcceptNew,
    /// Any key is accepted.
    Disabled,
}

/// Everything the transport needs to reach and log into one device.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Bound on the TCP connect plus handshake, and the idle limit afterwards.
    pub timeout: Duration,
    pub terminal_width: u32,
    pub terminal_height: u32,
    pub host_key_verification: HostKeyVerification,
    /// `None` checks `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// `host:port`, for logs.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
