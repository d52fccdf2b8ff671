//! russh client: connect, authenticate, open a shell.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::{HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// An authenticated SSH connection.
pub struct SshTransport {
    handle: Handle<ClientHandler>,
    pty_size: (u32, u32),
}

impl SshTransport {
    /// Connect within `config.timeout` and log in with the password.
    pub async fn connect(config: &SshConfig) -> Result<Self> {
        let client_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let rejection = Arc::new(Mutex::new(None));
        let handler = ClientHandler {
            policy: HostKeyPolicy {
                host: config.host.clone(),
                port: config.port,
                mode: config.host_key_verification,
                known_hosts: config.known_hosts_path.clone(),
            },
            rejection: rejection.clone(),
        };

        debug!("connecting to {}", config.socket_addr());
        let connecting = client::connect(client_config, (config.host.as_str(), config.port), handler);
        let mut handle = match tokio::time::timeout(config.timeout, connecting).await {
            Err(_) => return Err(TransportError::Timeout(config.timeout).into()),
            Ok(Err(e)) => {
                // russh only reports a bare key rejection; ours says why
                let reason = rejection.lock().ok().and_then(|mut slot| slot.take());
                return Err(reason.unwrap_or(TransportError::Ssh(e)).into());
            }
            Ok(Ok(handle)) => handle,
        };

        let auth = handle
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?;
        if !auth.success() {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(Self {
            handle,
            pty_size: (config.terminal_width, config.terminal_height),
        })
    }

    /// Open a session channel with a PTY and an interactive shell.
    pub async fn open_channel(&self) -> Result<Channel<Msg>> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        let (width, height) = self.pty_size;
        channel
            .request_pty(true, "xterm", width, height, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;
        channel.request_shell(true).await.map_err(TransportError::Ssh)?;
        Ok(channel)
    }

    pub async fn close(self) -> Result<()> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Decides whether a server key is acceptable.
struct HostKeyPolicy {
    host: String,
    port: u16,
    mode: HostKeyVerification,
    known_hosts: Option<PathBuf>,
}

impl HostKeyPolicy {
    fn check(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        if self.mode == HostKeyVerification::Disabled {
            return Ok(());
        }

        if self.is_known(key)? {
            return Ok(());
        }

        match self.mode {
            HostKeyVerification::Strict => Err(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            }),
            _ => {
                match self.learn(key) {
                    Ok(()) => info!("{}:{}: host key added to known_hosts", self.host, self.port),
                    Err(e) => warn!("{}:{}: host key not saved: {}", self.host, self.port, e),
                }
                Ok(())
            }
        }
    }

    /// `Ok(false)` when the host has no entry; an error when the entry
    /// holds a different key.
    fn is_known(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let found = match &self.known_hosts {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };
        found.map_err(|e| match e {
            russh::keys::Error::KeyChanged { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            other => TransportError::KnownHosts(other.to_string()),
        })
    }

    fn learn(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        let saved = match &self.known_hosts {
            Some(path) => russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };
        saved.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }
}

struct ClientHandler {
    policy: HostKeyPolicy,
    /// Why the last key was rejected, for `connect` to report.
    rejection: Arc<Mutex<Option<TransportError>>>,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> std::result::Result<bool, Self::Error> {
        match self.policy.check(key) {
            Ok(()) => Ok(true),
            Err(reason) => {
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(reason);
                }
                Ok(false)
            }
        }
    }
}
