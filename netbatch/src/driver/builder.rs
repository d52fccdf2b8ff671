//! Assembling a [`GenericDriver`] from connection settings and a dialect.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{HostKeyVerification, SshConfig};

/// Builder for [`GenericDriver`]. Building never touches the network.
///
/// ```rust,no_run
/// use netbatch::driver::{Driver, DriverBuilder};
/// use netbatch::platform::vendors::cisco_ios;
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), netbatch::Error> {
/// let mut driver = DriverBuilder::new("192.0.2.1")
///     .username("admin")
///     .password(SecretString::from("secret".to_string()))
///     .platform(cisco_ios::platform()?)
///     .build()?;
///
/// driver.open().await?;
/// println!("{}", driver.send_command("show version").await?.output);
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    platform: Option<PlatformDefinition>,
    timeout: Duration,
    host_keys: HostKeyVerification,
    known_hosts: Option<PathBuf>,
}

impl DriverBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: None,
            platform: None,
            timeout: Duration::from_secs(30),
            host_keys: HostKeyVerification::default(),
            known_hosts: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Bound on connecting and on each prompt read until changed with
    /// [`GenericDriver::set_timeout`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_keys = mode;
        self
    }

    /// known_hosts file to check against; `None` means `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts = path;
        self
    }

    pub fn build(self) -> Result<GenericDriver> {
        let missing = |what: &str| DriverError::InvalidConfig {
            message: format!("{what} is required"),
        };
        let username = self.username.ok_or_else(|| missing("username"))?;
        let password = self.password.ok_or_else(|| missing("password"))?;
        let platform = self.platform.ok_or_else(|| missing("platform"))?;

        let ssh = SshConfig {
            host: self.host,
            port: self.port,
            username,
            password,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_keys,
            known_hosts_path: self.known_hosts,
        };
        GenericDriver::new(ssh, platform)
    }
}
