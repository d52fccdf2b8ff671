//! [`DeviceSession`] over SSH, backed by [`GenericDriver`].

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};

use super::{ConnectionParams, DeviceSession, SessionConnector, SessionState};
use crate::driver::{Driver, DriverBuilder, GenericDriver, Response};
use crate::error::{ChannelError, ConnectError, DriverError, Error, ExecError, RowError, TransportError};
use crate::platform::PlatformRegistry;
use crate::transport::HostKeyVerification;

/// Per-run SSH settings shared by every session.
#[derive(Debug, Clone)]
pub struct SshOptions {
    pub port: u16,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(60),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// Creates [`SshSession`]s, resolving each row's device type to a platform.
#[derive(Debug)]
pub struct SshConnector {
    registry: PlatformRegistry,
    options: SshOptions,
}

impl SshConnector {
    pub fn new(registry: PlatformRegistry, options: SshOptions) -> Self {
        Self { registry, options }
    }
}

impl SessionConnector for SshConnector {
    type Session = SshSession;

    fn session(&self, params: ConnectionParams) -> Result<SshSession, RowError> {
        let platform = self
            .registry
            .resolve(&params.device_kind)
            .map_err(|_| RowError::UnsupportedDevice(params.device_kind.clone()))?
            .clone();

        let driver = DriverBuilder::new(params.host.clone())
            .port(self.options.port)
            .username(params.username)
            .password(params.password)
            .platform(platform)
            .timeout(self.options.connect_timeout)
            .host_key_verification(self.options.host_key_verification)
            .known_hosts_path(self.options.known_hosts_path.clone())
            .build()
            .map_err(|e| RowError::InvalidRow(e.to_string()))?;

        Ok(SshSession {
            host: params.host,
            driver,
            command_timeout: self.options.command_timeout,
            state: SessionState::Unopened,
        })
    }
}

/// SSH-backed device session.
#[derive(Debug)]
pub struct SshSession {
    host: String,
    driver: GenericDriver,
    command_timeout: Duration,
    state: SessionState,
}

impl DeviceSession for SshSession {
    async fn open(&mut self) -> Result<(), ConnectError> {
        if let Err(e) = self.driver.open().await {
            // Tear down whatever part of the connection came up
            if let Err(close_err) = self.driver.close().await {
                debug!("{}: teardown after failed open: {}", self.host, close_err);
            }
            return Err(connect_error(e));
        }
        self.driver.set_timeout(self.command_timeout);
        self.state = SessionState::Open;
        debug!("{}: session open", self.host);
        Ok(())
    }

    async fn elevate(&mut self, secret: &SecretString) -> Result<(), ConnectError> {
        self.driver
            .set_escalation_secret(SecretString::from(secret.expose_secret().to_string()));
        let target = self.driver.platform().elevated.clone();
        self.driver
            .acquire_privilege(&target)
            .await
            .map_err(connect_error)?;
        self.state = SessionState::Elevated;
        debug!("{}: elevated to {}", self.host, target);
        Ok(())
    }

    async fn run_command(&mut self, command: &str) -> Result<String, ExecError> {
        let response = self
            .driver
            .send_command(command)
            .await
            .map_err(|e| exec_error(command, e))?;
        command_outcome(response)
    }

    async fn run_config_set(&mut self, lines: &[String]) -> Result<String, ExecError> {
        let commands: Vec<&str> = lines.iter().map(String::as_str).collect();
        let responses = self
            .driver
            .send_config(&commands)
            .await
            .map_err(|e| exec_error("configure terminal", e))?;
        config_outcome(&responses)
    }

    async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.driver.close().await {
            warn!("{}: error while closing session: {}", self.host, e);
        }
        self.state = SessionState::Closed;
        debug!("{}: session closed", self.host);
    }

    fn state(&self) -> SessionState {
        self.state
    }
}

/// A command's output, or `Rejected` when the device flagged it.
fn command_outcome(response: Response) -> Result<String, ExecError> {
    match response.failure {
        Some(message) => Err(ExecError::Rejected {
            command: response.command,
            message,
            output: response.output,
        }),
        None => Ok(response.output),
    }
}

/// Each config line followed by its output. The driver stops at the first
/// rejected line, so on rejection the echo ends with that line.
fn config_outcome(responses: &[Response]) -> Result<String, ExecError> {
    let echo: String = responses
        .iter()
        .map(|r| match r.output.is_empty() {
            true => format!("{}\n", r.command),
            false => format!("{}\n{}\n", r.command, r.output),
        })
        .collect();

    match responses.iter().find(|r| !r.is_success()) {
        Some(rejected) => Err(ExecError::Rejected {
            command: rejected.command.clone(),
            message: rejected.failure.clone().unwrap_or_default(),
            output: echo,
        }),
        None => Ok(echo),
    }
}

/// Sort a login or elevation failure into one of the two connection kinds.
fn connect_error(err: Error) -> ConnectError {
    match err {
        Error::Transport(TransportError::AuthenticationFailed { .. })
        | Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. })
        | Error::Driver(DriverError::SecretRequired { .. }) => {
            ConnectError::Authentication(err.to_string())
        }
        other => ConnectError::Unreachable(other.to_string()),
    }
}

fn exec_error(command: &str, err: Error) -> ExecError {
    match err {
        Error::Channel(ChannelError::PatternTimeout(after)) => ExecError::Timeout {
            command: command.to_string(),
            after,
        },
        other => ExecError::Transport {
            command: command.to_string(),
            detail: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(device_kind: &str) -> ConnectionParams {
        ConnectionParams {
            host: "192.0.2.10".into(),
            device_kind: device_kind.into(),
            username: "admin".into(),
            password: SecretString::from("pw".to_string()),
        }
    }

    #[test]
    fn test_connector_resolves_platform() {
        let connector = SshConnector::new(PlatformRegistry::with_builtins().unwrap(), SshOptions::default());
        let session = connector.session(params("cisco_xe")).unwrap();
        assert_eq!(session.state(), SessionState::Unopened);
        assert_eq!(session.driver.platform().name, "cisco_ios");
    }

    #[test]
    fn test_connector_rejects_unknown_device() {
        let connector = SshConnector::new(PlatformRegistry::with_builtins().unwrap(), SshOptions::default());
        let err = connector.session(params("hp_procurve")).unwrap_err();
        assert!(matches!(err, RowError::UnsupportedDevice(ref kind) if kind == "hp_procurve"));
    }

    #[test]
    fn test_connect_error_classification() {
        let auth = connect_error(
            TransportError::AuthenticationFailed {
                user: "admin".into(),
            }
            .into(),
        );
        assert!(matches!(auth, ConnectError::Authentication(_)));

        let enable = connect_error(
            DriverError::PrivilegeAcquisitionFailed {
                target: "privilege_exec".into(),
            }
            .into(),
        );
        assert!(matches!(enable, ConnectError::Authentication(_)));

        let timeout = connect_error(TransportError::Timeout(Duration::from_secs(3)).into());
        assert!(matches!(timeout, ConnectError::Unreachable(ref m) if m.contains("timed out")));
    }

    #[test]
    fn test_exec_error_classification() {
        let err = exec_error(
            "show tech",
            ChannelError::PatternTimeout(Duration::from_secs(60)).into(),
        );
        assert_eq!(
            err,
            ExecError::Timeout {
                command: "show tech".into(),
                after: Duration::from_secs(60),
            }
        );

        let err = exec_error("show tech", ChannelError::Closed.into());
        assert!(matches!(err, ExecError::Transport { .. }));
    }

    fn response(command: &str, output: &str) -> Response {
        Response::new(command, output, "r1(config)#", Duration::ZERO)
    }

    #[test]
    fn test_command_outcome() {
        assert_eq!(command_outcome(response("show clock", "10:00")).unwrap(), "10:00");

        let rejected = response("show clok", "% Invalid input detected").with_failure("% Invalid input");
        assert_eq!(
            command_outcome(rejected).unwrap_err(),
            ExecError::Rejected {
                command: "show clok".into(),
                message: "% Invalid input".into(),
                output: "% Invalid input detected".into(),
            }
        );
    }

    #[test]
    fn test_config_outcome_echo() {
        let echo = config_outcome(&[response("hostname r1", ""), response("ntp server 192.0.2.1", "ok")]).unwrap();
        assert_eq!(echo, "hostname r1\nntp server 192.0.2.1\nok\n");
        assert_eq!(config_outcome(&[]).unwrap(), "");
    }

    #[test]
    fn test_config_outcome_rejection_keeps_applied_lines() {
        let err = config_outcome(&[
            response("hostname r1", ""),
            response("interface Gi9/9", "% Invalid input detected").with_failure("% Invalid input"),
        ])
        .unwrap_err();

        assert_eq!(err.partial_output(), Some("hostname r1\ninterface Gi9/9\n% Invalid input detected\n"));
        assert!(matches!(err, ExecError::Rejected { ref command, ref message, .. }
            if command == "interface Gi9/9" && message == "% Invalid input"));
    }

    #[tokio::test]
    async fn test_close_unopened_is_noop() {
        let connector = SshConnector::new(PlatformRegistry::with_builtins().unwrap(), SshOptions::default());
        let mut session = connector.session(params("arista_eos")).unwrap();
        session.close().await;
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
    }
}
