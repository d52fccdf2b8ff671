//! Dialect-driven driver over an SSH shell.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, trace};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::Driver;
use super::privilege::{PrivilegeGraph, Step};
use super::response::Response;
use crate::channel::{PtyChannel, PtyConfig};
use crate::error::{DriverError, PlatformError, Result};
use crate::platform::{PlatformDefinition, normalize_output};
use crate::transport::{SshConfig, SshTransport};

/// Driver for any dialect described by a [`PlatformDefinition`].
pub struct GenericDriver {
    ssh: SshConfig,
    platform: PlatformDefinition,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,
    privileges: PrivilegeGraph,
    /// Sent when an escalation asks for a password.
    escalation_secret: Option<SecretString>,
    timeout: Duration,
    /// Matches the prompt of any level.
    any_prompt: Regex,
}

impl GenericDriver {
    pub fn new(ssh: SshConfig, platform: PlatformDefinition) -> Result<Self> {
        let any_prompt = any_of(platform.levels.values().map(|level| &level.prompt))?;
        Ok(Self {
            timeout: ssh.timeout,
            privileges: PrivilegeGraph::new(platform.levels.clone()),
            ssh,
            platform,
            transport: None,
            channel: None,
            escalation_secret: None,
            any_prompt,
        })
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Bound on each prompt read from now on.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        if let Some(channel) = self.channel.as_mut() {
            channel.set_timeout(timeout);
        }
    }

    pub fn set_escalation_secret(&mut self, secret: SecretString) {
        self.escalation_secret = Some(secret);
    }

    fn channel(&mut self) -> Result<&mut PtyChannel> {
        Ok(self.channel.as_mut().ok_or(DriverError::NotConnected)?)
    }

    /// Read until `pattern` matches; returns the text and its last line.
    async fn read_until(&mut self, pattern: &Regex) -> Result<(String, String)> {
        let data = self.channel()?.read_until_pattern(pattern).await?;
        let last = last_line(&data);
        Ok((String::from_utf8_lossy(&data).into_owned(), last))
    }

    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let pattern = self.any_prompt.clone();
        self.read_until(&pattern).await
    }

    /// Send one step's command, answering a password prompt if one shows up.
    async fn take_step(&mut self, step: &Step) -> Result<()> {
        self.channel()?.send(&step.command).await?;

        let Some(password_prompt) = &step.password_prompt else {
            let (_, prompt) = self.read_until_prompt().await?;
            self.privileges.observe(&prompt);
            return Ok(());
        };

        let prompt_or_password = any_of([password_prompt, &self.any_prompt])?;
        let (_, prompt) = self.read_until(&prompt_or_password).await?;
        if !password_prompt.is_match(prompt.as_bytes()) {
            self.privileges.observe(&prompt);
            return Ok(());
        }

        let secret = self
            .escalation_secret
            .as_ref()
            .map(|s| s.expose_secret().to_string())
            .ok_or_else(|| DriverError::SecretRequired {
                target: step.to.clone(),
            })?;
        self.channel()?.send(&secret).await?;

        // Asked again: the secret was wrong
        let (_, prompt) = self.read_until(&prompt_or_password).await?;
        if password_prompt.is_match(prompt.as_bytes()) {
            return Err(DriverError::PrivilegeAcquisitionFailed {
                target: step.to.clone(),
            }
            .into());
        }
        self.privileges.observe(&prompt);
        Ok(())
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh).await?;
        let shell = match transport.open_channel().await {
            Ok(shell) => shell,
            Err(e) => {
                let _ = transport.close().await;
                return Err(e);
            }
        };
        self.transport = Some(transport);
        self.channel = Some(PtyChannel::new(
            shell,
            PtyConfig {
                timeout: self.timeout,
                ..PtyConfig::default()
            },
        ));

        let (_, prompt) = self.read_until_prompt().await?;
        let level = self
            .privileges
            .observe(&prompt)
            .ok_or_else(|| DriverError::UnknownPrivilege { prompt: prompt.clone() })?;
        debug!("{}: logged in at {} ({:?})", self.ssh.host, level, prompt);

        for command in self.platform.on_open.clone() {
            self.send_command(&command).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        match self.transport.take() {
            Some(transport) => transport.close().await,
            None => Ok(()),
        }
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let started = Instant::now();
        self.channel()?.send(command).await?;
        let (raw, prompt) = self.read_until_prompt().await?;
        self.privileges.observe(&prompt);
        trace!("{:?} answered in {:?}", command, started.elapsed());

        let output = normalize_output(&raw, command);
        let failure = self.platform.failure_in(&output).map(str::to_string);
        let response = Response::new(command, output, prompt, started.elapsed());
        Ok(match failure {
            Some(marker) => response.with_failure(marker),
            None => response,
        })
    }

    async fn send_config(&mut self, lines: &[&str]) -> Result<Vec<Response>> {
        let config = self.platform.config.clone();
        let back_to = self
            .current_privilege()
            .unwrap_or(self.platform.elevated.as_str())
            .to_string();

        self.acquire_privilege(&config).await?;

        let mut responses = Vec::with_capacity(lines.len());
        for line in lines {
            let response = self.send_command(line).await?;
            let rejected = !response.is_success();
            responses.push(response);
            if rejected {
                break;
            }
        }

        // Sub-mode lines (e.g. `interface ...`) leave the prompt on the
        // configuration level, so this is always a single exit walk.
        if back_to != config {
            self.acquire_privilege(&back_to).await?;
        }
        Ok(responses)
    }

    async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let current = self.current_privilege().unwrap_or_default().to_string();
        let route = self.privileges.route(&current, target)?;

        for step in &route {
            debug!("{}: {} -> {} ({:?})", self.ssh.host, step.from, step.to, step.command);
            self.take_step(step).await?;
            if self.current_privilege() != Some(step.to.as_str()) {
                return Err(DriverError::PrivilegeAcquisitionFailed {
                    target: step.to.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    fn current_privilege(&self) -> Option<&str> {
        self.privileges.current()
    }
}

impl fmt::Debug for GenericDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericDriver")
            .field("host", &self.ssh.host)
            .field("platform", &self.platform.name)
            .field("open", &self.is_open())
            .field("privilege", &self.current_privilege())
            .finish()
    }
}

/// One regex matching any of `patterns`.
fn any_of<'a>(patterns: impl IntoIterator<Item = &'a Regex>) -> Result<Regex> {
    let alternation = patterns
        .into_iter()
        .map(|p| format!("(?:{})", p.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).map_err(|e| {
        PlatformError::InvalidDefinition {
            message: format!("combined prompt pattern: {e}"),
        }
        .into()
    })
}

/// Last line of `data`, trimmed.
fn last_line(data: &[u8]) -> String {
    let start = memchr::memrchr(b'\n', data).map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&data[start..]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::{arista_eos, cisco_ios};

    #[test]
    fn test_last_line() {
        assert_eq!(last_line(b"show clock\r\n10:00\r\nrouter# "), "router#");
        assert_eq!(last_line(b"router>"), "router>");
        assert_eq!(last_line(b""), "");
    }

    #[test]
    fn test_any_prompt_matches_every_level() {
        for platform in [cisco_ios::platform().unwrap(), arista_eos::platform().unwrap()] {
            let pattern = any_of(platform.levels.values().map(|l| &l.prompt)).unwrap();
            assert!(pattern.is_match(b"output\nrouter>"));
            assert!(pattern.is_match(b"output\nrouter#"));
            assert!(pattern.is_match(b"output\nrouter(config)#"));
            assert!(!pattern.is_match(b"Password: "));
        }
    }

    #[test]
    fn test_prompt_or_password() {
        let platform = cisco_ios::platform().unwrap();
        let password = platform
            .level("privilege_exec")
            .and_then(|l| l.password_prompt.clone())
            .unwrap();
        let prompts = any_of(platform.levels.values().map(|l| &l.prompt)).unwrap();
        let either = any_of([&password, &prompts]).unwrap();

        assert!(either.is_match(b"enable\r\nPassword: "));
        assert!(either.is_match(b"enable\r\nrouter#"));
    }
}
