//! Action handlers: what each inventory action does with an open session.
//!
//! Handlers append to an [`OutputBuffer`] as they go. When a step fails the
//! handler returns immediately, and the buffer holds exactly the output of
//! the steps that finished before it.

use log::debug;

use crate::error::ExecError;
use crate::inventory::Action;
use crate::session::DeviceSession;

/// Command that prints the device's full configuration.
pub const BACKUP_COMMAND: &str = "show running-config";

/// Command that persists the running configuration to non-volatile storage.
pub const SAVE_COMMAND: &str = "write memory";

/// Header placed before the save command's output.
pub const SAVE_HEADER: &str = "\n### SAVE\n";

/// Lines the config-set primitive already handles on its own. Compared
/// case-insensitively after trimming.
pub const SESSION_CONTROL_COMMANDS: &[&str] =
    &["conf t", "configure terminal", "end", "wr mem", "write memory"];

/// Ordered output segments for one row, joined once at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    segments: Vec<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(String::is_empty)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The artifact text.
    pub fn join(&self) -> String {
        self.segments.concat()
    }
}

/// Header line written before each audit command's output.
pub fn command_header(command: &str) -> String {
    format!("\n### {command}\n")
}

/// Whether `line` is a mode-entry, mode-exit or save directive.
pub fn is_session_control(line: &str) -> bool {
    let line = line.trim();
    SESSION_CONTROL_COMMANDS
        .iter()
        .any(|control| line.eq_ignore_ascii_case(control))
}

/// Drop session-control lines, keeping the rest in order.
pub fn config_lines(commands: &[String]) -> Vec<String> {
    commands
        .iter()
        .filter(|line| !is_session_control(line))
        .cloned()
        .collect()
}

/// The handler an action dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Audit,
    Backup,
    Push,
}

impl Handler {
    /// Handler for a normalized action; `None` means the row is skipped.
    pub fn for_action(action: &Action) -> Option<Self> {
        match action {
            Action::Audit => Some(Handler::Audit),
            Action::Backup => Some(Handler::Backup),
            Action::Push => Some(Handler::Push),
            Action::Unknown(_) => None,
        }
    }

    /// Run this handler against an open session.
    pub async fn run<S: DeviceSession>(
        self,
        session: &mut S,
        commands: &[String],
        out: &mut OutputBuffer,
    ) -> Result<(), ExecError> {
        match self {
            Handler::Audit => audit(session, commands, out).await,
            Handler::Backup => backup(session, out).await,
            Handler::Push => push(session, commands, out).await,
        }
    }
}

/// Run each command in order, recording a header and the output of each.
pub async fn audit<S: DeviceSession>(
    session: &mut S,
    commands: &[String],
    out: &mut OutputBuffer,
) -> Result<(), ExecError> {
    for command in commands {
        let result = session.run_command(command).await?;
        out.push(command_header(command));
        out.push(result);
    }
    Ok(())
}

/// Fetch the full configuration verbatim. The row's commands are ignored.
pub async fn backup<S: DeviceSession>(session: &mut S, out: &mut OutputBuffer) -> Result<(), ExecError> {
    out.push(session.run_command(BACKUP_COMMAND).await?);
    Ok(())
}

/// Apply the configuration lines, then save.
///
/// The save always runs after a successful config set, even when filtering
/// left no lines to apply.
pub async fn push<S: DeviceSession>(
    session: &mut S,
    commands: &[String],
    out: &mut OutputBuffer,
) -> Result<(), ExecError> {
    let lines = config_lines(commands);
    debug!(
        "push: {} config lines ({} session-control lines dropped)",
        lines.len(),
        commands.len() - lines.len()
    );

    match session.run_config_set(&lines).await {
        Ok(echo) => out.push(echo),
        Err(err) => {
            // Lines before the rejected one are already applied
            if let Some(partial) = err.partial_output() {
                out.push(partial);
            }
            return Err(err);
        }
    }

    let saved = session.run_command(SAVE_COMMAND).await?;
    out.push(SAVE_HEADER);
    out.push(saved);
    Ok(())
}
