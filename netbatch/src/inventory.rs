//! Inventory loading.
//!
//! The inventory is a `;`-separated table with one device task per line:
//!
//! ```text
//! Ticket_ID;IP;Device_Type;Username;Password;Enable_Secret;Action;Commands
//! CHG001;10.0.0.1;cisco_ios;admin;pw;en;audit;show version|show ip int brief
//! ```
//!
//! Every line becomes an [`InventoryRow`]. Rows are never dropped: a row with
//! missing connection data is flagged and later recorded as a failure.

use std::fmt;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::RunError;

/// Separator between records' fields.
pub const FIELD_DELIMITER: u8 = b';';

/// Separator between commands inside the `Commands` field.
pub const COMMAND_DELIMITER: char = '|';

/// Requested operation for one row, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Audit,
    Backup,
    Push,
    /// Anything else. Holds the uppercased text; never executed.
    Unknown(String),
}

impl Action {
    /// Parse an inventory value, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_uppercase();
        match value.as_str() {
            "AUDIT" => Action::Audit,
            "BACKUP" => Action::Backup,
            "PUSH" => Action::Push,
            _ => Action::Unknown(value),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Audit => "AUDIT",
            Action::Backup => "BACKUP",
            Action::Push => "PUSH",
            Action::Unknown(value) => value,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device task from the inventory.
#[derive(Debug)]
pub struct InventoryRow {
    /// 1-based line in the inventory file (the header is line 1).
    pub line: u64,
    pub ticket_id: String,
    pub host: String,
    pub device_kind: String,
    pub username: String,
    pub password: SecretString,
    /// `None` when the field was empty.
    pub enable_secret: Option<SecretString>,
    pub action: Action,
    pub commands: Vec<String>,
    /// Why the row cannot be executed, if it was flagged at load time.
    pub problem: Option<String>,
}

/// Raw record as it appears in the file. Missing columns read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    #[serde(rename = "Ticket_ID")]
    ticket_id: String,
    #[serde(rename = "IP")]
    ip: String,
    #[serde(rename = "Device_Type")]
    device_type: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "Enable_Secret")]
    enable_secret: String,
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Commands")]
    commands: String,
}

impl InventoryRow {
    fn from_raw(raw: RawRow, line: u64) -> Self {
        let host = raw.ip.trim().to_string();
        let device_kind = raw.device_type.trim().to_string();
        let enable_secret = raw.enable_secret.trim();

        let problem = if host.is_empty() {
            Some("missing IP".to_string())
        } else if device_kind.is_empty() {
            Some("missing Device_Type".to_string())
        } else {
            None
        };

        Self {
            line,
            ticket_id: raw.ticket_id.trim().to_string(),
            device_kind,
            username: raw.username.trim().to_string(),
            password: SecretString::from(raw.password.trim().to_string()),
            enable_secret: (!enable_secret.is_empty())
                .then(|| SecretString::from(enable_secret.to_string())),
            action: Action::parse(&raw.action),
            commands: parse_commands(&raw.commands),
            problem,
            host,
        }
    }
}

/// Split the `Commands` field on `|`, trimming each command and dropping
/// blank ones.
pub fn parse_commands(field: &str) -> Vec<String> {
    field
        .split(COMMAND_DELIMITER)
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read every row of the inventory at `path`.
pub fn load(path: &Path) -> Result<Vec<InventoryRow>, RunError> {
    let file = std::fs::File::open(path).map_err(|source| RunError::InventoryRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read(file).map_err(|source| RunError::InventoryFormat {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read inventory rows from any reader.
pub fn read<R: Read>(reader: R) -> Result<Vec<InventoryRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        let raw: RawRow = record.deserialize(Some(&headers))?;

        let row = InventoryRow::from_raw(raw, line);
        if let Some(problem) = &row.problem {
            warn!("inventory line {}: {}", row.line, problem);
        }
        rows.push(row);
    }
    Ok(rows)
}
