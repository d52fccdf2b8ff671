//! Cisco IOS and IOS-XE. NX-OS shares the same prompts and mode commands
//! closely enough to run through this dialect.
//!
//! ```text
//! router>                 exec
//! router#                 privilege_exec
//! router(config)#         configuration
//! router(config-if)#      configuration (sub-mode)
//! ```

use crate::error::Result;
use crate::platform::{DialectSpec, LevelSpec, PlatformDefinition};

const EXEC: LevelSpec = LevelSpec {
    name: "exec",
    prompt: r"(?mi)^[\w.\-@/:]{1,63}>\s?$",
    parent: None,
    enter: None,
    exit: None,
    password_prompt: None,
    excluded: &[],
};

const PRIVILEGE_EXEC: LevelSpec = LevelSpec {
    name: "privilege_exec",
    prompt: r"(?mi)^[\w.\-@/:]{1,63}#\s?$",
    parent: Some("exec"),
    enter: Some("enable"),
    exit: Some("disable"),
    password_prompt: Some(r"(?mi)^(?:enable\s)?password:\s?$"),
    excluded: &["(conf"],
};

const CONFIGURATION: LevelSpec = LevelSpec {
    name: "configuration",
    prompt: r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,63}\)#\s?$",
    parent: Some("privilege_exec"),
    enter: Some("configure terminal"),
    exit: Some("end"),
    password_prompt: None,
    excluded: &[],
};

pub const SPEC: DialectSpec = DialectSpec {
    name: "cisco_ios",
    aliases: &["cisco_xe", "cisco_iosxe", "cisco_nxos"],
    levels: &[EXEC, PRIVILEGE_EXEC, CONFIGURATION],
    elevated: "privilege_exec",
    config: "configuration",
    failure_markers: &[
        "% Ambiguous command",
        "% Incomplete command",
        "% Invalid input detected",
        "% Unknown command",
    ],
    on_open: &["terminal length 0", "terminal width 512"],
    terminal_width: 512,
};

pub fn platform() -> Result<PlatformDefinition> {
    PlatformDefinition::from_spec(&SPEC)
}
