//! Arista EOS.
//!
//! EOS prompts may carry a `user@` prefix and config sub-modes name the
//! object being edited, e.g. `switch(config-if-Et1)#`.

use crate::error::Result;
use crate::platform::{DialectSpec, LevelSpec, PlatformDefinition};

const EXEC: LevelSpec = LevelSpec {
    name: "exec",
    prompt: r"(?mi)^[\w.\-@()/: ]{1,63}>\s?$",
    parent: None,
    enter: None,
    exit: None,
    password_prompt: None,
    excluded: &[],
};

const PRIVILEGE_EXEC: LevelSpec = LevelSpec {
    name: "privilege_exec",
    prompt: r"(?mi)^[\w.\-@()/: ]{1,63}#\s?$",
    parent: Some("exec"),
    enter: Some("enable"),
    exit: Some("disable"),
    password_prompt: Some(r"(?mi)^password:\s?$"),
    excluded: &["(config"],
};

const CONFIGURATION: LevelSpec = LevelSpec {
    name: "configuration",
    prompt: r"(?mi)^[\w.\-@()/: ]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s?$",
    parent: Some("privilege_exec"),
    enter: Some("configure terminal"),
    exit: Some("end"),
    password_prompt: None,
    excluded: &[],
};

pub const SPEC: DialectSpec = DialectSpec {
    name: "arista_eos",
    aliases: &[],
    levels: &[EXEC, PRIVILEGE_EXEC, CONFIGURATION],
    elevated: "privilege_exec",
    config: "configuration",
    failure_markers: &[
        "% Ambiguous command",
        "% Error",
        "% Incomplete command",
        "% Invalid input",
        "% Unavailable command",
    ],
    on_open: &["terminal length 0", "terminal width 32767"],
    terminal_width: 32767,
};

pub fn platform() -> Result<PlatformDefinition> {
    PlatformDefinition::from_spec(&SPEC)
}
