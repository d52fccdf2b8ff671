//! Device dialects.
//!
//! A dialect describes how one device OS family behaves on the command line:
//! the prompt shown at each privilege level, the commands that move between
//! levels, the output that means a command was rejected, and what to run
//! right after login. Dialects are written as static [`DialectSpec`] tables
//! and compiled into [`PlatformDefinition`]s when the registry is built.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::{DialectSpec, PlatformDefinition};
pub use privilege_level::{LevelSpec, PrivilegeLevel};
pub use registry::PlatformRegistry;

/// Strip the command echo and the trailing prompt line from raw output.
pub fn normalize_output(raw: &str, command: &str) -> String {
    let raw = raw.replace("\r\n", "\n");
    let body = raw.trim_start_matches(['\r', '\n']);
    let body = body
        .strip_prefix(command)
        .unwrap_or(body)
        .trim_start_matches(['\r', '\n']);

    // Everything after the last newline is the prompt
    match memchr::memrchr(b'\n', body.as_bytes()) {
        Some(pos) => body[..pos].to_string(),
        None => String::new(),
    }
}
