//! Built-in dialects.

pub mod arista_eos;
pub mod cisco_ios;

use super::DialectSpec;

/// Dialect tables a fresh registry is loaded with.
pub const BUILTIN: &[DialectSpec] = &[cisco_ios::SPEC, arista_eos::SPEC];
