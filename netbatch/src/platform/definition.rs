//! Dialect definitions.

use indexmap::IndexMap;

use super::privilege_level::{LevelSpec, PrivilegeLevel};
use crate::error::{PlatformError, Result};

/// Static description of a device dialect.
#[derive(Debug, Clone, Copy)]
pub struct DialectSpec {
    pub name: &'static str,
    /// Other `Device_Type` values that resolve to this dialect.
    pub aliases: &'static [&'static str],
    /// Modes, login level first.
    pub levels: &'static [LevelSpec],
    /// Level reached by elevation.
    pub elevated: &'static str,
    /// Level configuration lines are applied in.
    pub config: &'static str,
    /// Output substrings the device prints when it rejects a command.
    pub failure_markers: &'static [&'static str],
    /// Commands run right after login, typically to disable paging.
    pub on_open: &'static [&'static str],
    pub terminal_width: u32,
}

/// A validated, compiled dialect.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub levels: IndexMap<String, PrivilegeLevel>,
    pub elevated: String,
    pub config: String,
    pub failure_markers: Vec<String>,
    pub on_open: Vec<String>,
    pub terminal_width: u32,
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Compile and check a dialect table.
    ///
    /// Every parent, the elevated level and the config level must name a
    /// defined level, and exactly one level may lack a parent.
    pub fn from_spec(spec: &DialectSpec) -> Result<Self> {
        let invalid = |message: String| PlatformError::InvalidDefinition {
            message: format!("{}: {message}", spec.name),
        };

        let mut levels: IndexMap<String, PrivilegeLevel> = IndexMap::with_capacity(spec.levels.len());
        for level in spec.levels {
            let level = PrivilegeLevel::from_spec(level)?;
            if levels.contains_key(&level.name) {
                return Err(invalid(format!("level '{}' defined twice", level.name)).into());
            }
            levels.insert(level.name.clone(), level);
        }

        let roots = levels.values().filter(|l| l.parent.is_none()).count();
        if roots != 1 {
            return Err(invalid(format!("expected one login level, found {roots}")).into());
        }
        for level in levels.values() {
            if let Some(parent) = &level.parent {
                if !levels.contains_key(parent) {
                    return Err(invalid(format!("level '{}' has unknown parent '{parent}'", level.name)).into());
                }
            }
        }
        for name in [spec.elevated, spec.config] {
            if !levels.contains_key(name) {
                return Err(invalid(format!("no level named '{name}'")).into());
            }
        }

        Ok(Self {
            name: spec.name.to_string(),
            aliases: spec.aliases.iter().map(|s| s.to_string()).collect(),
            levels,
            elevated: spec.elevated.to_string(),
            config: spec.config.to_string(),
            failure_markers: spec.failure_markers.iter().map(|s| s.to_string()).collect(),
            on_open: spec.on_open.iter().map(|s| s.to_string()).collect(),
            terminal_width: spec.terminal_width,
            terminal_height: 24,
        })
    }

    pub fn level(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// First failure marker found in `output`.
    pub fn failure_in(&self, output: &str) -> Option<&str> {
        self.failure_markers
            .iter()
            .map(String::as_str)
            .find(|marker| output.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: LevelSpec = LevelSpec {
        name: "user",
        prompt: r"(?m)^\w+>$",
        parent: None,
        enter: None,
        exit: None,
        password_prompt: None,
        excluded: &[],
    };

    const ENABLE: LevelSpec = LevelSpec {
        name: "enable",
        prompt: r"(?m)^\w+#$",
        parent: Some("user"),
        enter: Some("enable"),
        exit: Some("disable"),
        password_prompt: None,
        excluded: &[],
    };

    const LAB: DialectSpec = DialectSpec {
        name: "lab",
        aliases: &["lab_os"],
        levels: &[USER, ENABLE],
        elevated: "enable",
        config: "enable",
        failure_markers: &["% Error"],
        on_open: &[],
        terminal_width: 80,
    };

    #[test]
    fn test_from_spec() {
        let platform = PlatformDefinition::from_spec(&LAB).unwrap();
        assert_eq!(platform.levels.len(), 2);
        assert_eq!(platform.aliases, vec!["lab_os"]);
        assert!(platform.level("enable").is_some());
        assert_eq!(platform.failure_in("x\n% Error: nope"), Some("% Error"));
        assert_eq!(platform.failure_in("fine"), None);
    }

    #[test]
    fn test_unknown_parent() {
        const ORPHAN: LevelSpec = LevelSpec {
            parent: Some("root"),
            ..ENABLE
        };
        let spec = DialectSpec {
            levels: &[USER, ORPHAN],
            ..LAB
        };
        let err = PlatformDefinition::from_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("unknown parent 'root'"));
    }

    #[test]
    fn test_two_login_levels() {
        const OTHER: LevelSpec = LevelSpec { name: "other", ..USER };
        let spec = DialectSpec {
            levels: &[USER, OTHER],
            ..LAB
        };
        assert!(PlatformDefinition::from_spec(&spec).is_err());
    }

    #[test]
    fn test_missing_config_level() {
        let spec = DialectSpec {
            config: "configuration",
            ..LAB
        };
        let err = PlatformDefinition::from_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("no level named 'configuration'"));
    }
}
