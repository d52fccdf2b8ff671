//! CLI modes and how to move between them.

use regex::bytes::Regex;

use crate::error::{PlatformError, Result};

/// Static description of one CLI mode, as written in a dialect table.
#[derive(Debug, Clone, Copy)]
pub struct LevelSpec {
    pub name: &'static str,
    /// Regex for the prompt shown at this level.
    pub prompt: &'static str,
    /// Level this one is entered from. `None` for the login level.
    pub parent: Option<&'static str>,
    /// Sent at the parent to get here.
    pub enter: Option<&'static str>,
    /// Sent here to get back to the parent.
    pub exit: Option<&'static str>,
    /// Password prompt that may follow `enter`.
    pub password_prompt: Option<&'static str>,
    /// A prompt containing any of these belongs to a deeper level.
    pub excluded: &'static [&'static str],
}

/// A compiled CLI mode.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    pub name: String,
    pub prompt: Regex,
    pub parent: Option<String>,
    pub enter: Option<String>,
    pub exit: Option<String>,
    pub password_prompt: Option<Regex>,
    pub excluded: Vec<String>,
}

impl PrivilegeLevel {
    /// Compile a level from its table entry.
    pub fn from_spec(spec: &LevelSpec) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| PlatformError::InvalidDefinition {
                message: format!("level '{}': bad pattern {pattern:?}: {e}", spec.name),
            })
        };

        Ok(Self {
            name: spec.name.to_string(),
            prompt: compile(spec.prompt)?,
            parent: spec.parent.map(str::to_string),
            enter: spec.enter.map(str::to_string),
            exit: spec.exit.map(str::to_string),
            password_prompt: spec.password_prompt.map(compile).transpose()?,
            excluded: spec.excluded.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Whether `prompt` is shown at this level.
    pub fn matches(&self, prompt: &str) -> bool {
        !self.excluded.iter().any(|marker| prompt.contains(marker.as_str()))
            && self.prompt.is_match(prompt.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENABLE: LevelSpec = LevelSpec {
        name: "enable",
        prompt: r"(?m)^\w+#\s?$",
        parent: Some("user"),
        enter: Some("enable"),
        exit: Some("disable"),
        password_prompt: Some(r"(?mi)^password:\s?$"),
        excluded: &["(config"],
    };

    #[test]
    fn test_from_spec() {
        let level = PrivilegeLevel::from_spec(&ENABLE).unwrap();
        assert_eq!(level.name, "enable");
        assert_eq!(level.parent.as_deref(), Some("user"));
        assert!(level.password_prompt.unwrap().is_match(b"Password: "));
    }

    #[test]
    fn test_excluded_markers() {
        let level = PrivilegeLevel::from_spec(&ENABLE).unwrap();
        assert!(level.matches("router#"));
        assert!(!level.matches("router(config)#"));
        assert!(!level.matches("router>"));
    }

    #[test]
    fn test_bad_pattern() {
        let spec = LevelSpec {
            prompt: "([",
            ..ENABLE
        };
        let err = PrivilegeLevel::from_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("level 'enable'"));
    }
}
