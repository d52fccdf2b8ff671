//! Tracking and navigating a dialect's privilege levels.
//!
//! Levels form a tree rooted at the login level. Moving between two levels
//! walks up from the current level to the nearest common ancestor using each
//! level's `exit` command, then down to the target using `enter` commands.

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// One command that moves the session to an adjacent level.
#[derive(Debug, Clone)]
pub struct Step {
    pub from: String,
    pub to: String,
    pub command: String,
    /// Password prompt that may appear after `command`.
    pub password_prompt: Option<Regex>,
}

/// The levels of one dialect plus the level the session is on.
#[derive(Debug, Clone)]
pub struct PrivilegeGraph {
    levels: IndexMap<String, PrivilegeLevel>,
    current: Option<String>,
}

impl PrivilegeGraph {
    /// Start at the login level.
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let current = levels
            .values()
            .find(|level| level.parent.is_none())
            .map(|level| level.name.clone());
        Self { levels, current }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The level whose prompt `prompt` is.
    pub fn classify(&self, prompt: &str) -> Option<&PrivilegeLevel> {
        self.levels.values().find(|level| level.matches(prompt))
    }

    /// Update the current level from a prompt. Returns the level name, or
    /// `None` if no level matches (the current level is left alone).
    pub fn observe(&mut self, prompt: &str) -> Option<&str> {
        let name = self.classify(prompt)?.name.clone();
        self.current = Some(name);
        self.current.as_deref()
    }

    /// `name` followed by each of its ancestors up to the login level.
    fn lineage<'a>(&'a self, name: &'a str) -> Result<Vec<&'a str>> {
        let mut chain = vec![name];
        let mut level = self.level(name)?;
        while let Some(parent) = level.parent.as_deref() {
            if chain.len() > self.levels.len() {
                return Err(DriverError::NoPrivilegePath {
                    from: name.to_string(),
                    to: parent.to_string(),
                }
                .into());
            }
            chain.push(parent);
            level = self.level(parent)?;
        }
        Ok(chain)
    }

    fn level(&self, name: &str) -> Result<&PrivilegeLevel> {
        self.levels.get(name).ok_or_else(|| {
            DriverError::UnknownPrivilege {
                prompt: name.to_string(),
            }
            .into()
        })
    }

    /// Commands that take the session from `from` to `to`, in order.
    pub fn route(&self, from: &str, to: &str) -> Result<Vec<Step>> {
        let up = self.lineage(from)?;
        let down = self.lineage(to)?;

        let no_path = || DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        };

        let (up_len, down_len) = up
            .iter()
            .enumerate()
            .find_map(|(i, name)| down.iter().position(|d| d == name).map(|j| (i, j)))
            .ok_or_else(no_path)?;

        let mut steps = Vec::with_capacity(up_len + down_len);
        for pair in up[..=up_len].windows(2) {
            let level = self.level(pair[0])?;
            steps.push(Step {
                from: pair[0].to_string(),
                to: pair[1].to_string(),
                command: level.exit.clone().ok_or_else(no_path)?,
                password_prompt: None,
            });
        }
        for pair in down[..=down_len].windows(2).rev() {
            let level = self.level(pair[0])?;
            steps.push(Step {
                from: pair[1].to_string(),
                to: pair[0].to_string(),
                command: level.enter.clone().ok_or_else(no_path)?,
                password_prompt: level.password_prompt.clone(),
            });
        }
        Ok(steps)
    }
}
