//! Lookup of dialects by inventory device type.

use std::collections::HashMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Dialects by name and alias.
///
/// Lookups ignore case and surrounding whitespace, so a `Device_Type` of
/// `Cisco_XE` finds `cisco_ios`.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
    aliases: HashMap<String, String>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in dialect.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for spec in vendors::BUILTIN {
            registry.register(PlatformDefinition::from_spec(spec)?)?;
        }
        Ok(registry)
    }

    /// Add a dialect under its name and aliases. Names must be unique.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        let name = platform.name.to_lowercase();
        let aliases: Vec<String> = platform.aliases.iter().map(|a| a.to_lowercase()).collect();

        if let Some(taken) = std::iter::once(&name)
            .chain(&aliases)
            .find(|key| self.platforms.contains_key(*key) || self.aliases.contains_key(*key))
        {
            return Err(PlatformError::AlreadyRegistered { name: taken.clone() }.into());
        }

        for alias in aliases {
            self.aliases.insert(alias, name.clone());
        }
        self.platforms.insert(name, platform);
        Ok(())
    }

    pub fn get(&self, device_type: &str) -> Option<&PlatformDefinition> {
        let key = device_type.trim().to_lowercase();
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.platforms.get(key)
    }

    /// Like [`get`](Self::get), but an unknown device type is an error.
    pub fn resolve(&self, device_type: &str) -> Result<&PlatformDefinition> {
        self.get(device_type).ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: device_type.to_string(),
            }
            .into()
        })
    }

    /// Registered dialect names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::cisco_ios;

    #[test]
    fn test_builtins() {
        let registry = PlatformRegistry::with_builtins().unwrap();
        assert_eq!(registry.names(), vec!["arista_eos", "cisco_ios"]);
        assert_eq!(registry.get("arista_eos").unwrap().name, "arista_eos");
    }

    #[test]
    fn test_alias_and_case() {
        let registry = PlatformRegistry::with_builtins().unwrap();
        assert_eq!(registry.get("Cisco_XE").unwrap().name, "cisco_ios");
        assert_eq!(registry.get(" CISCO_IOS ").unwrap().name, "cisco_ios");
        assert!(registry.get("juniper_junos").is_none());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = PlatformRegistry::with_builtins().unwrap();
        let err = registry.resolve("hp_procurve").unwrap_err();
        assert!(err.to_string().contains("unknown platform 'hp_procurve'"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut registry = PlatformRegistry::with_builtins().unwrap();
        let mut copy = cisco_ios::platform().unwrap();
        copy.name = "ios_lab".into();

        let err = registry.register(copy).unwrap_err();
        assert!(err.to_string().contains("already registered: 'cisco_xe'"));
        assert!(registry.get("ios_lab").is_none());
    }
}
