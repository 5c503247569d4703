//! Session storage configuration from TOML (`[session]` section)

use super::expand_home;
use empathy_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Where the session token lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageKind {
    /// Forgotten when the process exits
    #[default]
    Memory,
    /// Persisted to a JSON file
    File,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageKind::Memory),
            "file" | "disk" => Ok(StorageKind::File),
            other => Err(format!("unknown storage kind: {}", other)),
        }
    }
}

/// Raw session configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// `memory` or `file`
    pub storage: String,
    /// Token file for `file` storage; defaults under the data directory
    pub path: Option<String>,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            storage: "memory".to_string(),
            path: None,
        }
    }
}

impl FileSessionConfig {
    /// Parse `storage`, falling back to memory on unknown values.
    pub fn parse_storage(&self) -> (StorageKind, Vec<ConfigIssue>) {
        match self.storage.parse::<StorageKind>() {
            Ok(kind) => (kind, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidValue {
                        field: "session.storage".to_string(),
                        value: self.storage.clone(),
                    },
                    format!(
                        "session.storage: unknown value '{}', falling back to 'memory'",
                        self.storage
                    ),
                );
                (StorageKind::Memory, vec![issue])
            }
        }
    }

    /// Token file location: the configured path, or the platform data dir.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) if !path.trim().is_empty() => Some(expand_home(path)),
            _ => dirs::data_dir().map(|d| d.join("empathy-chat").join("session.json")),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (kind, mut issues) = self.parse_storage();
        if kind == StorageKind::File && self.resolve_path().is_none() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "session.path".to_string(),
                    required_by: "session.storage = \"file\"".to_string(),
                },
                "session.path must be set: no data directory on this platform",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_aliases() {
        assert_eq!("FILE".parse::<StorageKind>(), Ok(StorageKind::File));
        assert_eq!("mem".parse::<StorageKind>(), Ok(StorageKind::Memory));
        assert!("cookie".parse::<StorageKind>().is_err());
    }

    #[test]
    fn test_unknown_storage_falls_back_with_warning() {
        let config = FileSessionConfig {
            storage: "cookie".to_string(),
            path: None,
        };
        let (kind, issues) = config.parse_storage();
        assert_eq!(kind, StorageKind::Memory);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_explicit_path_wins() {
        let config = FileSessionConfig {
            storage: "file".to_string(),
            path: Some("/var/tmp/token.json".to_string()),
        };
        assert_eq!(
            config.resolve_path(),
            Some(PathBuf::from("/var/tmp/token.json"))
        );
        assert!(config.validate().is_empty());
    }
}
