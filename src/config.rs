//! JSON config loading for sshfsmount.
//!
//! The config file is a single JSON object mapping mount names to mount
//! parameters. A missing or malformed config is a warning, not a fatal
//! error: the tool starts with an empty mount map and still offers the
//! built-in commands.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single mount definition from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountSpec {
    /// Remote spec in `user@host:/path` form
    pub remote: String,

    /// Local mount-point path (may be relative or start with `~`)
    pub local: String,

    /// Volume label; defaults to the mount name when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volname: Option<String>,

    /// SSH port; defaults to 22 when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// The full config: mount name -> parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub mounts: BTreeMap<String, MountSpec>,
}

impl Config {
    /// Well-known config locations, in lookup order.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let Some(home) = dirs::home_dir() else {
            return Vec::new();
        };
        vec![
            home.join(".sshfsmount.json"),
            home.join(".config").join("sshfsmount.json"),
            home.join(".config").join("sshfsmount").join("sshfsmount.json"),
        ]
    }

    /// First existing config file, if any.
    pub fn find_config_file() -> Option<PathBuf> {
        Self::candidate_paths().into_iter().find(|p| p.exists())
    }

    /// Load the config, falling back to an empty mount map when no file
    /// exists or the file fails to parse.
    pub fn load() -> Config {
        let Some(path) = Self::find_config_file() else {
            tracing::warn!("No config file found");
            return Config::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Parse error in config file `{}`: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mount_map() {
        let json = r#"{"work": {"remote": "user@host:/srv", "local": "/tmp/work"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        let spec = &config.mounts["work"];
        assert_eq!(spec.remote, "user@host:/srv");
        assert_eq!(spec.local, "/tmp/work");
        assert!(spec.volname.is_none());
        assert!(spec.port.is_none());
    }

    #[test]
    fn parses_optional_fields() {
        let json = r#"{
            "media": {
                "remote": "alice@nas:/volume1/media",
                "local": "~/mnt/media",
                "volname": "NAS Media",
                "port": 2222
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        let spec = &config.mounts["media"];
        assert_eq!(spec.volname.as_deref(), Some("NAS Media"));
        assert_eq!(spec.port, Some(2222));
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sshfsmount.json");
        std::fs::write(
            &path,
            r#"{"work": {"remote": "user@host:/srv", "local": "/tmp/work"}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.mounts.len(), 1);
        assert!(config.mounts.contains_key("work"));
    }

    #[test]
    fn load_from_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sshfsmount.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
