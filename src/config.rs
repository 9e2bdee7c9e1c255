//! Configuration management for aaaa-sync.

use crate::error::{DdnsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest TTL Route 53 accepts.
const MAX_TTL: u32 = 2_147_483_647;

/// Main configuration structure.
///
/// Everything here has a default; the provider profile, zone and hostname
/// come from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Interface whose addresses are published (default: eth0).
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Kernel interface address table.
    #[serde(default = "default_if_inet6_path")]
    pub if_inet6_path: PathBuf,

    /// TTL written on created or upserted records, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Deadline for each provider call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How new addresses are pushed onto an existing record.
    #[serde(default)]
    pub upsert_mode: UpsertMode,

    /// Directory holding the per-hostname log files.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_if_inet6_path() -> PathBuf {
    PathBuf::from("/proc/net/if_inet6")
}

fn default_ttl() -> u32 {
    300
}

fn default_timeout() -> u64 {
    30
}

/// Shape of the UPSERT batch sent when a record already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UpsertMode {
    /// One single-value UPSERT per newly discovered address.
    ///
    /// Every UPSERT names the same record set, and Route 53 rejects a batch
    /// that changes one name/type twice (`InvalidChangeBatch`). With two or
    /// more new addresses the whole batch fails and nothing is published.
    #[default]
    PerAddress,
    /// One UPSERT carrying the existing values plus every new address.
    Merged,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            if_inet6_path: default_if_inet6_path(),
            ttl: default_ttl(),
            timeout_secs: default_timeout(),
            upsert_mode: UpsertMode::default(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("aaaa-sync").join("config.toml"))
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file is not an error; defaults are returned instead.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject values the provider or the detector cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.interface.trim().is_empty() {
            return Err(DdnsError::Config("interface must not be empty".to_string()));
        }
        if self.ttl == 0 || self.ttl > MAX_TTL {
            return Err(DdnsError::Config(format!(
                "ttl must be between 1 and {}, got {}",
                MAX_TTL, self.ttl
            )));
        }
        if self.timeout_secs == 0 {
            return Err(DdnsError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory for log files, falling back to the platform data dir and
    /// then to the working directory.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|p| p.join("aaaa-sync"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }
}

/// Normalise a hostname to the lower-case, dot-terminated form the
/// provider reports record names in.
pub fn fqdn(hostname: &str) -> String {
    let name = hostname.trim().to_ascii_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{}.", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.ttl, 300);
        assert_eq!(config.if_inet6_path, PathBuf::from("/proc/net/if_inet6"));
        assert_eq!(config.upsert_mode, UpsertMode::PerAddress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            interface = "wlan0"
            upsert_mode = "merged"
            "#,
        )
        .unwrap();

        assert_eq!(config.interface, "wlan0");
        assert_eq!(config.upsert_mode, UpsertMode::Merged);
        assert_eq!(config.ttl, 300);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_upsert_mode_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "upsert_mode = \"append\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, DdnsError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ttl = 60\nlog_dir = \"/tmp/aaaa\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.ttl, 60);
        assert_eq!(config.resolved_log_dir(), PathBuf::from("/tmp/aaaa"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_ttl = Config {
            ttl: 0,
            ..Config::default()
        };
        assert!(zero_ttl.validate().is_err());

        let blank_interface = Config {
            interface: "  ".to_string(),
            ..Config::default()
        };
        assert!(blank_interface.validate().is_err());

        let no_deadline = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert!(no_deadline.validate().is_err());
    }

    #[test]
    fn test_fqdn() {
        assert_eq!(fqdn("Home.Example.com"), "home.example.com.");
        assert_eq!(fqdn("home.example.com."), "home.example.com.");
    }
}
