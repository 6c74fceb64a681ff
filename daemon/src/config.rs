//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use anyhow::Context;
use matric_types::AdmissionParams;
use matric_utils::LogFormat;
use serde::{Deserialize, Serialize};

/// Configuration for `matricd`.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; CLI flags
/// and `MATRIC_*` environment variables override individual fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// LMDB environment directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File that outgoing notifications are appended to, one JSON object
    /// per line, for the mail relay to pick up.
    #[serde(default = "default_outbox_path")]
    pub outbox_path: PathBuf,

    /// Root directory that photo and document references resolve against.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default)]
    pub params: AdmissionParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./matric_data")
}

fn default_outbox_path() -> PathBuf {
    PathBuf::from("./matric_data/outbox.jsonl")
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size_mb() -> usize {
    256
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.params.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            outbox_path: default_outbox_path(),
            documents_dir: default_documents_dir(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            map_size_mb: default_map_size_mb(),
            params: AdmissionParams::default(),
        }
    }
}
