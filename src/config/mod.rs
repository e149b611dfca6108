//! Configuration loading and management
//!
//! Configuration comes from an optional YAML file, then `NEXUS_*`
//! environment variables override individual fields. [`NexusConfig::validate`]
//! runs once at startup; nothing reads the process environment afterwards.

use crate::core::error::{ConfigError, NexusResult};
use crate::core::runtime::{DEFAULT_HOST_APP_MARKER, RuntimeDetector};
use crate::core::service::MAX_LIST_RESULTS;
use crate::storage::file::STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Environment variable naming the config file when no CLI argument is given
pub const CONFIG_ENV: &str = "NEXUS_CONFIG";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Origin used when building share links (e.g. `https://nexus.example`)
    pub public_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            public_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
    Postgres,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => f.write_str("memory"),
            StorageBackend::File => f.write_str("file"),
            StorageBackend::Postgres => f.write_str("postgres"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// JSON file for the `file` backend
    pub path: Option<String>,

    /// Top-level key of the record list in the JSON file
    pub storage_key: String,

    /// Service-role connection string for the `postgres` backend
    pub url: Option<String>,

    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: Some("nexus-transactions.json".to_string()),
            storage_key: STORAGE_KEY.to_string(),
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Default and maximum page size of `GET /transactions`
    pub max_results: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_LIST_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// User-agent fragment identifying the host app
    pub host_app_marker: String,
    /// Badge label of the host app; derived from the marker when unset
    pub host_app_name: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host_app_marker: DEFAULT_HOST_APP_MARKER.to_string(),
            host_app_name: None,
        }
    }
}

impl RuntimeConfig {
    pub fn detector(&self) -> RuntimeDetector {
        let detector = RuntimeDetector::new(self.host_app_marker.clone());
        match self.host_app_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => detector.with_host_app_name(name),
            _ => detector,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub listing: ListingConfig,
    pub runtime: RuntimeConfig,
}

impl NexusConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> NexusResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string(),
            },
            _ => ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            },
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> NexusResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// File (if any), then process environment, then validation
    pub fn load(path: Option<&str>) -> NexusResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `NEXUS_*` overrides from `vars`; unrelated variables are ignored
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> NexusResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value: String = value.into();
            match key.as_ref() {
                "NEXUS_BIND" => self.server.bind = value,
                "NEXUS_PUBLIC_ORIGIN" => self.server.public_origin = value,
                "NEXUS_STORAGE_BACKEND" => {
                    self.storage.backend = value.parse().map_err(|message| {
                        ConfigError::InvalidValue {
                            field: "storage.backend".to_string(),
                            value: value.clone(),
                            message,
                        }
                    })?;
                }
                "NEXUS_STORAGE_PATH" => self.storage.path = Some(value),
                "NEXUS_DATABASE_URL" => self.storage.url = Some(value),
                "NEXUS_MAX_RESULTS" => {
                    self.listing.max_results =
                        value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                            field: "listing.max_results".to_string(),
                            value: value.clone(),
                            message: "expected a positive integer".to_string(),
                        })?;
                }
                "NEXUS_HOST_APP_MARKER" => self.runtime.host_app_marker = value,
                "NEXUS_HOST_APP_NAME" => self.runtime.host_app_name = Some(value),
                _ => {}
            }
        }
        Ok(())
    }

    /// Check the whole configuration, reporting the first problem found
    pub fn validate(&self) -> NexusResult<()> {
        self.bind_addr()?;

        let origin = &self.server.public_origin;
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "server.public_origin".to_string(),
                value: origin.clone(),
                message: "must start with http:// or https://".to_string(),
            }
            .into());
        }

        if !(1..=MAX_LIST_RESULTS).contains(&self.listing.max_results) {
            return Err(ConfigError::InvalidValue {
                field: "listing.max_results".to_string(),
                value: self.listing.max_results.to_string(),
                message: format!("must be between 1 and {}", MAX_LIST_RESULTS),
            }
            .into());
        }

        match self.storage.backend {
            StorageBackend::Memory => {}
            StorageBackend::File => {
                if self.storage.path.as_deref().is_none_or(|p| p.trim().is_empty()) {
                    return Err(ConfigError::MissingField {
                        field: "storage.path".to_string(),
                        context: "file storage".to_string(),
                    }
                    .into());
                }
                if self.storage.storage_key.trim().is_empty() {
                    return Err(ConfigError::MissingField {
                        field: "storage.storage_key".to_string(),
                        context: "file storage".to_string(),
                    }
                    .into());
                }
            }
            StorageBackend::Postgres => {
                if self.storage.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    return Err(ConfigError::MissingField {
                        field: "storage.url".to_string(),
                        context: "postgres storage".to_string(),
                    }
                    .into());
                }
                if !cfg!(feature = "postgres") {
                    return Err(ConfigError::InvalidValue {
                        field: "storage.backend".to_string(),
                        value: self.storage.backend.to_string(),
                        message: "built without the 'postgres' feature".to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Parsed listen address
    pub fn bind_addr(&self) -> NexusResult<SocketAddr> {
        self.server.bind.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }
}
