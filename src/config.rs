//! Configuration Module
//!
//! TOML configuration of the gateway: broker connection, server identity,
//! database metadata echoed by explain, and the per-corpus resources.
//!
//! Every section has workable defaults, so a minimal config only lists its
//! resources. Resource entries are validated at load time; a gateway with a
//! broken registry refuses to start instead of failing per request.

use crate::broker::adapter::AdapterConfig;
use crate::corpus::Resource;
use crate::protocol::GeneralInfo;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConf,
    pub database: DatabaseConf,
    pub broker: BrokerConf,
    /// Corpora exposed through the gateway, keyed by resource id.
    pub resources: BTreeMap<String, Resource>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConf {
    pub name: String,
    pub port: u16,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Database identity echoed by the explain operation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConf {
    pub name: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConf {
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub password: String,
    pub queue_key: String,
    pub channel_result_prefix: String,
    pub channel_query: String,
    pub query_answer_timeout_secs: u64,
    pub result_ttl_secs: u64,
}

impl Default for BrokerConf {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: String::new(),
            queue_key: String::new(),
            channel_result_prefix: String::new(),
            channel_query: String::new(),
            query_answer_timeout_secs: 0,
            result_ttl_secs: 0,
        }
    }
}

impl BrokerConf {
    pub fn server_info(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Adapter tunables; zero values stay zero here and fall back to the
    /// broker defaults when the adapter is built.
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            server_info: self.server_info(),
            queue_key: self.queue_key.clone(),
            channel_result_prefix: self.channel_result_prefix.clone(),
            channel_query: self.channel_query.clone(),
            query_answer_timeout: Duration::from_secs(self.query_answer_timeout_secs),
            result_ttl: Duration::from_secs(self.result_ttl_secs),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (id, resource) in &self.resources {
            if resource.registry_path.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "resource {}: registry_path must not be empty",
                    id
                )));
            }
            if resource.pos_attrs.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "resource {}: pos_attrs must not be empty",
                    id
                )));
            }
            if !resource.pos_attrs.contains(&resource.default_search_attr) {
                return Err(ConfigError::Invalid(format!(
                    "resource {}: default_search_attr {} is not among pos_attrs",
                    id, resource.default_search_attr
                )));
            }
        }
        Ok(())
    }

    /// Identity block echoed by explain; always sourced from config.
    pub fn general_info(&self) -> GeneralInfo {
        GeneralInfo {
            server_name: self.server.name.clone(),
            server_port: self.server.port.to_string(),
            database: self.database.name.clone(),
            database_title: self.database.title.clone(),
            database_description: self.database.description.clone(),
        }
    }
}
