use crate::codec::Encoding;
use crate::filter::FilterGroup;
use crate::session::DataSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub url: UrlRules,
    pub suggestions: SuggestionRules,
    /// Attributes offered by the local suggestion catalog
    pub catalog: Vec<CatalogAttribute>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: UrlRules::default(),
            suggestions: SuggestionRules::default(),
            catalog: default_catalog(),
        }
    }
}

/// How filter groups are persisted in the URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlRules {
    pub param: String,
    pub encoding: Encoding,
}

impl Default for UrlRules {
    fn default() -> Self {
        Self {
            param: "search".to_string(),
            encoding: Encoding::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionRules {
    pub data_source: DataSource,
    pub max_results: usize,
    /// Example queries offered as suggested filters, one token list each
    pub examples: Vec<Vec<String>>,
}

impl SuggestionRules {
    pub fn example_groups(&self) -> Vec<FilterGroup> {
        self.examples.iter().map(FilterGroup::from_tokens).collect()
    }
}

impl Default for SuggestionRules {
    fn default() -> Self {
        Self {
            data_source: DataSource::Traces,
            max_results: 10,
            examples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAttribute {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
    /// Restrict the attribute to one data source; `None` means all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
}

fn default_catalog() -> Vec<CatalogAttribute> {
    let attr = |key: &str, values: &[&str]| CatalogAttribute {
        key: key.to_string(),
        values: values.iter().map(|v| v.to_string()).collect(),
        data_source: None,
    };
    vec![
        attr("resource_service_name", &["frontend", "cart", "checkout"]),
        attr("tag_http_method", &["GET", "POST", "PUT", "DELETE"]),
        attr("tag_http_status_code", &["200", "404", "500"]),
        attr("resource_deployment_environment", &["prod", "staging"]),
    ]
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<EngineConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static EngineConfig {
    static DEFAULT_CONFIG: LazyLock<EngineConfig> = LazyLock::new(EngineConfig::default);
    &DEFAULT_CONFIG
}
