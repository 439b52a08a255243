//! Configuration resolution for photosel-cs
//!
//! Collaborator endpoints resolve through three tiers with
//! Database → ENV → TOML priority, falling back to local defaults.

use photosel_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default classifier endpoint (local inference sidecar)
pub const DEFAULT_CLASSIFIER_ENDPOINT: &str = "http://127.0.0.1:5742/classify";
/// Default blob-store endpoint (local storage emulator)
pub const DEFAULT_STORAGE_ENDPOINT: &str = "http://127.0.0.1:5743";

const CLASSIFIER_ENV_VAR: &str = "PHOTOSEL_CLASSIFIER_ENDPOINT";
const STORAGE_ENV_VAR: &str = "PHOTOSEL_STORAGE_ENDPOINT";

/// TOML configuration for photosel-cs (~/.config/photosel/photosel-cs.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub classifier_endpoint: Option<String>,
    pub storage_endpoint: Option<String>,
}

/// Load the service TOML config, defaulting when absent
pub fn load_toml_config() -> TomlConfig {
    let Some(path) = toml_config_path() else {
        return TomlConfig::default();
    };
    if !path.exists() {
        return TomlConfig::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

fn toml_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("photosel").join("photosel-cs.toml"))
}

/// Resolve the classifier endpoint from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML → compiled default
pub async fn resolve_classifier_endpoint(
    db: &SqlitePool,
    toml_config: &TomlConfig,
) -> Result<String> {
    resolve_endpoint(
        "classifier",
        crate::db::settings::get_classifier_endpoint(db).await?,
        std::env::var(CLASSIFIER_ENV_VAR).ok(),
        toml_config.classifier_endpoint.clone(),
        DEFAULT_CLASSIFIER_ENDPOINT,
    )
}

/// Resolve the blob-store endpoint from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML → compiled default
pub async fn resolve_storage_endpoint(
    db: &SqlitePool,
    toml_config: &TomlConfig,
) -> Result<String> {
    resolve_endpoint(
        "storage",
        crate::db::settings::get_storage_endpoint(db).await?,
        std::env::var(STORAGE_ENV_VAR).ok(),
        toml_config.storage_endpoint.clone(),
        DEFAULT_STORAGE_ENDPOINT,
    )
}

fn resolve_endpoint(
    name: &str,
    db_value: Option<String>,
    env_value: Option<String>,
    toml_value: Option<String>,
    default: &str,
) -> Result<String> {
    let mut sources = Vec::new();
    if db_value.as_deref().is_some_and(is_valid_endpoint) {
        sources.push("database");
    }
    if env_value.as_deref().is_some_and(is_valid_endpoint) {
        sources.push("environment");
    }
    if toml_value.as_deref().is_some_and(is_valid_endpoint) {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "{} endpoint found in multiple sources: {}. Using {} (highest priority).",
            name,
            sources.join(", "),
            sources[0]
        );
    }

    for (value, source) in [
        (db_value, "database"),
        (env_value, "environment variable"),
        (toml_value, "TOML config"),
    ] {
        if let Some(endpoint) = value {
            if is_valid_endpoint(&endpoint) {
                info!("{} endpoint loaded from {}", name, source);
                return Ok(endpoint.trim().to_string());
            }
        }
    }

    info!("{} endpoint not configured, using default {}", name, default);
    Ok(default.to_string())
}

/// Validate endpoint (non-empty, non-whitespace)
pub fn is_valid_endpoint(endpoint: &str) -> bool {
    !endpoint.trim().is_empty()
}
