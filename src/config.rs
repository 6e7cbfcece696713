//! Configuration for kinesis.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (KINESIS_HOME, KINESIS_LIBRARY, KINESIS_API_KEY,
//!    KINESIS_PROVIDER_URL)
//! 2. Config file (.kinesis/config.yaml)
//! 3. Defaults (~/.kinesis)
//!
//! Config file discovery:
//! - Searches current directory and parents for .kinesis/config.yaml
//! - Paths in config file are relative to the config file's parent directory
//!
//! The API key is only ever checked for presence by the engine. Besides the
//! environment and the config file it may live in `$KINESIS_HOME/api.key`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::bulk::DEFAULT_CHUNK_SIZE;
use crate::core::pagination::{PaginationSettings, DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Name of the key file inside the home directory
pub const API_KEY_FILE: &str = "api.key";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .kinesis/)
    pub home: Option<String>,
    /// Library catalog file (relative to the project root)
    pub library: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the content provider service
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationConfig {
    pub page_delay_ms: Option<u64>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkConfig {
    pub chunk_size: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to kinesis home (state, key file)
    pub home: PathBuf,
    /// Path to the library catalog file
    pub library_path: PathBuf,
    /// Content provider base URL
    pub provider_endpoint: Option<String>,
    /// Credential for the elevated channel listing
    pub api_key: Option<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub pagination: PaginationSettings,
    pub chunk_size: usize,
}

impl ResolvedConfig {
    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".kinesis").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Read a key file, ignoring surrounding whitespace. Missing or empty files
/// yield `None`.
fn read_key_file(path: &Path) -> Option<String> {
    let key = std::fs::read_to_string(path).ok()?;
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Merge a parsed config file (if any) with the environment
fn resolve(config_file: Option<PathBuf>, config: ConfigFile, default_home: PathBuf) -> ResolvedConfig {
    // .kinesis/ and the project root above it
    let kinesis_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    let base_dir = kinesis_dir.parent().unwrap_or(Path::new("."));

    let home = if let Some(env_home) = env_var("KINESIS_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(home_path), Some(_)) = (config.paths.home.as_ref(), config_file.as_ref()) {
        resolve_path(kinesis_dir, home_path)
    } else {
        default_home
    };

    let library_path = if let Some(env_lib) = env_var("KINESIS_LIBRARY") {
        PathBuf::from(env_lib)
    } else if let (Some(lib_path), Some(_)) = (config.paths.library.as_ref(), config_file.as_ref()) {
        resolve_path(base_dir, lib_path)
    } else {
        home.join("library.json")
    };

    let provider_endpoint = env_var("KINESIS_PROVIDER_URL").or(config.provider.endpoint);

    let api_key = env_var("KINESIS_API_KEY")
        .or(config.provider.api_key)
        .or_else(|| read_key_file(&home.join(API_KEY_FILE)));

    let pagination = PaginationSettings {
        page_delay: config
            .pagination
            .page_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PAGE_DELAY),
        max_pages: config.pagination.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
    };

    ResolvedConfig {
        home,
        library_path,
        provider_endpoint,
        api_key,
        config_file,
        pagination,
        chunk_size: config.bulk.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    // Default home directory
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".kinesis");

    let config_file = find_config_file();
    let config = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(config_file, config, default_home))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
