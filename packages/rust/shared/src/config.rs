//! Application configuration for TrainSet.
//!
//! User config lives at `~/.trainset/trainset.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file; only the name of the environment
//! variable holding the key is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainSetError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "trainset.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".trainset";

// ---------------------------------------------------------------------------
// Config structs (matching trainset.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Page fetch settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Pipeline defaults.
    #[serde(default)]
    pub pipeline: PipelineDefaults,
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for both URL discovery and annotation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Generative Language API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout for model calls.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model_timeout() -> u64 {
    120
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Per-URL fetch timeout.
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_scrape_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_scrape_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefaults {
    /// Maximum characters per annotation chunk.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Number of URLs requested from discovery.
    #[serde(default = "default_url_count")]
    pub url_count: usize,

    /// Number of pairs shown in the run preview.
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,

    /// Directory that receives the exported files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Save raw model output for chunks that failed to parse.
    #[serde(default = "default_true")]
    pub write_diagnostics: bool,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            url_count: default_url_count(),
            preview_count: default_preview_count(),
            output_dir: default_output_dir(),
            write_diagnostics: true,
        }
    }
}

fn default_max_chunk_chars() -> usize {
    3000
}
fn default_url_count() -> usize {
    3
}
fn default_preview_count() -> usize {
    3
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum characters per chunk. Must be positive.
    pub max_chunk_chars: usize,
    /// Number of URLs requested from discovery. Must be positive.
    pub url_count: usize,
    /// Number of pairs kept in the report preview.
    pub preview_count: usize,
    /// Save raw output of malformed chunks through the export sink.
    pub write_diagnostics: bool,
}

impl PipelineConfig {
    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            return Err(TrainSetError::invalid_config(
                "max_chunk_chars must be a positive integer",
            ));
        }
        if self.url_count == 0 {
            return Err(TrainSetError::invalid_config(
                "url_count must be a positive integer",
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_chunk_chars: config.pipeline.max_chunk_chars,
            url_count: config.pipeline.url_count,
            preview_count: config.pipeline.preview_count,
            write_diagnostics: config.pipeline.write_diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.trainset/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrainSetError::invalid_config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.trainset/trainset.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TrainSetError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TrainSetError::invalid_config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TrainSetError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)
        .map_err(|e| TrainSetError::invalid_config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TrainSetError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the model API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.model.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(TrainSetError::invalid_config(format!(
            "model API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://aistudio.google.com/apikey"
        ))),
    }
}
