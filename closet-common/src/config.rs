//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default
//!
//! A missing TOML file is never an error: the service starts with defaults
//! and logs a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application folder name used under the OS config/data directories
pub const APP_DIR_NAME: &str = "closet-pilot";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CLOSET_ROOT_FOLDER";

/// Shorter alias for [`ROOT_FOLDER_ENV`], checked second
pub const ROOT_ENV: &str = "CLOSET_ROOT";

/// Environment variables holding the vision API key, in priority order
pub const API_KEY_ENVS: &[&str] = &["CLOSET_OPENAI_API_KEY", "OPENAI_API_KEY"];

/// SQLite database file name inside the root folder
pub const DATABASE_FILE: &str = "closet.db";

/// Blob store directory name inside the root folder
pub const STORAGE_DIR: &str = "storage";

/// Bootstrap configuration loaded from TOML
///
/// Every field has a default so partial files (or none at all) work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Root folder holding the database and stored images
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub vision: VisionSettings,

    /// Origins allowed to call the API from a browser
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Classification model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisionSettings {
    /// API key; environment variables take precedence
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Classify every upload immediately
    #[serde(default)]
    pub auto_classify_on_upload: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            auto_classify_on_upload: false,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            vision: VisionSettings::default(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load configuration, falling back to defaults on any problem
    ///
    /// A missing file is expected on first run; a malformed one is logged.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            info!("No config file at {} (using defaults)", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve the vision API key: environment first, then TOML
    ///
    /// Blank values are ignored.
    pub fn resolved_api_key(&self) -> Option<String> {
        let env_key = API_KEY_ENVS
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|k| is_valid_key(k)).map(|k| (*name, k)));
        let toml_key = self.vision.api_key.clone().filter(|k| is_valid_key(k));

        match (env_key, toml_key) {
            (Some((name, key)), toml_key) => {
                if toml_key.is_some() {
                    warn!("Vision API key set in both {} and TOML. Using {}.", name, name);
                }
                info!("Vision API key loaded from {}", name);
                Some(key.trim().to_string())
            }
            (None, Some(key)) => {
                info!("Vision API key loaded from TOML config");
                Some(key.trim().to_string())
            }
            (None, None) => None,
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default TOML path for a module: `<config_dir>/closet-pilot/<module>.toml`
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(format!("{}.toml", module_name)))
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./closet_data"));

        Self { root_folder }
    }
}

/// Resolves the root folder in priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml_root(mut self, toml_root: Option<PathBuf>) -> Self {
        self.toml_root = toml_root;
        self
    }

    /// TOML file this module reads by default
    pub fn config_path(&self) -> Option<PathBuf> {
        config_file_path(&self.module_name)
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variables
        for name in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(name) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout and names the files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root and storage directories if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!("Creating root folder: {}", self.root_folder.display());
        }
        std::fs::create_dir_all(self.storage_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.root_folder.join(STORAGE_DIR)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
