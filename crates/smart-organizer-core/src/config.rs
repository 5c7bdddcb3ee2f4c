use crate::analyzer::ApiFlavor;
use crate::error::Error;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_LOG_DIR: &str = "~/FileOrganizer_Logs";

/// A top-level folder the passes run over, e.g. `Downloads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootFolder {
    pub name: String,
    pub path: String,
}

impl RootFolder {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub model: String,
    pub api_base: String,
    pub flavor: ApiFlavor,
    pub timeout_secs: u64,
    pub verify_on_start: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-3.5-turbo".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            flavor: ApiFlavor::Chat,
            timeout_secs: 30,
            verify_on_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_dir: String,
    pub ignore_patterns: Vec<String>,
    pub roots: Vec<RootFolder>,
    pub ai: AiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: DEFAULT_LOG_DIR.to_string(),
            ignore_patterns: Vec::new(),
            roots: vec![
                RootFolder::new("Desktop", "~/Desktop"),
                RootFolder::new("Downloads", "~/Downloads"),
                RootFolder::new("Documents", "~/Documents"),
            ],
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn log_dir_path(&self) -> PathBuf {
        expand_home(&self.log_dir)
    }

    /// Roots whose name matches one of `names` (case-insensitive). An empty
    /// filter keeps every root.
    pub fn select_roots(&self, names: &[String]) -> Vec<RootFolder> {
        if names.is_empty() {
            return self.roots.clone();
        }

        for name in names {
            if !self.roots.iter().any(|r| r.name.eq_ignore_ascii_case(name)) {
                warn!("Unknown folder '{}' ignored", name);
            }
        }

        self.roots
            .iter()
            .filter(|r| names.iter().any(|n| r.name.eq_ignore_ascii_case(n)))
            .cloned()
            .collect()
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Layered load: built-in defaults, then an optional `Config.toml`, then
/// `ORGANIZER__*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("ORGANIZER").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}
