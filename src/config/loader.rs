//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (<config dir>/expense-scribe/config.toml)
//! 3. Project config (.expense-scribe/config.toml)
//! 4. Environment variables (EXPENSE_SCRIBE_ prefix, `__` for nesting)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, ScribeError};

const ENV_PREFIX: &str = "EXPENSE_SCRIBE_";
const PROJECT_DIR: &str = ".expense-scribe";
const CONFIG_FILE: &str = "config.toml";

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let global = Self::global_config_path();
        Self::load_layered(global.as_deref(), &Self::project_config_path(), ENV_PREFIX)
    }

    fn load_layered(global: Option<&Path>, project: &Path, env_prefix: &str) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // EXPENSE_SCRIBE_LLM__MODEL -> llm.model
        figment = figment.merge(Env::prefixed(env_prefix).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ScribeError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ScribeError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (platform config dir + expense-scribe)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "expense-scribe").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(PROJECT_DIR)
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join(CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(ledger: &Path) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        let exists = if ledger.exists() { "✓" } else { "✗" };
        println!("  Ledger:  {} {}", exists, ledger.display());
    }

    /// Render the effective configuration
    pub fn render(config: &Config, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            ConfigFormat::Yaml => Ok(serde_yaml::to_string(config)?),
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| ScribeError::Config(e.to_string()))
            }
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a default config file, globally or for the current project.
    ///
    /// An existing file is kept unless `force` is set.
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let dir = if global {
            Self::global_dir().ok_or_else(|| {
                ScribeError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_dir()
        };
        Self::init_in(&dir, force)
    }

    fn init_in(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config content (TOML)
    fn default_config() -> String {
        r#"# Expense Scribe Configuration
# Project settings in .expense-scribe/config.toml override the global file.
# Environment: EXPENSE_SCRIBE_LLM__MODEL=gemini-2.5-pro and so on.

version = "1.0"

[llm]
# gemini | openai | mock
provider = "gemini"
# model = "gemini-2.5-flash"
# api_key: prefer GEMINI_API_KEY / OPENAI_API_KEY
temperature = 0.1
timeout_secs = 30
max_tokens = 1024

[retry]
max_attempts = 3
base_delay_ms = 1000
max_delay_ms = 30000
jitter = true

[defaults]
currency = "USD"
paid_by = "Me"

[ledger]
path = ".expense-scribe/ledger.db"
summary_limit = 10

[input]
max_file_size_mb = 20
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NO_ENV: &str = "EXPENSE_SCRIBE_LOADER_TEST_UNUSED_";

    #[test]
    fn test_defaults_without_files() {
        let temp = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_layered(None, &temp.path().join("missing.toml"), NO_ENV).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "gemini");
    }

    #[test]
    fn test_default_file_parses_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = ConfigLoader::init_in(temp.path(), false).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        let defaults = Config::default();
        assert_eq!(config.llm.provider, defaults.llm.provider);
        assert_eq!(config.retry.max_attempts, defaults.retry.max_attempts);
        assert_eq!(config.ledger.path, defaults.ledger.path);
        assert_eq!(config.defaults, defaults.defaults);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        let project = temp.path().join("project.toml");
        fs::write(&global, "[llm]\nprovider = \"openai\"\n[defaults]\ncurrency = \"EUR\"\n")
            .unwrap();
        fs::write(&project, "[defaults]\ncurrency = \"PHP\"\n").unwrap();

        let config = ConfigLoader::load_layered(Some(&global), &project, NO_ENV).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.defaults.currency, "PHP");
        assert_eq!(config.defaults.paid_by, "Me");
    }

    #[test]
    fn test_env_override_uses_double_underscore() {
        let prefix = "EXPENSE_SCRIBE_LOADER_TEST_ENV_";
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var(format!("{}LLM__MODEL", prefix), "test-model");
        }
        let temp = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_layered(None, &temp.path().join("none.toml"), prefix).unwrap();
        unsafe {
            std::env::remove_var(format!("{}LLM__MODEL", prefix));
        }
        assert_eq!(config.llm.model.as_deref(), Some("test-model"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ScribeError::Config(_)));
    }

    #[test]
    fn test_init_keeps_existing_unless_forced() {
        let temp = TempDir::new().unwrap();
        let path = ConfigLoader::init_in(temp.path(), false).unwrap();
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::init_in(temp.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::init_in(temp.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[llm]"));
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml = ConfigLoader::render(&config, ConfigFormat::Toml).unwrap();
        assert!(toml.contains("[llm]"));
        let json = ConfigLoader::render(&config, ConfigFormat::Json).unwrap();
        assert!(json.contains("\"summary_limit\": 10"));
        let yaml = ConfigLoader::render(&config, ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("paid_by: Me"));
    }
}
