//! Config Command
//!
//! Manage Expense Scribe configuration.
//!
//! Usage:
//!   expense-scribe config show [-f toml|json|yaml]
//!   expense-scribe config path
//!   expense-scribe config init [-g] [--force]

use crate::cli::ui::Output;
use crate::cli::util::{Overrides, load_config};
use crate::config::{ConfigFormat, ConfigLoader};
use crate::types::{Result, ScribeError};

/// Parse a `--format` value
pub fn parse_format(format: &str) -> Result<ConfigFormat> {
    match format.to_lowercase().as_str() {
        "toml" | "text" => Ok(ConfigFormat::Toml),
        "json" => Ok(ConfigFormat::Json),
        "yaml" | "yml" => Ok(ConfigFormat::Yaml),
        other => Err(ScribeError::Config(format!(
            "Unknown format '{}'. Valid values: toml, json, yaml",
            other
        ))),
    }
}

/// Show the merged effective configuration
pub fn show(overrides: &Overrides, format: &str) -> Result<()> {
    let config = load_config(overrides)?;
    println!("{}", ConfigLoader::render(&config, parse_format(format)?)?);
    Ok(())
}

/// Show configuration paths
pub fn path(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    ConfigLoader::show_path(&config.ledger.path);
    Ok(())
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    Output::new().success(&format!(
        "Initialized {} configuration",
        if global { "global" } else { "project" }
    ));
    println!("  Config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("text").unwrap(), ConfigFormat::Toml);
        assert_eq!(parse_format("JSON").unwrap(), ConfigFormat::Json);
        assert_eq!(parse_format("yml").unwrap(), ConfigFormat::Yaml);
        assert!(parse_format("xml").is_err());
    }
}
