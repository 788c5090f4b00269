use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::domain::invoice::DocumentNumbering;

// Default timeout functions
fn default_db_connect_timeout() -> u64 {
  5
}

fn default_db_acquire_timeout() -> u64 {
  3
}

fn default_max_connections() -> u32 {
  5
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub database: DatabaseConfig,
  #[serde(default)]
  pub numbering: DocumentNumbering,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
  pub url: String,
  #[serde(default = "default_max_connections")]
  pub max_connections: u32,
  #[serde(default = "default_db_connect_timeout")]
  pub connect_timeout_seconds: u64,
  #[serde(default = "default_db_acquire_timeout")]
  pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
  pub fn connect_timeout(&self) -> Duration {
    Duration::from_secs(self.connect_timeout_seconds)
  }

  pub fn acquire_timeout(&self) -> Duration {
    Duration::from_secs(self.acquire_timeout_seconds)
  }
}

impl Config {
  /// Load configuration from files and environment variables
  ///
  /// Later sources override earlier ones:
  /// 1. config/default.toml
  /// 2. config/local.toml (if exists)
  /// 3. config/{RUN_MODE}.toml (if exists)
  /// 4. Environment variables with the TRADEINVOICE_ prefix, double
  ///    underscore between sections, e.g. `TRADEINVOICE_DATABASE__URL` or
  ///    `TRADEINVOICE_NUMBERING__PACKING_LIST_PREFIX`
  pub fn load() -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    let config = ConfigBuilder::builder()
      .add_source(File::with_name("config/default").required(true))
      .add_source(File::with_name("config/local").required(false))
      .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
      .add_source(
        Environment::with_prefix("TRADEINVOICE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;

    config.try_deserialize()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_structure() {
    let toml = r#"
            [database]
            url = "postgres://localhost/tradeinvoice"
            max_connections = 10

            [numbering]
            commercial_suffix = "-CI"
        "#;

    let config: Config = toml::from_str(toml).expect("Failed to parse config");

    assert_eq!(config.database.url, "postgres://localhost/tradeinvoice");
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.database.connect_timeout_seconds, 5); // default
    assert_eq!(config.database.acquire_timeout(), Duration::from_secs(3));
    assert_eq!(config.numbering.commercial_suffix, "-CI");
    assert_eq!(config.numbering.packing_list_prefix, "PL-"); // default
  }

  #[test]
  fn test_numbering_section_is_optional() {
    let toml = r#"
            [database]
            url = "postgres://localhost/tradeinvoice"
        "#;

    let config: Config = toml::from_str(toml).expect("Failed to parse config");
    assert_eq!(config.database.max_connections, 5);
    assert_eq!(config.numbering, DocumentNumbering::default());
  }
}
