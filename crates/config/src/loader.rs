//! Configuration loading utilities

use crate::{settings::ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};
use thiserror::Error;

/// Config file stem, resolved to `.toml`, `.json` or `.yaml`
pub const DEFAULT_CONFIG_PATH: &str = "config/config";

/// Prefix of environment overrides, e.g. `SWAPQUOTE__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "SWAPQUOTE";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
	#[error("Failed to read configuration: {0}")]
	Source(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load from `$CONFIG_PATH` (or `config/config`) plus environment overrides
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
	load_config_from(&path)
}

pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	let settings: Settings = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(
			Environment::with_prefix(ENV_PREFIX)
				.prefix_separator("__")
				.separator("__")
				.try_parsing(true),
		)
		.build()?
		.try_deserialize()?;

	settings.validate()?;
	Ok(settings)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_missing_file_yields_defaults() {
		let settings = load_config_from("does/not/exist").unwrap();
		assert_eq!(settings.engine.debounce_ms, 300);
	}

	#[test]
	fn test_load_toml_file() {
		let dir = std::env::temp_dir().join(format!("swapquote-config-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("config.toml");
		let mut file = std::fs::File::create(&path).unwrap();
		writeln!(
			file,
			r#"
[engine]
refresh_interval_ms = 10000

[[adapters]]
kind = "paraswap"

[[adapters]]
kind = "cowswap"
timeout_ms = 2000
"#
		)
		.unwrap();

		let stem = dir.join("config");
		let settings = load_config_from(stem.to_str().unwrap()).unwrap();
		assert_eq!(settings.engine.refresh_interval_ms, 10_000);
		assert_eq!(settings.adapters.len(), 2);
		assert_eq!(settings.adapters[1].timeout_ms, Some(2_000));

		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn test_invalid_file_fails_validation() {
		let dir = std::env::temp_dir().join(format!("swapquote-invalid-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		std::fs::write(
			dir.join("config.toml"),
			"[engine]\nadapter_timeout_ms = 5\n",
		)
		.unwrap();

		let stem = dir.join("config");
		let err = load_config_from(stem.to_str().unwrap()).unwrap_err();
		assert!(matches!(err, ConfigLoadError::Validation(_)));

		std::fs::remove_dir_all(&dir).ok();
	}
}
