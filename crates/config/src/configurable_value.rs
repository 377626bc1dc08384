//! Config values that are either literal or read from the environment at startup
//!
//! Used for API keys and RPC URLs so secrets never have to live in the config file. Both
//! of these forms are accepted:
//!
//! ```toml
//! api_key = "env:ZEROX_API_KEY"
//! api_key = { type = "env", value = "ZEROX_API_KEY" }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use swapquote_types::SecretString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	Env,
	Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurableValue {
	pub value_type: ValueType,
	/// Environment variable name or the literal value
	pub value: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigurableValueError {
	#[error("Environment variable '{0}' is not set")]
	EnvironmentVariableNotFound(String),

	#[error("Environment variable '{0}' is set but empty")]
	EnvironmentVariableEmpty(String),
}

impl ConfigurableValue {
	pub fn from_env(env_var_name: &str) -> Self {
		Self {
			value_type: ValueType::Env,
			value: env_var_name.to_string(),
		}
	}

	pub fn from_plain(plain_value: &str) -> Self {
		Self {
			value_type: ValueType::Plain,
			value: plain_value.to_string(),
		}
	}

	pub fn resolve(&self) -> Result<String, ConfigurableValueError> {
		match self.value_type {
			ValueType::Plain => Ok(self.value.clone()),
			ValueType::Env => match std::env::var(&self.value) {
				Ok(v) if v.trim().is_empty() => Err(
					ConfigurableValueError::EnvironmentVariableEmpty(self.value.clone()),
				),
				Ok(v) => Ok(v),
				Err(_) => Err(ConfigurableValueError::EnvironmentVariableNotFound(
					self.value.clone(),
				)),
			},
		}
	}

	pub fn resolve_secret(&self) -> Result<SecretString, ConfigurableValueError> {
		self.resolve().map(SecretString::from)
	}
}

// Plain values are usually secrets
impl fmt::Display for ConfigurableValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.value_type {
			ValueType::Env => write!(f, "env:{}", self.value),
			ValueType::Plain => f.write_str("plain:[REDACTED]"),
		}
	}
}

/// `"env:NAME"` reads the environment, anything else is plain
impl From<&str> for ConfigurableValue {
	fn from(value: &str) -> Self {
		match value.strip_prefix("env:") {
			Some(env_var) => Self::from_env(env_var),
			None => Self::from_plain(value),
		}
	}
}

#[derive(Serialize, Deserialize)]
struct Tagged {
	#[serde(rename = "type")]
	value_type: ValueType,
	value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
	Short(String),
	Tagged(Tagged),
}

/// Serializes in tagged form; plain values are redacted so settings can be logged
impl Serialize for ConfigurableValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let value = match self.value_type {
			ValueType::Env => self.value.clone(),
			ValueType::Plain => "[REDACTED]".to_string(),
		};
		Tagged {
			value_type: self.value_type,
			value,
		}
		.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for ConfigurableValue {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(match Wire::deserialize(deserializer)? {
			Wire::Short(value) => Self::from(value.as_str()),
			Wire::Tagged(tagged) => Self {
				value_type: tagged.value_type,
				value: tagged.value,
			},
		})
	}
}
