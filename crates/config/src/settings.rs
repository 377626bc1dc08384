//! Configuration settings structures

use crate::configurable_value::ConfigurableValue;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use swapquote_types::constants::limits::{
	DEFAULT_ADAPTER_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_OBSERVED_FINGERPRINTS,
	DEFAULT_ORACLE_TIMEOUT_MS, DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_WATCH_IDLE_TIMEOUT_MS,
	MAX_ADAPTER_TIMEOUT_MS, MIN_ADAPTER_TIMEOUT_MS, MIN_REFRESH_INTERVAL_MS,
};
use swapquote_types::{AdapterKind, NetworkId, NetworkProfile};
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub engine: EngineSettings,
	/// Network catalog; the built-in catalog is used when empty
	pub networks: Vec<NetworkSettings>,
	/// Adapters in registration (tie-break) order
	pub adapters: Vec<AdapterSettings>,
	pub oracles: OracleSettings,
	pub logging: LoggingSettings,
	pub environment: EnvironmentSettings,
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
	/// Maximum request body size in bytes
	pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 3000,
			body_limit_bytes: 64 * 1024,
		}
	}
}

/// Fetch and refresh tuning
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
	pub refresh_interval_ms: u64,
	pub debounce_ms: u64,
	/// Default per-adapter call timeout
	pub adapter_timeout_ms: u64,
	/// Timeout of each individual oracle lookup
	pub oracle_timeout_ms: u64,
	/// Upper bound on concurrently observed fingerprints
	pub max_observed_fingerprints: usize,
	/// Observations nobody holds a receiver for are released after going unread this long
	pub watch_idle_timeout_ms: u64,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
			debounce_ms: DEFAULT_DEBOUNCE_MS,
			adapter_timeout_ms: DEFAULT_ADAPTER_TIMEOUT_MS,
			oracle_timeout_ms: DEFAULT_ORACLE_TIMEOUT_MS,
			max_observed_fingerprints: DEFAULT_MAX_OBSERVED_FINGERPRINTS,
			watch_idle_timeout_ms: DEFAULT_WATCH_IDLE_TIMEOUT_MS,
		}
	}
}

/// One network catalog entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkSettings {
	pub id: String,
	pub chain_id: u64,
	#[serde(default = "default_native_decimals")]
	pub native_decimals: u8,
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
	/// Transactions pay an extra fee for publishing data to a settlement layer
	#[serde(default)]
	pub settlement_data_fee: bool,
	/// JSON-RPC endpoint used by the RPC fee oracle
	#[serde(default)]
	pub rpc_url: Option<ConfigurableValue>,
}

fn default_native_decimals() -> u8 {
	18
}

fn default_native_symbol() -> String {
	"ETH".to_string()
}

impl From<&NetworkSettings> for NetworkProfile {
	fn from(settings: &NetworkSettings) -> Self {
		let mut profile = NetworkProfile::new(
			settings.id.as_str(),
			settings.chain_id,
			&settings.native_symbol,
		);
		profile.native_decimals = settings.native_decimals;
		profile.has_settlement_data_fee = settings.settlement_data_fee;
		profile
	}
}

/// Individual adapter configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdapterSettings {
	pub kind: AdapterKind,
	/// Registry name; defaults to the kind's display name
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	#[serde(default)]
	pub endpoint: Option<String>,
	/// Base URL used for requests with privacy enabled
	#[serde(default)]
	pub privacy_endpoint: Option<String>,
	/// Overrides `engine.adapter_timeout_ms`
	#[serde(default)]
	pub timeout_ms: Option<u64>,
	#[serde(default)]
	pub api_key: Option<ConfigurableValue>,
	#[serde(default)]
	pub headers: HashMap<String, String>,
	/// Restrict to these networks
	#[serde(default)]
	pub networks: Option<Vec<String>>,
}

fn default_enabled() -> bool {
	true
}

impl AdapterSettings {
	pub fn new(kind: AdapterKind) -> Self {
		Self {
			kind,
			name: None,
			enabled: true,
			endpoint: None,
			privacy_endpoint: None,
			timeout_ms: None,
			api_key: None,
			headers: HashMap::new(),
			networks: None,
		}
	}

	pub fn display_name(&self) -> &str {
		self.name.as_deref().unwrap_or(self.kind.default_name())
	}
}

/// Oracle selection
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OracleSettings {
	pub fee: FeeOracleSettings,
	pub price: PriceOracleSettings,
}

/// Fee oracle backend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeeOracleSettings {
	/// Fixed readings per network
	Static {
		#[serde(default)]
		gas_price_wei: HashMap<String, f64>,
		#[serde(default)]
		native_usd: HashMap<String, f64>,
		/// Settlement data fee per payload byte
		#[serde(default)]
		data_fee_wei_per_byte: HashMap<String, f64>,
	},
	/// JSON-RPC against `networks[].rpc_url`
	Rpc,
}

impl Default for FeeOracleSettings {
	fn default() -> Self {
		Self::Static {
			gas_price_wei: HashMap::new(),
			native_usd: HashMap::new(),
			data_fee_wei_per_byte: HashMap::new(),
		}
	}
}

/// Asset price oracle backend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PriceOracleSettings {
	/// Fixed prices keyed by `network:address` (lowercase address)
	Static {
		#[serde(default)]
		prices: HashMap<String, f64>,
	},
	/// DefiLlama coins API
	Llama {
		#[serde(default)]
		endpoint: Option<String>,
	},
}

impl Default for PriceOracleSettings {
	fn default() -> Self {
		Self::Static {
			prices: HashMap::new(),
		}
	}
}

/// Environment-specific settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EnvironmentSettings {
	pub profile: EnvironmentProfile,
	pub debug: bool,
}

impl Default for EnvironmentSettings {
	fn default() -> Self {
		Self {
			profile: EnvironmentProfile::Development,
			debug: true,
		}
	}
}

/// Environment profiles
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentProfile {
	Development,
	Staging,
	Production,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	/// Include targets and thread ids
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Configuration that parsed but makes no sense
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
	#[error("{field} = {value}ms is outside {min}..={max}ms")]
	TimeoutOutOfRange {
		field: String,
		value: u64,
		min: u64,
		max: u64,
	},

	#[error("refresh interval {value}ms is below the {min}ms minimum")]
	RefreshIntervalTooShort { value: u64, min: u64 },

	#[error("max_observed_fingerprints must be at least 1")]
	NoObservationCapacity,

	#[error("Network '{id}' is defined more than once")]
	DuplicateNetwork { id: String },

	#[error("Adapter name '{name}' is used more than once")]
	DuplicateAdapter { name: String },

	#[error("Adapter '{adapter}' references unknown network '{network}'")]
	UnknownNetwork { adapter: String, network: String },

	#[error("RPC fee oracle requires rpc_url on network '{network}'")]
	MissingRpcUrl { network: String },
}

impl Settings {
	/// Get server bind address
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.server.host, self.server.port)
	}

	/// Enabled adapters, in configured order
	pub fn enabled_adapters(&self) -> impl Iterator<Item = &AdapterSettings> {
		self.adapters.iter().filter(|a| a.enabled)
	}

	/// Configured network catalog, or the built-in one
	pub fn network_catalog(&self) -> Vec<NetworkProfile> {
		if self.networks.is_empty() {
			NetworkProfile::defaults()
		} else {
			self.networks.iter().map(NetworkProfile::from).collect()
		}
	}

	pub fn adapter_timeout_ms(&self, adapter: &AdapterSettings) -> u64 {
		adapter.timeout_ms.unwrap_or(self.engine.adapter_timeout_ms)
	}

	pub fn is_production(&self) -> bool {
		self.environment.profile == EnvironmentProfile::Production
	}

	pub fn is_debug(&self) -> bool {
		self.environment.debug && !self.is_production()
	}

	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		check_timeout("engine.adapter_timeout_ms", self.engine.adapter_timeout_ms)?;
		check_timeout("engine.oracle_timeout_ms", self.engine.oracle_timeout_ms)?;

		if self.engine.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
			return Err(ConfigValidationError::RefreshIntervalTooShort {
				value: self.engine.refresh_interval_ms,
				min: MIN_REFRESH_INTERVAL_MS,
			});
		}
		if self.engine.max_observed_fingerprints == 0 {
			return Err(ConfigValidationError::NoObservationCapacity);
		}

		let mut network_ids = HashSet::new();
		for network in &self.networks {
			if !network_ids.insert(NetworkId::from(network.id.as_str())) {
				return Err(ConfigValidationError::DuplicateNetwork {
					id: network.id.clone(),
				});
			}
		}
		let catalog: HashSet<NetworkId> =
			self.network_catalog().into_iter().map(|p| p.id).collect();

		let mut adapter_names = HashSet::new();
		for adapter in self.enabled_adapters() {
			let name = adapter.display_name().to_string();
			if let Some(timeout_ms) = adapter.timeout_ms {
				check_timeout(&format!("adapters.{}.timeout_ms", name), timeout_ms)?;
			}
			for network in adapter.networks.iter().flatten() {
				if !catalog.contains(&NetworkId::from(network.as_str())) {
					return Err(ConfigValidationError::UnknownNetwork {
						adapter: name.clone(),
						network: network.clone(),
					});
				}
			}
			if !adapter_names.insert(name.clone()) {
				return Err(ConfigValidationError::DuplicateAdapter { name });
			}
		}

		if matches!(self.oracles.fee, FeeOracleSettings::Rpc) {
			if let Some(network) = self.networks.iter().find(|n| n.rpc_url.is_none()) {
				return Err(ConfigValidationError::MissingRpcUrl {
					network: network.id.clone(),
				});
			}
		}

		Ok(())
	}
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigValidationError> {
	if (MIN_ADAPTER_TIMEOUT_MS..=MAX_ADAPTER_TIMEOUT_MS).contains(&value) {
		Ok(())
	} else {
		Err(ConfigValidationError::TimeoutOutOfRange {
			field: field.to_string(),
			value,
			min: MIN_ADAPTER_TIMEOUT_MS,
			max: MAX_ADAPTER_TIMEOUT_MS,
		})
	}
}
