//! swapquote adapters
//!
//! Built-in quote provider integrations, the adapter registry and HTTP-backed oracles.

pub mod client_cache;
pub mod cowswap_adapter;
pub mod oracles;
pub mod paraswap_adapter;
pub mod zerox_adapter;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use swapquote_types::{
	AdapterDescriptor, AdapterError, AdapterFactoryError, AdapterKind, AdapterResult, NetworkId,
	NetworkProfile, QuoteAdapter, QuoteRequest, SecretString,
};
use tracing::{debug, info, warn};

pub use client_cache::{ClientCache, ClientConfig};
pub use cowswap_adapter::CowSwapAdapter;
pub use oracles::{LlamaPriceOracle, RpcFeeOracle};
pub use paraswap_adapter::ParaSwapAdapter;
pub use zerox_adapter::ZeroXAdapter;

/// Construction parameters for one built-in adapter
#[derive(Debug, Clone)]
pub struct AdapterConfig {
	pub kind: AdapterKind,
	/// Display/registry name; defaults to the kind's name
	pub name: Option<String>,
	/// Base URL override
	pub endpoint: Option<String>,
	/// Base URL for requests with privacy enabled, typically a relaying proxy
	pub privacy_endpoint: Option<String>,
	pub timeout_ms: u64,
	pub api_key: Option<SecretString>,
	pub headers: HashMap<String, String>,
	/// Restrict the adapter to these networks (intersected with what it can serve)
	pub networks: Option<Vec<NetworkId>>,
}

impl AdapterConfig {
	pub fn new(kind: AdapterKind) -> Self {
		Self {
			kind,
			name: None,
			endpoint: None,
			privacy_endpoint: None,
			timeout_ms: swapquote_types::constants::limits::DEFAULT_ADAPTER_TIMEOUT_MS,
			api_key: None,
			headers: HashMap::new(),
			networks: None,
		}
	}

	pub fn name(&self) -> &str {
		self.name.as_deref().unwrap_or(self.kind.default_name())
	}

	pub(crate) fn client_config(&self, default_endpoint: &str) -> ClientConfig {
		ClientConfig::new(
			self.name(),
			self.endpoint.as_deref().unwrap_or(default_endpoint),
			self.timeout_ms,
		)
		.with_headers(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())))
	}

	pub(crate) fn endpoints(&self, default_endpoint: &str) -> Endpoints {
		let trim = |url: &str| url.trim_end_matches('/').to_string();
		Endpoints {
			public: trim(self.endpoint.as_deref().unwrap_or(default_endpoint)),
			private: self.privacy_endpoint.as_deref().map(trim),
		}
	}

	/// Chain ids of the networks this adapter will serve
	///
	/// `native` lists what the provider supports; the result is limited to networks present
	/// in the catalog and, when configured, to `self.networks`.
	pub(crate) fn served_networks(
		&self,
		native: &[&str],
		catalog: &[NetworkProfile],
	) -> BTreeMap<NetworkId, u64> {
		catalog
			.iter()
			.filter(|profile| native.contains(&profile.id.as_str()))
			.filter(|profile| {
				self.networks
					.as_ref()
					.map_or(true, |wanted| wanted.contains(&profile.id))
			})
			.map(|profile| (profile.id.clone(), profile.chain_id))
			.collect()
	}
}

/// Base URLs of one adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoints {
	public: String,
	private: Option<String>,
}

impl Endpoints {
	/// Private requests use the privacy endpoint when configured; the address is withheld either way
	pub(crate) fn for_request(&self, request: &QuoteRequest) -> &str {
		match (&self.private, request.private) {
			(Some(private), true) => private,
			_ => &self.public,
		}
	}
}

/// Ordered, name-unique set of adapters
///
/// Registration order is the tie-break order used by ranking. Read-only once handed to
/// the engine.
#[derive(Debug, Default, Clone)]
pub struct AdapterRegistry {
	adapters: Vec<Arc<dyn QuoteAdapter>>,
	index: HashMap<String, usize>,
}

impl AdapterRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, adapter: Arc<dyn QuoteAdapter>) -> Result<(), AdapterFactoryError> {
		let name = adapter.descriptor().name.clone();
		if self.index.contains_key(&name) {
			return Err(AdapterFactoryError::AlreadyRegistered { adapter: name });
		}

		debug!(
			"Registering adapter {} for {} networks",
			name,
			adapter.descriptor().supported_networks.len()
		);
		self.index.insert(name, self.adapters.len());
		self.adapters.push(adapter);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn QuoteAdapter>> {
		self.index.get(name).map(|&i| &self.adapters[i])
	}

	/// Adapters in registration order
	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn QuoteAdapter>> {
		self.adapters.iter()
	}

	/// Position of the adapter in registration order
	pub fn position(&self, name: &str) -> Option<usize> {
		self.index.get(name).copied()
	}

	pub fn descriptors(&self) -> Vec<AdapterDescriptor> {
		self.adapters
			.iter()
			.map(|a| a.descriptor().clone())
			.collect()
	}

	pub fn len(&self) -> usize {
		self.adapters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.adapters.is_empty()
	}
}

/// Factory for the built-in adapter kinds
pub struct AdapterFactory;

impl AdapterFactory {
	pub fn create(
		config: &AdapterConfig,
		catalog: &[NetworkProfile],
		cache: &ClientCache,
	) -> Result<Arc<dyn QuoteAdapter>, AdapterFactoryError> {
		let creation_failed = |e: AdapterError| AdapterFactoryError::CreationFailed {
			adapter: config.name().to_string(),
			reason: e.to_string(),
		};

		for endpoint in config.endpoint.iter().chain(&config.privacy_endpoint) {
			url::Url::parse(endpoint).map_err(|e| AdapterFactoryError::CreationFailed {
				adapter: config.name().to_string(),
				reason: format!("invalid endpoint '{}': {}", endpoint, e),
			})?;
		}

		let adapter: Arc<dyn QuoteAdapter> = match config.kind {
			AdapterKind::ZeroX => {
				if config.api_key.as_ref().map_or(true, SecretString::is_empty) {
					return Err(AdapterFactoryError::MissingCredential {
						adapter: config.name().to_string(),
						reason: "0x requires an API key".to_string(),
					});
				}
				if let Some(key) = &config.api_key {
					debug!("Adapter {} using API key {}", config.name(), key.hint());
				}
				Arc::new(ZeroXAdapter::new(config, catalog, cache).map_err(creation_failed)?)
			},
			AdapterKind::CowSwap => {
				Arc::new(CowSwapAdapter::new(config, catalog, cache).map_err(creation_failed)?)
			},
			AdapterKind::ParaSwap => {
				Arc::new(ParaSwapAdapter::new(config, catalog, cache).map_err(creation_failed)?)
			},
		};

		if adapter.descriptor().supported_networks.is_empty() {
			warn!(
				"Adapter {} serves none of the configured networks",
				adapter.descriptor().name
			);
		}
		Ok(adapter)
	}

	/// Build every config into a registry, preserving order
	pub fn build_registry(
		configs: &[AdapterConfig],
		catalog: &[NetworkProfile],
		cache: &ClientCache,
	) -> Result<AdapterRegistry, AdapterFactoryError> {
		let mut registry = AdapterRegistry::new();
		for config in configs {
			registry.register(Self::create(config, catalog, cache)?)?;
		}
		info!("Built adapter registry with {} adapters", registry.len());
		Ok(registry)
	}
}

/// Read a JSON body, mapping non-success statuses and client timeouts
pub(crate) async fn read_json(
	result: Result<reqwest::Response, reqwest::Error>,
	timeout_ms: u64,
) -> AdapterResult<serde_json::Value> {
	let response = result.map_err(|e| map_reqwest_error(e, timeout_ms))?;
	let status = response.status();
	if !status.is_success() {
		return Err(AdapterError::from_http_failure(status.as_u16()));
	}
	response
		.json::<serde_json::Value>()
		.await
		.map_err(|e| map_reqwest_error(e, timeout_ms))
}

fn map_reqwest_error(error: reqwest::Error, timeout_ms: u64) -> AdapterError {
	if error.is_timeout() {
		AdapterError::Timeout { timeout_ms }
	} else {
		AdapterError::HttpError(error)
	}
}

/// Parse a decimal amount string from a provider payload
pub(crate) fn parse_amount(
	value: Option<&str>,
	field: &str,
) -> AdapterResult<swapquote_types::U256> {
	let raw = value.ok_or_else(|| AdapterError::invalid_response(format!("missing {}", field)))?;
	swapquote_types::U256::parse(raw)
		.map_err(|e| AdapterError::invalid_response(format!("{}: {}", field, e)))
}
