//! Pooled HTTP clients shared by adapters and oracles
//!
//! Clients are keyed by owner, endpoint, timeout and default headers. API keys take part in
//! the key only as a hash, so the cache never holds them in printable form. A client is
//! rebuilt once it is older than the TTL so DNS and TLS state do not live forever.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use swapquote_types::{AdapterError, AdapterResult, SecretString};
use tracing::debug;

const USER_AGENT: &str = concat!("swapquote/", env!("CARGO_PKG_VERSION"));
const MAX_IDLE_PER_HOST: usize = 10;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// How to build one client
#[derive(Clone)]
pub struct ClientConfig {
	/// Adapter or oracle that owns the client
	pub owner: String,
	pub base_url: String,
	pub timeout_ms: u64,
	pub headers: BTreeMap<String, String>,
	/// Header name and key sent on every request
	pub api_key: Option<(String, SecretString)>,
}

impl ClientConfig {
	pub fn new(owner: impl Into<String>, base_url: impl Into<String>, timeout_ms: u64) -> Self {
		Self {
			owner: owner.into(),
			base_url: base_url.into(),
			timeout_ms,
			headers: BTreeMap::new(),
			api_key: None,
		}
	}

	pub fn with_headers<I>(mut self, headers: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		self.headers.extend(headers);
		self
	}

	/// Send `key` in `header`; a missing or blank key sends nothing
	pub fn with_api_key(mut self, header: &str, key: Option<&SecretString>) -> Self {
		self.api_key = key
			.filter(|k| !k.is_empty())
			.map(|k| (header.to_string(), k.clone()));
		self
	}

	fn cache_key(&self) -> ClientKey {
		ClientKey {
			owner: self.owner.clone(),
			base_url: self.base_url.clone(),
			timeout_ms: self.timeout_ms,
			headers: self.headers.clone(),
			api_key: self.api_key.as_ref().map(|(header, key)| {
				let mut hasher = DefaultHasher::new();
				key.expose_secret().hash(&mut hasher);
				(header.clone(), hasher.finish())
			}),
		}
	}

	fn header_map(&self) -> AdapterResult<HeaderMap> {
		let mut map = HeaderMap::new();
		map.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
		map.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));

		let extra = self
			.headers
			.iter()
			.map(|(name, value)| (name.as_str(), value.as_str(), false));
		let auth = self
			.api_key
			.iter()
			.map(|(name, key)| (name.as_str(), key.expose_secret(), true));

		for (name, value, sensitive) in extra.chain(auth) {
			let header_name =
				HeaderName::from_bytes(name.as_bytes()).map_err(|_| AdapterError::ConfigError {
					reason: format!("{}: invalid header name '{}'", self.owner, name),
				})?;
			let mut header_value =
				HeaderValue::from_str(value).map_err(|_| AdapterError::ConfigError {
					reason: format!("{}: invalid value for header '{}'", self.owner, name),
				})?;
			header_value.set_sensitive(sensitive);
			map.insert(header_name, header_value);
		}
		Ok(map)
	}
}

impl fmt::Debug for ClientConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientConfig")
			.field("owner", &self.owner)
			.field("base_url", &self.base_url)
			.field("timeout_ms", &self.timeout_ms)
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("api_key", &self.api_key.as_ref().map(|(header, _)| header))
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
	owner: String,
	base_url: String,
	timeout_ms: u64,
	headers: BTreeMap<String, String>,
	api_key: Option<(String, u64)>,
}

#[derive(Debug)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

/// Process-wide or per-test pool of clients
#[derive(Clone, Debug)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientKey, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	pub fn new() -> Self {
		Self::with_ttl(DEFAULT_TTL)
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	/// Shared cache used when the builder is not given one
	pub fn for_adapter() -> Self {
		GLOBAL_CLIENT_CACHE.clone()
	}

	pub fn get_client(&self, config: &ClientConfig) -> AdapterResult<Arc<Client>> {
		let key = config.cache_key();
		let ttl = self.ttl;

		match self.clients.entry(key) {
			Entry::Occupied(mut cached) if cached.get().created_at.elapsed() > ttl => {
				debug!("Rebuilding expired client for {} ({})", config.base_url, config.owner);
				let client = Arc::new(Self::build_client(config)?);
				cached.insert(CachedClient {
					client: Arc::clone(&client),
					created_at: Instant::now(),
				});
				Ok(client)
			},
			Entry::Occupied(cached) => Ok(Arc::clone(&cached.get().client)),
			Entry::Vacant(slot) => {
				debug!("Creating client for {} ({})", config.base_url, config.owner);
				let client = Arc::new(Self::build_client(config)?);
				slot.insert(CachedClient {
					client: Arc::clone(&client),
					created_at: Instant::now(),
				});
				Ok(client)
			},
		}
	}

	fn build_client(config: &ClientConfig) -> AdapterResult<Client> {
		Client::builder()
			.pool_max_idle_per_host(MAX_IDLE_PER_HOST)
			.pool_idle_timeout(POOL_IDLE_TIMEOUT)
			.timeout(Duration::from_millis(config.timeout_ms))
			.default_headers(config.header_map()?)
			.build()
			.map_err(AdapterError::HttpError)
	}

	pub fn len(&self) -> usize {
		self.clients.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.is_empty()
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}

lazy_static::lazy_static! {
	static ref GLOBAL_CLIENT_CACHE: ClientCache = ClientCache::new();
}
