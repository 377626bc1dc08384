//! swapquote
//!
//! Swap route aggregation engine. Fans one quote request out to every registered DEX
//! aggregator adapter, normalizes each answer into a comparable route with a USD gas cost,
//! ranks the routes and keeps observed requests fresh in the background.
//!
//! ```no_run
//! use swapquote::SwapQuoteBuilder;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! SwapQuoteBuilder::new().start_server().await
//! # }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use swapquote_adapters::{
	AdapterConfig, AdapterFactory, ClientCache, LlamaPriceOracle, RpcFeeOracle,
};
use swapquote_config::{
	load_config, log_engine_summary, log_service_info, log_service_shutdown, log_startup_complete,
	ConfigurableValueError, FeeOracleSettings, LogFormat, PriceOracleSettings,
};
use swapquote_service::{EngineConfig, StaticFeeOracle, StaticPriceOracle};
use swapquote_types::{AdapterFactoryError, NetworkProfile, OracleError};
use thiserror::Error;
use tracing::info;

pub use swapquote_types::{
	chrono, serde_json, AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterKind,
	AdapterResult, Asset, CycleState, EngineError, ExecutionTarget, FeeOracle, GasCost,
	NetworkId, NormalizedRoute, PriceOracle, QuoteAdapter, QuoteAmount, QuoteContext,
	QuoteRequest, RankedRoute, RawQuote, RequestFingerprint, RouteFailure, RouteSelection,
	RouteSnapshot, U256,
};

pub use swapquote_adapters::AdapterRegistry;
pub use swapquote_api::{create_router, AppState};
pub use swapquote_config::Settings;
pub use swapquote_service::{QuoteEngine, QuoteSession, RefreshScheduler};

pub mod types {
	pub use swapquote_types::*;
}

pub mod adapters {
	pub use swapquote_adapters::*;
}

pub mod config {
	pub use swapquote_config::*;
}

pub mod service {
	pub use swapquote_service::*;
}

pub mod api {
	pub use swapquote_api::*;
}

pub use async_trait;

#[derive(Error, Debug)]
pub enum BuildError {
	#[error("Adapter setup failed: {0}")]
	Adapter(#[from] AdapterFactoryError),

	#[error("Oracle setup failed: {0}")]
	Oracle(#[from] OracleError),

	#[error("Configuration value could not be resolved: {0}")]
	ConfigValue(#[from] ConfigurableValueError),

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Assembles the engine from settings plus any programmatically supplied parts
#[derive(Default)]
pub struct SwapQuoteBuilder {
	settings: Option<Settings>,
	adapters: Vec<Arc<dyn QuoteAdapter>>,
	fee_oracle: Option<Arc<dyn FeeOracle>>,
	price_oracle: Option<Arc<dyn PriceOracle>>,
}

impl SwapQuoteBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(settings: Settings) -> Self {
		Self::new().with_settings(settings)
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Register an extra adapter after the configured ones
	pub fn with_adapter(mut self, adapter: Arc<dyn QuoteAdapter>) -> Self {
		self.adapters.push(adapter);
		self
	}

	/// Replace the configured fee oracle
	pub fn with_fee_oracle(mut self, oracle: Arc<dyn FeeOracle>) -> Self {
		self.fee_oracle = Some(oracle);
		self
	}

	/// Replace the configured price oracle
	pub fn with_price_oracle(mut self, oracle: Arc<dyn PriceOracle>) -> Self {
		self.price_oracle = Some(oracle);
		self
	}

	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	fn adapter_configs(settings: &Settings) -> Result<Vec<AdapterConfig>, BuildError> {
		settings
			.enabled_adapters()
			.map(|adapter| {
				let mut config = AdapterConfig::new(adapter.kind);
				config.name = adapter.name.clone();
				config.endpoint = adapter.endpoint.clone();
				config.privacy_endpoint = adapter.privacy_endpoint.clone();
				config.timeout_ms = settings.adapter_timeout_ms(adapter);
				config.headers = adapter.headers.clone();
				config.networks = adapter
					.networks
					.as_ref()
					.map(|ids| ids.iter().map(|id| NetworkId::from(id.as_str())).collect());
				config.api_key = adapter
					.api_key
					.as_ref()
					.map(|key| key.resolve_secret())
					.transpose()?;
				Ok(config)
			})
			.collect()
	}

	fn price_oracle_from(
		settings: &Settings,
		cache: &ClientCache,
	) -> Result<Arc<dyn PriceOracle>, BuildError> {
		Ok(match &settings.oracles.price {
			PriceOracleSettings::Static { prices } => Arc::new(StaticPriceOracle::new(prices)),
			PriceOracleSettings::Llama { endpoint } => Arc::new(LlamaPriceOracle::new(
				endpoint.as_deref(),
				cache,
				settings.engine.oracle_timeout_ms,
			)?),
		})
	}

	fn fee_oracle_from(
		settings: &Settings,
		catalog: &[NetworkProfile],
		price_oracle: Arc<dyn PriceOracle>,
		cache: &ClientCache,
	) -> Result<Arc<dyn FeeOracle>, BuildError> {
		Ok(match &settings.oracles.fee {
			FeeOracleSettings::Static {
				gas_price_wei,
				native_usd,
				data_fee_wei_per_byte,
			} => Arc::new(StaticFeeOracle::new(
				gas_price_wei,
				native_usd,
				data_fee_wei_per_byte,
			)),
			FeeOracleSettings::Rpc => {
				let mut rpc_urls = HashMap::new();
				for network in &settings.networks {
					if let Some(url) = &network.rpc_url {
						rpc_urls.insert(NetworkId::from(network.id.as_str()), url.resolve()?);
					}
				}
				Arc::new(RpcFeeOracle::new(
					rpc_urls,
					catalog,
					price_oracle,
					cache,
					settings.engine.oracle_timeout_ms,
				)?)
			},
		})
	}

	/// Build the engine without starting an HTTP server
	pub fn build_engine(self) -> Result<QuoteEngine, BuildError> {
		let settings = self.settings.unwrap_or_default();
		settings
			.validate()
			.map_err(|e| BuildError::InvalidConfig(e.to_string()))?;

		let cache = ClientCache::for_adapter();
		let catalog = settings.network_catalog();
		let mut registry =
			AdapterFactory::build_registry(&Self::adapter_configs(&settings)?, &catalog, &cache)?;
		for adapter in self.adapters {
			registry.register(adapter)?;
		}

		let price_oracle = match self.price_oracle {
			Some(oracle) => oracle,
			None => Self::price_oracle_from(&settings, &cache)?,
		};
		let fee_oracle = match self.fee_oracle {
			Some(oracle) => oracle,
			None => {
				Self::fee_oracle_from(&settings, &catalog, Arc::clone(&price_oracle), &cache)?
			},
		};

		Ok(QuoteEngine::new(
			registry,
			fee_oracle,
			price_oracle,
			catalog,
			EngineConfig::from(&settings),
		))
	}

	/// Build the engine and return the configured router with state
	pub fn start(self) -> Result<(axum::Router, AppState), BuildError> {
		let body_limit = self
			.settings
			.as_ref()
			.map(|s| s.server.body_limit_bytes)
			.unwrap_or(swapquote_api::DEFAULT_BODY_LIMIT_BYTES);
		let state = AppState::new(self.build_engine()?);
		let router = swapquote_api::create_router_with_limit(body_limit).with_state(state.clone());
		Ok((router, state))
	}

	fn init_tracing_from_settings(settings: &Settings) {
		let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.logging.level));
		let structured = settings.logging.structured;

		// A subscriber may already be installed by an embedding application or a test
		let installed = match settings.logging.format {
			LogFormat::Json => tracing_subscriber::fmt()
				.json()
				.with_env_filter(env_filter)
				.with_target(structured)
				.with_thread_ids(structured)
				.try_init(),
			LogFormat::Pretty => tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter)
				.with_target(structured)
				.with_thread_ids(structured)
				.try_init(),
			LogFormat::Compact => tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter)
				.with_target(structured)
				.with_thread_ids(structured)
				.try_init(),
		};

		if installed.is_ok() {
			info!(
				"Logging configuration applied: level={}, format={:?}, structured={}",
				settings.logging.level, settings.logging.format, settings.logging.structured
			);
		}
	}

	/// Load `.env` and configuration, initialize tracing, then serve until Ctrl-C
	pub async fn start_server(mut self) -> Result<(), Box<dyn std::error::Error>> {
		dotenvy::dotenv().ok();

		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config()?,
		};
		Self::init_tracing_from_settings(&settings);
		log_service_info();
		log_engine_summary(&settings);

		let bind_addr = settings.bind_address();
		let addr: SocketAddr = bind_addr
			.parse()
			.map_err(|e| format!("Invalid bind address '{}': {}", bind_addr, e))?;

		self.settings = Some(settings);
		let (app, state) = self.start()?;
		let listener = tokio::net::TcpListener::bind(addr).await?;

		log_startup_complete(&bind_addr);
		info!("API endpoints available:");
		info!("  GET    /health");
		info!("  GET    /api/v1/adapters");
		info!("  POST   /api/v1/routes");
		info!("  POST   /api/v1/watches");
		info!("  GET    /api/v1/watches/{{id}}");
		info!("  POST   /api/v1/watches/{{id}}/refresh");
		info!("  DELETE /api/v1/watches/{{id}}");

		axum::serve(listener, app)
			.with_graceful_shutdown(async {
				let _ = tokio::signal::ctrl_c().await;
			})
			.await?;

		state.engine.shutdown();
		log_service_shutdown();
		Ok(())
	}
}
