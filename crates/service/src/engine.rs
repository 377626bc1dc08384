//! Engine assembly: registry, oracles and timings wired into one handle

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use swapquote_adapters::AdapterRegistry;
use swapquote_config::Settings;
use swapquote_types::constants::limits::{
	DEFAULT_ADAPTER_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_OBSERVED_FINGERPRINTS,
	DEFAULT_ORACLE_TIMEOUT_MS, DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_WATCH_IDLE_TIMEOUT_MS,
};
use swapquote_types::{
	EngineError, ExecutionTarget, FeeOracle, NetworkProfile, PriceOracle, RankedRoute,
	RequestFingerprint,
};
use tracing::info;

use crate::fees::FeeNormalizer;
use crate::fetcher::{Fetcher, FetcherConfig};
use crate::pipeline::{CycleOutcome, QuotePipeline};
use crate::scheduler::RefreshScheduler;
use crate::session::QuoteSession;

#[derive(Debug, Clone)]
pub struct EngineConfig {
	pub refresh_interval: Duration,
	pub debounce: Duration,
	pub adapter_timeout: Duration,
	pub adapter_timeouts: HashMap<String, Duration>,
	pub oracle_timeout: Duration,
	pub max_observed_fingerprints: usize,
	pub watch_idle_timeout: Duration,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
			debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
			adapter_timeout: Duration::from_millis(DEFAULT_ADAPTER_TIMEOUT_MS),
			adapter_timeouts: HashMap::new(),
			oracle_timeout: Duration::from_millis(DEFAULT_ORACLE_TIMEOUT_MS),
			max_observed_fingerprints: DEFAULT_MAX_OBSERVED_FINGERPRINTS,
			watch_idle_timeout: Duration::from_millis(DEFAULT_WATCH_IDLE_TIMEOUT_MS),
		}
	}
}

impl From<&Settings> for EngineConfig {
	fn from(settings: &Settings) -> Self {
		let engine = &settings.engine;
		Self {
			refresh_interval: Duration::from_millis(engine.refresh_interval_ms),
			debounce: Duration::from_millis(engine.debounce_ms),
			adapter_timeout: Duration::from_millis(engine.adapter_timeout_ms),
			adapter_timeouts: settings
				.enabled_adapters()
				.map(|adapter| {
					(
						adapter.display_name().to_string(),
						Duration::from_millis(settings.adapter_timeout_ms(adapter)),
					)
				})
				.collect(),
			oracle_timeout: Duration::from_millis(engine.oracle_timeout_ms),
			max_observed_fingerprints: engine.max_observed_fingerprints,
			watch_idle_timeout: Duration::from_millis(engine.watch_idle_timeout_ms),
		}
	}
}

/// Handle to a running engine; cheap to clone
#[derive(Clone)]
pub struct QuoteEngine {
	registry: Arc<AdapterRegistry>,
	scheduler: RefreshScheduler,
	config: EngineConfig,
}

impl QuoteEngine {
	pub fn new(
		registry: AdapterRegistry,
		fee_oracle: Arc<dyn FeeOracle>,
		price_oracle: Arc<dyn PriceOracle>,
		catalog: Vec<NetworkProfile>,
		config: EngineConfig,
	) -> Self {
		let registry = Arc::new(registry);
		let fees = Arc::new(FeeNormalizer::new(fee_oracle, catalog, config.oracle_timeout));
		let fetcher = Fetcher::new(
			Arc::clone(&registry),
			fees,
			FetcherConfig {
				default_timeout: config.adapter_timeout,
				adapter_timeouts: config.adapter_timeouts.clone(),
			},
		);
		let pipeline = Arc::new(QuotePipeline::new(
			fetcher,
			price_oracle,
			config.oracle_timeout,
		));
		let scheduler = RefreshScheduler::with_idle_timeout(
			pipeline,
			config.refresh_interval,
			config.max_observed_fingerprints,
			config.watch_idle_timeout,
		);

		info!("Quote engine ready with {} adapters", registry.len());
		Self {
			registry,
			scheduler,
			config,
		}
	}

	pub fn registry(&self) -> &Arc<AdapterRegistry> {
		&self.registry
	}

	pub fn scheduler(&self) -> &RefreshScheduler {
		&self.scheduler
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// New debounced session sharing this engine's scheduler
	pub fn session(&self) -> QuoteSession {
		QuoteSession::new(self.scheduler.clone(), self.config.debounce)
	}

	pub async fn quote_once(&self, fingerprint: &RequestFingerprint) -> Result<CycleOutcome, EngineError> {
		self.scheduler.pipeline().quote_once(fingerprint).await
	}

	/// Call the caller's signer should make for `route`; the engine never signs or broadcasts
	pub fn execution_target(route: &RankedRoute) -> Option<ExecutionTarget> {
		route.execution_target().cloned()
	}

	pub fn shutdown(&self) {
		self.scheduler.shutdown();
	}
}
