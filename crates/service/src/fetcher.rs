//! Concurrent fan-out to every eligible adapter
//!
//! Each adapter runs in its own task under its own timeout. Whatever happens to one call
//! (error, timeout, panic, malformed answer) only turns that adapter's route unavailable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use swapquote_adapters::AdapterRegistry;
use swapquote_types::{
	AdapterCapabilities, NormalizedRoute, QuoteAdapter, QuoteAmount, RequestFingerprint,
	RouteFailure, U256,
};
use tracing::{debug, info, warn};

use crate::fees::{CostInputs, FeeNormalizer, NetworkReadings};
use crate::filter::eligible_adapters;
use crate::normalizer::{build_route, check_quote};

type SharedReadings = Shared<BoxFuture<'static, NetworkReadings>>;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
	pub default_timeout: Duration,
	/// Per-adapter overrides keyed by adapter name
	pub adapter_timeouts: HashMap<String, Duration>,
}

impl Default for FetcherConfig {
	fn default() -> Self {
		Self {
			default_timeout: Duration::from_millis(
				swapquote_types::constants::limits::DEFAULT_ADAPTER_TIMEOUT_MS,
			),
			adapter_timeouts: HashMap::new(),
		}
	}
}

pub struct Fetcher {
	registry: Arc<AdapterRegistry>,
	fees: Arc<FeeNormalizer>,
	config: FetcherConfig,
}

/// Input amount shown on a placeholder route
fn placeholder_input(fingerprint: &RequestFingerprint) -> U256 {
	match &fingerprint.amount {
		QuoteAmount::Input(amount) => amount.clone(),
		QuoteAmount::Output(_) => U256::zero(),
	}
}

impl Fetcher {
	pub fn new(registry: Arc<AdapterRegistry>, fees: Arc<FeeNormalizer>, config: FetcherConfig) -> Self {
		Self {
			registry,
			fees,
			config,
		}
	}

	pub fn registry(&self) -> &Arc<AdapterRegistry> {
		&self.registry
	}

	fn timeout_for(&self, adapter_name: &str) -> Duration {
		self.config
			.adapter_timeouts
			.get(adapter_name)
			.copied()
			.unwrap_or(self.config.default_timeout)
	}

	/// Names of the adapters a cycle for `fingerprint` will query
	pub fn eligible_names(&self, fingerprint: &RequestFingerprint) -> Vec<String> {
		eligible_adapters(&self.registry, fingerprint)
			.iter()
			.map(|a| a.descriptor().name.clone())
			.collect()
	}

	pub async fn fetch_all(&self, fingerprint: &RequestFingerprint) -> Vec<(String, NormalizedRoute)> {
		self.fetch_all_with_progress(fingerprint, |_| {}).await
	}

	/// Fetch every eligible adapter; `on_settled` is called with each adapter name as soon as
	/// its route (available or not) is final
	///
	/// Results are in registration order.
	pub async fn fetch_all_with_progress<F>(
		&self,
		fingerprint: &RequestFingerprint,
		on_settled: F,
	) -> Vec<(String, NormalizedRoute)>
	where
		F: Fn(&str) + Send + Sync,
	{
		let adapters = eligible_adapters(&self.registry, fingerprint);
		info!(
			"Fetching routes for {} from {} adapters",
			fingerprint.network,
			adapters.len()
		);

		if fingerprint.amount.is_zero() {
			debug!("Zero amount requested, skipping adapter calls");
			return adapters
				.iter()
				.map(|adapter| {
					let descriptor = adapter.descriptor();
					on_settled(&descriptor.name);
					(
						descriptor.name.clone(),
						NormalizedRoute::unavailable(
							descriptor.name.clone(),
							placeholder_input(fingerprint),
							&descriptor.capabilities,
							RouteFailure::EmptyRequest,
						),
					)
				})
				.collect();
		}

		let fees = Arc::clone(&self.fees);
		let readings_fp = fingerprint.clone();
		let readings: SharedReadings = async move { fees.readings(&readings_fp).await }
			.boxed()
			.shared();
		// Drive the lookup alongside the adapter calls
		tokio::spawn(readings.clone());

		let mut results: Vec<Option<NormalizedRoute>> = vec![None; adapters.len()];
		let mut pending = FuturesUnordered::new();

		for (index, adapter) in adapters.iter().enumerate() {
			let descriptor = adapter.descriptor();
			let name = descriptor.name.clone();
			let capabilities = descriptor.capabilities;

			if !fingerprint.amount.is_input() && !capabilities.supports_output_amount_quoting {
				debug!("Adapter {} cannot quote by output amount", name);
				on_settled(&name);
				results[index] = Some(NormalizedRoute::unavailable(
					name,
					placeholder_input(fingerprint),
					&capabilities,
					RouteFailure::UnsupportedQuoteDirection,
				));
				continue;
			}

			let task = tokio::spawn(run_adapter(
				Arc::clone(adapter),
				Arc::clone(&self.fees),
				fingerprint.clone(),
				readings.clone(),
				self.timeout_for(&name),
			));
			pending.push(async move { (index, name, capabilities, task.await) });
		}

		while let Some((index, name, capabilities, joined)) = pending.next().await {
			let route = joined.unwrap_or_else(|e| {
				warn!("Adapter {} task failed: {}", name, e);
				panicked_placeholder(&name, fingerprint, &capabilities)
			});
			on_settled(&name);
			results[index] = Some(route);
		}

		results
			.into_iter()
			.flatten()
			.map(|route| (route.adapter_name.clone(), route))
			.collect()
	}
}

fn panicked_placeholder(
	name: &str,
	fingerprint: &RequestFingerprint,
	capabilities: &AdapterCapabilities,
) -> NormalizedRoute {
	NormalizedRoute::unavailable(
		name,
		placeholder_input(fingerprint),
		capabilities,
		RouteFailure::QuoteUnavailable {
			reason: "adapter task aborted".to_string(),
		},
	)
}

async fn run_adapter(
	adapter: Arc<dyn QuoteAdapter>,
	fees: Arc<FeeNormalizer>,
	fingerprint: RequestFingerprint,
	readings: SharedReadings,
	timeout: Duration,
) -> NormalizedRoute {
	let descriptor = adapter.descriptor();
	let name = &descriptor.name;
	let unavailable = |failure: RouteFailure| {
		NormalizedRoute::unavailable(
			name.clone(),
			placeholder_input(&fingerprint),
			&descriptor.capabilities,
			failure,
		)
	};

	let request = fingerprint.quote_request();
	let started = Instant::now();
	let raw = match tokio::time::timeout(timeout, adapter.get_quote(&request)).await {
		Ok(Ok(raw)) => raw,
		Ok(Err(e)) => {
			warn!("Adapter {} returned error: {}", name, e);
			return unavailable(RouteFailure::from(&e));
		},
		Err(_) => {
			warn!("Adapter {} timed out after {:?}", name, timeout);
			return unavailable(RouteFailure::AdapterTimeout {
				timeout_ms: timeout.as_millis() as u64,
			});
		},
	};
	debug!("Adapter {} answered in {:?}", name, started.elapsed());

	let checked = match check_quote(&fingerprint, &raw) {
		Ok(checked) => checked,
		Err(failure) => {
			warn!("Adapter {} quote rejected: {}", name, failure);
			return unavailable(failure);
		},
	};

	let payload = adapter.execution_payload(&raw);
	let settlement = fees
		.settlement_fee(&fingerprint.network, &descriptor.capabilities, &payload)
		.await;
	let gas_usd = fees.gas_cost(
		&fingerprint.network,
		CostInputs {
			from_asset: &fingerprint.from_asset,
			capabilities: &descriptor.capabilities,
			gas_units: checked.gas_units,
			provider_fee: raw.provider_fee.as_ref(),
		},
		readings.await,
		settlement,
	);

	build_route(
		adapter.as_ref(),
		&fingerprint,
		&raw,
		checked,
		payload,
		gas_usd,
		settlement,
	)
}
