//! One refresh cycle: fetch, normalize, rank

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use swapquote_types::{
	AdapterFailure, Asset, CycleState, EngineError, NetworkId, OracleError, OracleResult,
	PriceOracle, RankedRoute, RequestFingerprint, RouteSelection,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::fetcher::Fetcher;
use crate::ranker::{rank, select, AssetPrices};

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
	pub routes: Vec<RankedRoute>,
	pub failures: Vec<AdapterFailure>,
	pub state: CycleState,
}

impl CycleOutcome {
	pub fn selection(&self, pinned: Option<&str>) -> Result<RouteSelection, EngineError> {
		select(&self.routes, pinned)
	}
}

type SharedOutcome = Shared<BoxFuture<'static, Arc<CycleOutcome>>>;

/// A running cycle, possibly joined by several callers
#[derive(Clone)]
pub struct CycleHandle {
	outcome: SharedOutcome,
	settled: watch::Receiver<Vec<String>>,
}

impl CycleHandle {
	/// Names of the adapters that have settled so far, in settle order
	pub fn settled(&self) -> watch::Receiver<Vec<String>> {
		self.settled.clone()
	}

	pub fn outcome(&self) -> SharedOutcome {
		self.outcome.clone()
	}
}

/// Removes the in-flight record when its cycle task ends, including on panic
struct InFlightSlot {
	pipeline: Arc<QuotePipeline>,
	key: String,
}

impl Drop for InFlightSlot {
	fn drop(&mut self) {
		self.pipeline.in_flight.remove(&self.key);
	}
}

pub struct QuotePipeline {
	fetcher: Fetcher,
	price_oracle: Arc<dyn PriceOracle>,
	oracle_timeout: Duration,
	in_flight: DashMap<String, CycleHandle>,
}

impl QuotePipeline {
	pub fn new(fetcher: Fetcher, price_oracle: Arc<dyn PriceOracle>, oracle_timeout: Duration) -> Self {
		Self {
			fetcher,
			price_oracle,
			oracle_timeout,
			in_flight: DashMap::new(),
		}
	}

	pub fn fetcher(&self) -> &Fetcher {
		&self.fetcher
	}

	async fn asset_price(&self, network: &NetworkId, asset: &Asset) -> OracleResult<f64> {
		tokio::time::timeout(self.oracle_timeout, self.price_oracle.asset_usd_price(network, asset))
			.await
			.unwrap_or(Err(OracleError::Timeout {
				timeout_ms: self.oracle_timeout.as_millis() as u64,
			}))
	}

	async fn asset_prices(&self, fingerprint: &RequestFingerprint) -> AssetPrices {
		let network = &fingerprint.network;
		let (input, output) = tokio::join!(
			self.asset_price(network, &fingerprint.from_asset),
			self.asset_price(network, &fingerprint.to_asset)
		);
		if let Err(e) = &output {
			debug!("Output asset price unavailable for {}: {}", network, e);
		}
		AssetPrices {
			input_usd: input.ok(),
			output_usd: output.ok(),
		}
	}

	/// Run a full cycle, reporting each settled adapter to `on_settled`
	///
	/// Ranking starts only after every adapter has settled.
	pub async fn run_cycle<F>(&self, fingerprint: &RequestFingerprint, on_settled: F) -> CycleOutcome
	where
		F: Fn(&str) + Send + Sync,
	{
		let (fetched, prices) = tokio::join!(
			self.fetcher.fetch_all_with_progress(fingerprint, on_settled),
			self.asset_prices(fingerprint)
		);

		let routes = fetched.into_iter().map(|(_, route)| route).collect();
		let ranking = rank(fingerprint, routes, prices);
		let state = if ranking.discarded.is_empty() {
			CycleState::Settled
		} else {
			CycleState::PartiallyFailed
		};

		info!(
			"Cycle for {} ranked {} routes ({} unavailable)",
			fingerprint.cache_key(),
			ranking.ranked.len(),
			ranking.discarded.len()
		);

		CycleOutcome {
			routes: ranking.ranked,
			failures: ranking.discarded,
			state,
		}
	}

	/// Join the cycle already running for `fingerprint`, or start one
	///
	/// At most one fan-out per fingerprint is in flight across every caller. The cycle runs on
	/// its own task and completes even if every caller stops waiting for it.
	pub fn cycle(self: &Arc<Self>, fingerprint: &RequestFingerprint) -> CycleHandle {
		match self.in_flight.entry(fingerprint.cache_key()) {
			Entry::Occupied(running) => {
				debug!("Joining in-flight cycle for {}", running.key());
				running.get().clone()
			},
			Entry::Vacant(slot) => {
				let key = slot.key().clone();
				let (progress, settled) = watch::channel(Vec::new());
				let guard = InFlightSlot {
					pipeline: Arc::clone(self),
					key: key.clone(),
				};
				let fingerprint = fingerprint.clone();
				let task = tokio::spawn(async move {
					let outcome = guard
						.pipeline
						.run_cycle(&fingerprint, |adapter| {
							progress.send_modify(|names| names.push(adapter.to_string()));
						})
						.await;
					// Leave the map before callers see the outcome
					drop(guard);
					Arc::new(outcome)
				});

				let outcome = async move {
					match task.await {
						Ok(outcome) => outcome,
						Err(e) => {
							warn!("Cycle for {} did not complete: {}", key, e);
							Arc::new(CycleOutcome {
								routes: Vec::new(),
								failures: Vec::new(),
								state: CycleState::PartiallyFailed,
							})
						},
					}
				}
				.boxed()
				.shared();

				let handle = CycleHandle { outcome, settled };
				slot.insert(handle.clone());
				handle
			},
		}
	}

	/// Validate and quote once without observing the fingerprint
	///
	/// Joins a cycle that is already in flight for the same fingerprint.
	pub async fn quote_once(
		self: &Arc<Self>,
		fingerprint: &RequestFingerprint,
	) -> Result<CycleOutcome, EngineError> {
		fingerprint.validate()?;
		let outcome = self.cycle(fingerprint).outcome().await;
		Ok(Arc::try_unwrap(outcome).unwrap_or_else(|shared| (*shared).clone()))
	}
}
