//! Scripted adapters and a preassembled pipeline for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use swapquote_adapters::AdapterRegistry;
use swapquote_types::{
	AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterResult, Asset, ExecutionTarget,
	NetworkId, NetworkProfile, QuoteAdapter, QuoteAmount, QuoteRequest, RawQuote,
	RequestFingerprint, U256,
};

use crate::fees::FeeNormalizer;
use crate::fetcher::{Fetcher, FetcherConfig};
use crate::pipeline::QuotePipeline;
use crate::static_oracle::{StaticFeeOracle, StaticPriceOracle};

pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// Adapter that echoes the requested amount back as output after an optional delay
#[derive(Debug, Clone)]
pub struct ScriptedAdapter {
	descriptor: AdapterDescriptor,
	delay: Duration,
	fail: bool,
	calls: Arc<AtomicUsize>,
	active: Arc<AtomicUsize>,
	max_active: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
	pub fn new(name: &str) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				name,
				["ethereum"],
				AdapterCapabilities {
					supports_output_amount_quoting: true,
					..Default::default()
				},
			),
			delay: Duration::ZERO,
			fail: false,
			calls: Arc::new(AtomicUsize::new(0)),
			active: Arc::new(AtomicUsize::new(0)),
			max_active: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn failing(mut self) -> Self {
		self.fail = true;
		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn max_concurrent(&self) -> usize {
		self.max_active.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl QuoteAdapter for ScriptedAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn get_quote(&self, request: &QuoteRequest) -> AdapterResult<RawQuote> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_active.fetch_max(active, Ordering::SeqCst);
		tokio::time::sleep(self.delay).await;
		self.active.fetch_sub(1, Ordering::SeqCst);

		if self.fail {
			return Err(AdapterError::QuoteUnavailable {
				adapter: self.descriptor.name.clone(),
				reason: "scripted failure".to_string(),
			});
		}
		let amount = request.amount.value().clone();
		let quote = match request.amount {
			QuoteAmount::Input(_) => RawQuote::new(amount, json!({})),
			QuoteAmount::Output(_) => RawQuote::new(amount.clone(), json!({})).with_amount_in(amount),
		};
		Ok(quote.with_gas_units(100_000.0))
	}

	fn execution_payload(&self, _quote: &RawQuote) -> Vec<u8> {
		vec![0x01]
	}

	fn execution_target(&self, _quote: &RawQuote) -> AdapterResult<ExecutionTarget> {
		Ok(ExecutionTarget {
			to: "0x1111111254eeb25477b68fb85ed929f73a960582".to_string(),
			data: "0x01".to_string(),
			value: U256::zero(),
		})
	}

	fn approval_address(&self, _network: &NetworkId) -> Option<String> {
		None
	}
}

pub fn pipeline(adapters: Vec<ScriptedAdapter>) -> Arc<QuotePipeline> {
	let mut registry = AdapterRegistry::new();
	for adapter in adapters {
		registry.register(Arc::new(adapter)).unwrap();
	}
	let fees = FeeNormalizer::new(
		Arc::new(StaticFeeOracle::default().with_network("ethereum", 10e9, 2_000.0)),
		NetworkProfile::defaults(),
		Duration::from_millis(100),
	);
	Arc::new(QuotePipeline::new(
		Fetcher::new(Arc::new(registry), Arc::new(fees), FetcherConfig::default()),
		Arc::new(StaticPriceOracle::default()),
		Duration::from_millis(100),
	))
}

pub fn fingerprint(amount: u64) -> RequestFingerprint {
	RequestFingerprint::new(
		"ethereum",
		Asset::new(USDC, 6),
		Asset::native(18),
		QuoteAmount::Input(U256::from(amount)),
	)
}
