//! Scripted quote adapters with call tracking
//!
//! Each adapter returns a fixed output amount and gas estimate, optionally after a delay,
//! or misbehaves in a chosen way.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use swapquote::serde_json::json;
use swapquote::types::ProviderFee;
use swapquote::{
	AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterResult, ExecutionTarget,
	NetworkId, QuoteAdapter, QuoteAmount, QuoteRequest, RawQuote, U256,
};

/// How a mock adapter answers
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
	Quote,
	Error,
	/// Gas estimate NaN
	Malformed,
	/// Never answers within any sensible timeout
	Hang,
	Panic,
}

#[derive(Debug, Clone)]
pub struct MockAdapter {
	descriptor: AdapterDescriptor,
	output: U256,
	gas_units: Option<f64>,
	provider_fee: Option<ProviderFee>,
	delay: Duration,
	behavior: Behavior,
	calls: Arc<AtomicUsize>,
	active: Arc<AtomicUsize>,
	max_active: Arc<AtomicUsize>,
}

impl MockAdapter {
	pub fn new(name: &str, output: u64, gas_units: Option<f64>) -> Self {
		Self {
			descriptor: AdapterDescriptor::new(
				name,
				["ethereum", "base"],
				AdapterCapabilities::default(),
			),
			output: U256::from(output),
			gas_units,
			provider_fee: None,
			delay: Duration::ZERO,
			behavior: Behavior::Quote,
			calls: Arc::new(AtomicUsize::new(0)),
			active: Arc::new(AtomicUsize::new(0)),
			max_active: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn with_behavior(mut self, behavior: Behavior) -> Self {
		self.behavior = behavior;
		self
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn with_capabilities(mut self, capabilities: AdapterCapabilities) -> Self {
		self.descriptor.capabilities = capabilities;
		self
	}

	pub fn with_networks<const N: usize>(mut self, networks: [&str; N]) -> Self {
		self.descriptor.supported_networks = networks.into_iter().map(NetworkId::from).collect();
		self
	}

	pub fn with_provider_fee(mut self, fee: ProviderFee) -> Self {
		self.provider_fee = Some(fee);
		self
	}

	pub fn arc(&self) -> Arc<dyn QuoteAdapter> {
		Arc::new(self.clone())
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn max_concurrent_calls(&self) -> usize {
		self.max_active.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl QuoteAdapter for MockAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn get_quote(&self, request: &QuoteRequest) -> AdapterResult<RawQuote> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_active.fetch_max(active, Ordering::SeqCst);

		let delay = match self.behavior {
			Behavior::Hang => Duration::from_secs(30),
			_ => self.delay,
		};
		tokio::time::sleep(delay).await;
		self.active.fetch_sub(1, Ordering::SeqCst);

		let mut quote = match (&self.behavior, &request.amount) {
			(Behavior::Error, _) => {
				return Err(AdapterError::QuoteUnavailable {
					adapter: self.descriptor.name.clone(),
					reason: "scripted failure".to_string(),
				})
			},
			(Behavior::Panic, _) => panic!("scripted panic in {}", self.descriptor.name),
			(_, QuoteAmount::Input(_)) => RawQuote::new(self.output.clone(), json!({})),
			// Output-specified: the scripted output is the input it would take
			(_, QuoteAmount::Output(wanted)) => {
				RawQuote::new(wanted.clone(), json!({})).with_amount_in(self.output.clone())
			},
		};

		quote.estimated_gas_units = match self.behavior {
			Behavior::Malformed => Some(f64::NAN),
			_ => self.gas_units,
		};
		quote.provider_fee = self.provider_fee.clone();
		Ok(quote)
	}

	fn execution_payload(&self, _quote: &RawQuote) -> Vec<u8> {
		vec![0xde, 0xad, 0xbe, 0xef]
	}

	fn execution_target(&self, _quote: &RawQuote) -> AdapterResult<ExecutionTarget> {
		Ok(ExecutionTarget {
			to: "0xDef1C0ded9bec7F1a1670819833240f027b25EfF".to_string(),
			data: "0xdeadbeef".to_string(),
			value: U256::zero(),
		})
	}

	fn approval_address(&self, _network: &NetworkId) -> Option<String> {
		Some("0xDef1C0ded9bec7F1a1670819833240f027b25EfF".to_string())
	}
}
