//! Adapter eligibility for a fingerprint

use std::sync::Arc;

use swapquote_adapters::AdapterRegistry;
use swapquote_types::{QuoteAdapter, RequestFingerprint};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
	Eligible,
	/// The adapter does not serve the target network
	NetworkNotSupported,
	/// The caller excluded the adapter
	Disabled,
}

pub fn eligibility(adapter: &dyn QuoteAdapter, fingerprint: &RequestFingerprint) -> Eligibility {
	let descriptor = adapter.descriptor();
	if fingerprint.is_adapter_disabled(&descriptor.name) {
		Eligibility::Disabled
	} else if !descriptor.supports_network(&fingerprint.network) {
		Eligibility::NetworkNotSupported
	} else {
		Eligibility::Eligible
	}
}

/// Eligible adapters in registration order
pub fn eligible_adapters(
	registry: &AdapterRegistry,
	fingerprint: &RequestFingerprint,
) -> Vec<Arc<dyn QuoteAdapter>> {
	registry
		.iter()
		.filter(|adapter| match eligibility(adapter.as_ref(), fingerprint) {
			Eligibility::Eligible => true,
			other => {
				debug!(
					"Skipping adapter {} for {}: {:?}",
					adapter.descriptor().name,
					fingerprint.network,
					other
				);
				false
			},
		})
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use swapquote_types::{
		AdapterCapabilities, AdapterDescriptor, Asset, MockQuoteAdapter, QuoteAmount, U256,
	};

	fn mock(name: &str, networks: &[&str]) -> Arc<dyn QuoteAdapter> {
		let mut adapter = MockQuoteAdapter::new();
		adapter.expect_descriptor().return_const(AdapterDescriptor::new(
			name,
			networks.iter().copied(),
			AdapterCapabilities::default(),
		));
		Arc::new(adapter)
	}

	#[test]
	fn test_filters_by_network_and_disabled_set() {
		let mut registry = AdapterRegistry::new();
		registry.register(mock("a", &["ethereum", "base"])).unwrap();
		registry.register(mock("b", &["base"])).unwrap();
		registry.register(mock("c", &["ethereum"])).unwrap();

		let mut fp = RequestFingerprint::new(
			"ethereum",
			Asset::native(18),
			Asset::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
			QuoteAmount::Input(U256::from("1")),
		);
		let names = |fp: &RequestFingerprint| -> Vec<String> {
			eligible_adapters(&registry, fp)
				.iter()
				.map(|a| a.descriptor().name.clone())
				.collect()
		};
		assert_eq!(names(&fp), vec!["a", "c"]);

		fp.context.disabled_adapters.insert("a".to_string());
		assert_eq!(names(&fp), vec!["c"]);
	}
}
