//! Adapter descriptors and raw provider quotes

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{NetworkId, U256};

/// Built-in adapter implementations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
	/// 0x permit2 swap API
	ZeroX,
	/// CoW Protocol batch auctions
	CowSwap,
	/// ParaSwap aggregator API
	ParaSwap,
}

impl AdapterKind {
	pub fn default_name(&self) -> &'static str {
		match self {
			AdapterKind::ZeroX => "0x",
			AdapterKind::CowSwap => "CowSwap",
			AdapterKind::ParaSwap => "ParaSwap",
		}
	}
}

/// Declared capabilities, branched on by the fetcher instead of probing responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AdapterCapabilities {
	/// Can quote a fixed output amount
	pub supports_output_amount_quoting: bool,
	/// Execution needs an off-chain signature (permit2, signed order)
	pub requires_offchain_signature: bool,
	/// The user pays no network gas; costs are taken from the trade
	pub is_feeless: bool,
}

/// Static description of an adapter, immutable for the process lifetime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterDescriptor {
	pub name: String,
	pub supported_networks: BTreeSet<NetworkId>,
	pub capabilities: AdapterCapabilities,
}

impl AdapterDescriptor {
	pub fn new<I, N>(name: impl Into<String>, networks: I, capabilities: AdapterCapabilities) -> Self
	where
		I: IntoIterator<Item = N>,
		N: Into<NetworkId>,
	{
		Self {
			name: name.into(),
			supported_networks: networks.into_iter().map(Into::into).collect(),
			capabilities,
		}
	}

	pub fn supports_network(&self, network: &NetworkId) -> bool {
		self.supported_networks.contains(network)
	}
}

/// Asset a provider fee is denominated in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeeDenomination {
	InputAsset,
	OutputAsset,
}

/// Fee a provider deducts from the trade itself
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderFee {
	pub amount: U256,
	pub denomination: FeeDenomination,
}

/// Provider-specific result of one adapter call
///
/// Produced once per call and consumed by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
	pub amount_out: U256,
	/// None when the provider did not echo the input amount
	pub amount_in: Option<U256>,
	/// Gas units as reported; may be NaN or negative from a misbehaving provider
	pub estimated_gas_units: Option<f64>,
	pub provider_fee: Option<ProviderFee>,
	/// Opaque provider payload the adapter extracts execution data from
	pub execution_payload: serde_json::Value,
	pub approval_address_override: Option<String>,
}

impl RawQuote {
	pub fn new(amount_out: U256, execution_payload: serde_json::Value) -> Self {
		Self {
			amount_out,
			amount_in: None,
			estimated_gas_units: None,
			provider_fee: None,
			execution_payload,
			approval_address_override: None,
		}
	}

	pub fn with_amount_in(mut self, amount_in: U256) -> Self {
		self.amount_in = Some(amount_in);
		self
	}

	pub fn with_gas_units(mut self, gas_units: f64) -> Self {
		self.estimated_gas_units = Some(gas_units);
		self
	}

	pub fn with_provider_fee(mut self, amount: U256, denomination: FeeDenomination) -> Self {
		self.provider_fee = Some(ProviderFee {
			amount,
			denomination,
		});
		self
	}

	pub fn with_approval_address(mut self, address: impl Into<String>) -> Self {
		self.approval_address_override = Some(address.into());
		self
	}
}

/// Call the caller's signing component should make
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionTarget {
	pub to: String,
	/// 0x-prefixed calldata
	pub data: String,
	pub value: U256,
}

impl ExecutionTarget {
	/// Calldata bytes, empty when the data is not valid hex
	pub fn calldata_bytes(&self) -> Vec<u8> {
		hex::decode(self.data.trim_start_matches("0x")).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_descriptor_network_support() {
		let descriptor = AdapterDescriptor::new(
			"0x",
			["ethereum", "base"],
			AdapterCapabilities::default(),
		);
		assert!(descriptor.supports_network(&NetworkId::from("base")));
		assert!(!descriptor.supports_network(&NetworkId::from("optimism")));
	}

	#[test]
	fn test_calldata_bytes() {
		let target = ExecutionTarget {
			to: "0xdef1".to_string(),
			data: "0x0a0b".to_string(),
			value: U256::zero(),
		};
		assert_eq!(target.calldata_bytes(), vec![0x0a, 0x0b]);

		let bad = ExecutionTarget {
			data: "0xzz".to_string(),
			..target
		};
		assert!(bad.calldata_bytes().is_empty());
	}
}
