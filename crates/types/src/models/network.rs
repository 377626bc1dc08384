//! Network identifiers and fee profiles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network key as used across the engine (e.g. "ethereum", "optimism")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into().to_lowercase())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NetworkId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for NetworkId {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

/// Static information the fee normalizer needs about a network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkProfile {
	pub id: NetworkId,
	/// EVM chain id
	pub chain_id: u64,
	/// Decimals of the native gas asset
	pub native_decimals: u8,
	pub native_symbol: String,
	/// Network publishes transaction data to a settlement layer at extra cost
	pub has_settlement_data_fee: bool,
}

impl NetworkProfile {
	pub fn new(id: impl Into<NetworkId>, chain_id: u64, native_symbol: &str) -> Self {
		Self {
			id: id.into(),
			chain_id,
			native_decimals: 18,
			native_symbol: native_symbol.to_string(),
			has_settlement_data_fee: false,
		}
	}

	pub fn with_settlement_data_fee(mut self) -> Self {
		self.has_settlement_data_fee = true;
		self
	}
}

/// Common network profiles
impl NetworkProfile {
	pub fn ethereum() -> Self {
		Self::new("ethereum", 1, "ETH")
	}

	pub fn optimism() -> Self {
		Self::new("optimism", 10, "ETH").with_settlement_data_fee()
	}

	pub fn base() -> Self {
		Self::new("base", 8453, "ETH").with_settlement_data_fee()
	}

	pub fn arbitrum() -> Self {
		Self::new("arbitrum", 42161, "ETH")
	}

	pub fn polygon() -> Self {
		Self::new("polygon", 137, "POL")
	}

	pub fn bsc() -> Self {
		Self::new("bsc", 56, "BNB")
	}

	pub fn gnosis() -> Self {
		Self::new("gnosis", 100, "XDAI")
	}

	/// Catalog used when no networks are configured
	pub fn defaults() -> Vec<Self> {
		vec![
			Self::ethereum(),
			Self::optimism(),
			Self::base(),
			Self::arbitrum(),
			Self::polygon(),
			Self::bsc(),
			Self::gnosis(),
		]
	}
}
