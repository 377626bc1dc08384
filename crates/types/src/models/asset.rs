//! Asset models

use serde::{Deserialize, Serialize};

/// Zero address, used by most providers for the native asset
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Placeholder address some providers use for the native asset
pub const NATIVE_PLACEHOLDER_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// A token on a specific network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Asset {
	/// Contract address (zero address for the native asset)
	pub address: String,
	/// Number of decimal places of the smallest unit
	pub decimals: u8,
	/// Token symbol, informational only
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub symbol: Option<String>,
}

impl Asset {
	pub fn new(address: impl Into<String>, decimals: u8) -> Self {
		Self {
			address: address.into(),
			decimals,
			symbol: None,
		}
	}

	pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
		self.symbol = Some(symbol.into());
		self
	}

	/// Native asset of any EVM network
	pub fn native(decimals: u8) -> Self {
		Self::new(ZERO_ADDRESS, decimals)
	}

	/// Whether this asset is the network's native asset
	pub fn is_native(&self) -> bool {
		self.address.eq_ignore_ascii_case(ZERO_ADDRESS)
			|| self.address.eq_ignore_ascii_case(NATIVE_PLACEHOLDER_ADDRESS)
	}

	/// Address in the form providers expect, mapping the native asset to the placeholder
	pub fn provider_address(&self) -> &str {
		if self.is_native() {
			NATIVE_PLACEHOLDER_ADDRESS
		} else {
			&self.address
		}
	}

	/// Basic shape validation of the address
	pub fn validate(&self) -> Result<(), String> {
		let hex_part = self
			.address
			.strip_prefix("0x")
			.ok_or_else(|| format!("Asset address '{}' must start with 0x", self.address))?;
		if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(format!(
				"Asset address '{}' is not a 20-byte hex address",
				self.address
			));
		}
		if self.decimals > 36 {
			return Err(format!("Asset decimals {} out of range", self.decimals));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_native_detection() {
		assert!(Asset::native(18).is_native());
		assert!(Asset::new(NATIVE_PLACEHOLDER_ADDRESS.to_lowercase(), 18).is_native());
		assert!(!Asset::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6).is_native());
	}

	#[test]
	fn test_provider_address_maps_native() {
		assert_eq!(Asset::native(18).provider_address(), NATIVE_PLACEHOLDER_ADDRESS);
	}

	#[test]
	fn test_validate() {
		assert!(Asset::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6)
			.validate()
			.is_ok());
		assert!(Asset::new("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6)
			.validate()
			.is_err());
		assert!(Asset::new("0x1234", 6).validate().is_err());
	}
}
