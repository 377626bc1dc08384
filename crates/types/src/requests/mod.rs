//! Request fingerprint: the immutable key of one logical swap request

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::constants::limits::{DEFAULT_SLIPPAGE_BPS, MAX_SLIPPAGE_BPS};
use crate::models::{Asset, NetworkId, U256};

/// Which side of the swap the caller fixed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuoteDirection {
	ExactInput,
	ExactOutput,
}

/// The specified amount, in smallest units of the side it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "side", content = "amount", rename_all = "snake_case")]
pub enum QuoteAmount {
	Input(U256),
	Output(U256),
}

impl QuoteAmount {
	pub fn value(&self) -> &U256 {
		match self {
			Self::Input(v) | Self::Output(v) => v,
		}
	}

	pub fn direction(&self) -> QuoteDirection {
		match self {
			Self::Input(_) => QuoteDirection::ExactInput,
			Self::Output(_) => QuoteDirection::ExactOutput,
		}
	}

	pub fn is_input(&self) -> bool {
		matches!(self, Self::Input(_))
	}

	pub fn is_zero(&self) -> bool {
		self.value().is_zero()
	}
}

/// Extra parameters that change the answer providers give
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QuoteContext {
	/// Address that will execute the swap, if known
	#[serde(default)]
	pub user_address: Option<String>,
	/// Slippage tolerance in basis points
	#[serde(default = "default_slippage_bps")]
	pub slippage_bps: u32,
	/// Withhold the user address from providers
	#[serde(default)]
	pub privacy_enabled: bool,
	/// Caller-supplied gas price, overriding the fee oracle
	#[serde(default)]
	pub gas_price_hint_wei: Option<U256>,
	/// Adapters the caller explicitly excluded
	#[serde(default)]
	pub disabled_adapters: BTreeSet<String>,
}

fn default_slippage_bps() -> u32 {
	DEFAULT_SLIPPAGE_BPS
}

impl Default for QuoteContext {
	fn default() -> Self {
		Self {
			user_address: None,
			slippage_bps: DEFAULT_SLIPPAGE_BPS,
			privacy_enabled: false,
			gas_price_hint_wei: None,
			disabled_adapters: BTreeSet::new(),
		}
	}
}

/// Immutable key identifying one logical swap request
///
/// Two fingerprints are equal iff every field is equal; equality keys the refresh
/// scheduler's cache and in-flight tracking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RequestFingerprint {
	pub network: NetworkId,
	pub from_asset: Asset,
	pub to_asset: Asset,
	pub amount: QuoteAmount,
	#[serde(default)]
	pub context: QuoteContext,
}

impl RequestFingerprint {
	pub fn new(
		network: impl Into<NetworkId>,
		from_asset: Asset,
		to_asset: Asset,
		amount: QuoteAmount,
	) -> Self {
		Self {
			network: network.into(),
			from_asset,
			to_asset,
			amount,
			context: QuoteContext::default(),
		}
	}

	pub fn with_context(mut self, context: QuoteContext) -> Self {
		self.context = context;
		self
	}

	pub fn direction(&self) -> QuoteDirection {
		self.amount.direction()
	}

	pub fn is_adapter_disabled(&self, adapter_name: &str) -> bool {
		self.context.disabled_adapters.contains(adapter_name)
	}

	/// Stable hex digest of the canonical JSON form
	pub fn cache_key(&self) -> String {
		// BTreeSet keeps serialization order deterministic
		let canonical = serde_json::to_vec(self).unwrap_or_default();
		hex::encode(Sha256::digest(&canonical))
	}

	/// Build the adapter-facing request
	pub fn quote_request(&self) -> QuoteRequest {
		let user_address = if self.context.privacy_enabled {
			None
		} else {
			self.context.user_address.clone()
		};

		QuoteRequest {
			network: self.network.clone(),
			from_asset: self.from_asset.clone(),
			to_asset: self.to_asset.clone(),
			amount: self.amount.clone(),
			slippage_bps: self.context.slippage_bps,
			user_address,
			private: self.context.privacy_enabled,
		}
	}

	pub fn validate(&self) -> Result<(), RequestValidationError> {
		self.from_asset
			.validate()
			.map_err(|reason| RequestValidationError::InvalidAsset { reason })?;
		self.to_asset
			.validate()
			.map_err(|reason| RequestValidationError::InvalidAsset { reason })?;

		if self.from_asset.address.eq_ignore_ascii_case(&self.to_asset.address) {
			return Err(RequestValidationError::SameAsset {
				address: self.from_asset.address.clone(),
			});
		}

		if self.context.slippage_bps > MAX_SLIPPAGE_BPS {
			return Err(RequestValidationError::InvalidSlippage {
				slippage_bps: self.context.slippage_bps,
			});
		}

		self.amount
			.value()
			.validate()
			.map_err(|reason| RequestValidationError::InvalidAmount { reason })?;

		Ok(())
	}
}

/// What an adapter receives for one quote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
	pub network: NetworkId,
	pub from_asset: Asset,
	pub to_asset: Asset,
	pub amount: QuoteAmount,
	pub slippage_bps: u32,
	/// None when unknown or when the caller enabled privacy
	pub user_address: Option<String>,
	/// Route through the adapter's private endpoint when it has one
	pub private: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestValidationError {
	#[error("Invalid asset: {reason}")]
	InvalidAsset { reason: String },

	#[error("Input and output asset are the same: {address}")]
	SameAsset { address: String },

	#[error("Slippage of {slippage_bps} bps exceeds the allowed maximum")]
	InvalidSlippage { slippage_bps: u32 },

	#[error("Invalid amount: {reason}")]
	InvalidAmount { reason: String },
}

#[cfg(test)]
mod tests {
	use super::*;

	const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
	const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

	fn fingerprint() -> RequestFingerprint {
		RequestFingerprint::new(
			"ethereum",
			Asset::new(USDC, 6),
			Asset::new(WETH, 18),
			QuoteAmount::Input(U256::from("1000000")),
		)
	}

	#[test]
	fn test_equal_fingerprints_share_cache_key() {
		let a = fingerprint();
		let b = fingerprint();
		assert_eq!(a, b);
		assert_eq!(a.cache_key(), b.cache_key());
	}

	#[test]
	fn test_any_field_change_changes_identity() {
		let a = fingerprint();
		let mut b = fingerprint();
		b.context.slippage_bps = 100;
		assert_ne!(a, b);
		assert_ne!(a.cache_key(), b.cache_key());

		let c = RequestFingerprint {
			amount: QuoteAmount::Output(U256::from("1000000")),
			..fingerprint()
		};
		assert_ne!(a, c);
	}

	#[test]
	fn test_privacy_withholds_user_address() {
		let mut fp = fingerprint();
		fp.context.user_address = Some("0x742d35Cc6634C0532925a3b8D2a27F79c5a85b03".to_string());
		assert!(fp.quote_request().user_address.is_some());

		assert!(!fp.quote_request().private);

		fp.context.privacy_enabled = true;
		assert!(fp.quote_request().user_address.is_none());
		assert!(fp.quote_request().private);
	}

	#[test]
	fn test_validation() {
		assert!(fingerprint().validate().is_ok());

		let same = RequestFingerprint {
			to_asset: Asset::new(USDC.to_lowercase(), 6),
			..fingerprint()
		};
		assert!(matches!(
			same.validate(),
			Err(RequestValidationError::SameAsset { .. })
		));

		let mut slippage = fingerprint();
		slippage.context.slippage_bps = MAX_SLIPPAGE_BPS + 1;
		assert!(matches!(
			slippage.validate(),
			Err(RequestValidationError::InvalidSlippage { .. })
		));
	}

	#[test]
	fn test_amount_serialization_shape() {
		let json = serde_json::to_value(QuoteAmount::Output(U256::from("5"))).unwrap();
		assert_eq!(json["side"], "output");
		assert_eq!(json["amount"], "5");
	}
}
