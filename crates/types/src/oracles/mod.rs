//! Fee and price oracle interfaces
//!
//! Any `Err` from an oracle is treated by the engine as "unknown", never as zero.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Asset, NetworkId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
	#[error("Oracle unavailable for {network}: {reason}")]
	Unavailable { network: String, reason: String },

	#[error("Oracle lookup timed out after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Oracle returned an invalid value: {reason}")]
	InvalidValue { reason: String },
}

impl OracleError {
	pub fn unavailable(network: &NetworkId, reason: impl Into<String>) -> Self {
		Self::Unavailable {
			network: network.to_string(),
			reason: reason.into(),
		}
	}
}

pub type OracleResult<T> = Result<T, OracleError>;

/// Reject NaN, infinite and negative oracle readings
pub fn checked_reading(value: f64) -> OracleResult<f64> {
	if value.is_finite() && value >= 0.0 {
		Ok(value)
	} else {
		Err(OracleError::InvalidValue {
			reason: format!("{} is not a finite non-negative number", value),
		})
	}
}

/// Network cost data source
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeeOracle: Send + Sync {
	/// Gas price in the network's smallest native unit per gas
	async fn current_gas_price(&self, network: &NetworkId) -> OracleResult<f64>;

	/// USD price of one whole native asset
	async fn native_asset_usd_price(&self, network: &NetworkId) -> OracleResult<f64>;

	/// Settlement-layer data fee for publishing `payload`, in smallest native units
	async fn settlement_data_fee(&self, network: &NetworkId, payload: &[u8]) -> OracleResult<f64>;
}

/// Asset USD price source used by the ranker
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
	/// USD price of one whole unit of `asset`
	async fn asset_usd_price(&self, network: &NetworkId, asset: &Asset) -> OracleResult<f64>;
}
