//! JSON-RPC fee oracle
//!
//! Gas price from `eth_gasPrice`; settlement data fee from the OP-stack `GasPriceOracle`
//! predeploy (`getL1Fee(bytes)`); native USD price delegated to a price oracle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use swapquote_types::{
	checked_reading, Asset, FeeOracle, NetworkId, NetworkProfile, OracleError, OracleResult,
	PriceOracle,
};
use tracing::debug;

use super::request_error;
use crate::client_cache::{ClientCache, ClientConfig};

/// OP-stack `GasPriceOracle` predeploy
pub const GAS_PRICE_ORACLE_ADDRESS: &str = "0x420000000000000000000000000000000000000F";

/// `getL1Fee(bytes)` selector
const GET_L1_FEE_SELECTOR: [u8; 4] = [0x49, 0x94, 0x8e, 0x0e];

pub struct RpcFeeOracle {
	endpoints: HashMap<NetworkId, (String, Arc<Client>)>,
	native_decimals: HashMap<NetworkId, u8>,
	price_oracle: Arc<dyn PriceOracle>,
	timeout_ms: u64,
	request_id: AtomicU64,
}

impl std::fmt::Debug for RpcFeeOracle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RpcFeeOracle")
			.field("networks", &self.endpoints.keys().collect::<Vec<_>>())
			.field("timeout_ms", &self.timeout_ms)
			.finish()
	}
}

impl RpcFeeOracle {
	pub fn new(
		rpc_urls: HashMap<NetworkId, String>,
		catalog: &[NetworkProfile],
		price_oracle: Arc<dyn PriceOracle>,
		cache: &ClientCache,
		timeout_ms: u64,
	) -> OracleResult<Self> {
		let mut endpoints = HashMap::new();
		for (network, url) in rpc_urls {
			let client = cache
				.get_client(&ClientConfig::new(format!("rpc:{}", network), &url, timeout_ms))
				.map_err(|e| OracleError::unavailable(&network, e.to_string()))?;
			endpoints.insert(network, (url, client));
		}

		Ok(Self {
			endpoints,
			native_decimals: catalog
				.iter()
				.map(|p| (p.id.clone(), p.native_decimals))
				.collect(),
			price_oracle,
			timeout_ms,
			request_id: AtomicU64::new(1),
		})
	}

	async fn call(
		&self,
		network: &NetworkId,
		method: &str,
		params: serde_json::Value,
	) -> OracleResult<String> {
		let (url, client) = self
			.endpoints
			.get(network)
			.ok_or_else(|| OracleError::unavailable(network, "no RPC endpoint configured"))?;

		let body = json!({
			"jsonrpc": "2.0",
			"id": self.request_id.fetch_add(1, Ordering::Relaxed),
			"method": method,
			"params": params,
		});

		let response: serde_json::Value = client
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(|e| request_error(network, e, self.timeout_ms))?
			.json()
			.await
			.map_err(|e| request_error(network, e, self.timeout_ms))?;

		if let Some(error) = response.get("error") {
			return Err(OracleError::unavailable(
				network,
				format!("{} failed: {}", method, error),
			));
		}
		response
			.get("result")
			.and_then(|r| r.as_str())
			.map(str::to_string)
			.ok_or_else(|| OracleError::InvalidValue {
				reason: format!("{} returned no result", method),
			})
	}
}

/// Calldata for `getL1Fee(bytes payload)`
pub fn encode_get_l1_fee(payload: &[u8]) -> String {
	let padded_len = payload.len().div_ceil(32) * 32;
	let mut data = Vec::with_capacity(4 + 64 + padded_len);
	data.extend_from_slice(&GET_L1_FEE_SELECTOR);
	data.extend_from_slice(&word(32));
	data.extend_from_slice(&word(payload.len() as u128));
	data.extend_from_slice(payload);
	data.resize(4 + 64 + padded_len, 0);
	format!("0x{}", hex::encode(data))
}

fn word(value: u128) -> [u8; 32] {
	let mut out = [0u8; 32];
	out[16..].copy_from_slice(&value.to_be_bytes());
	out
}

/// Parse a 0x-prefixed quantity into a float
pub fn parse_quantity(value: &str) -> OracleResult<f64> {
	let digits = value.trim_start_matches("0x");
	if digits.is_empty() {
		return Ok(0.0);
	}
	let mut acc = 0f64;
	for c in digits.chars() {
		let d = c.to_digit(16).ok_or_else(|| OracleError::InvalidValue {
			reason: format!("'{}' is not a hex quantity", value),
		})?;
		acc = acc * 16.0 + d as f64;
	}
	checked_reading(acc)
}

#[async_trait]
impl FeeOracle for RpcFeeOracle {
	async fn current_gas_price(&self, network: &NetworkId) -> OracleResult<f64> {
		let result = self.call(network, "eth_gasPrice", json!([])).await?;
		parse_quantity(&result)
	}

	async fn native_asset_usd_price(&self, network: &NetworkId) -> OracleResult<f64> {
		let decimals = self.native_decimals.get(network).copied().unwrap_or(18);
		self.price_oracle
			.asset_usd_price(network, &Asset::native(decimals))
			.await
	}

	async fn settlement_data_fee(&self, network: &NetworkId, payload: &[u8]) -> OracleResult<f64> {
		if payload.is_empty() {
			return Err(OracleError::InvalidValue {
				reason: "empty execution payload".to_string(),
			});
		}
		debug!(
			"Querying settlement data fee on {} for {} bytes",
			network,
			payload.len()
		);
		let result = self
			.call(
				network,
				"eth_call",
				json!([
					{ "to": GAS_PRICE_ORACLE_ADDRESS, "data": encode_get_l1_fee(payload) },
					"latest"
				]),
			)
			.await?;
		parse_quantity(&result)
	}
}
