//! DefiLlama coins API price oracle

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use swapquote_types::{checked_reading, Asset, NetworkId, OracleError, OracleResult, PriceOracle};

use super::request_error;
use crate::client_cache::{ClientCache, ClientConfig};

pub const DEFAULT_ENDPOINT: &str = "https://coins.llama.fi";

#[derive(Debug)]
pub struct LlamaPriceOracle {
	base_url: String,
	client: Arc<Client>,
	timeout_ms: u64,
	chain_names: HashMap<NetworkId, String>,
}

impl LlamaPriceOracle {
	pub fn new(endpoint: Option<&str>, cache: &ClientCache, timeout_ms: u64) -> OracleResult<Self> {
		let base_url = endpoint
			.unwrap_or(DEFAULT_ENDPOINT)
			.trim_end_matches('/')
			.to_string();
		let client = cache
			.get_client(&ClientConfig::new("defillama", &base_url, timeout_ms))
			.map_err(|e| OracleError::Unavailable {
				network: "*".to_string(),
				reason: e.to_string(),
			})?;

		// Networks whose DefiLlama chain name differs from ours
		let chain_names = [("gnosis", "xdai")]
			.into_iter()
			.map(|(ours, theirs)| (NetworkId::from(ours), theirs.to_string()))
			.collect();

		Ok(Self {
			base_url,
			client,
			timeout_ms,
			chain_names,
		})
	}

	/// `{chain}:{address}` key used by the coins API
	pub fn coin_key(&self, network: &NetworkId, asset: &Asset) -> String {
		let chain = self
			.chain_names
			.get(network)
			.map(String::as_str)
			.unwrap_or(network.as_str());
		let address = if asset.is_native() {
			swapquote_types::ZERO_ADDRESS.to_string()
		} else {
			asset.address.to_lowercase()
		};
		format!("{}:{}", chain, address)
	}
}

fn extract_price(body: &serde_json::Value, key: &str) -> OracleResult<f64> {
	let price = body
		.pointer(&format!("/coins/{}/price", key.replace('/', "~1")))
		.and_then(|p| p.as_f64())
		.ok_or_else(|| OracleError::InvalidValue {
			reason: format!("no price for {}", key),
		})?;
	checked_reading(price)
}

#[async_trait]
impl PriceOracle for LlamaPriceOracle {
	async fn asset_usd_price(&self, network: &NetworkId, asset: &Asset) -> OracleResult<f64> {
		let key = self.coin_key(network, asset);
		let body: serde_json::Value = self
			.client
			.get(format!("{}/prices/current/{}", self.base_url, key))
			.send()
			.await
			.map_err(|e| request_error(network, e, self.timeout_ms))?
			.error_for_status()
			.map_err(|e| request_error(network, e, self.timeout_ms))?
			.json()
			.await
			.map_err(|e| request_error(network, e, self.timeout_ms))?;
		extract_price(&body, &key)
	}
}
