//! Oracles backed by fixed readings from configuration

use std::collections::HashMap;

use async_trait::async_trait;
use swapquote_types::{
	checked_reading, Asset, FeeOracle, NetworkId, OracleError, OracleResult, PriceOracle,
	ZERO_ADDRESS,
};

/// Fee oracle returning configured per-network readings
///
/// A network without an entry is unavailable, which the engine reports as unknown gas.
#[derive(Debug, Clone, Default)]
pub struct StaticFeeOracle {
	gas_price_wei: HashMap<NetworkId, f64>,
	native_usd: HashMap<NetworkId, f64>,
	data_fee_wei_per_byte: HashMap<NetworkId, f64>,
}

fn keyed(map: &HashMap<String, f64>) -> HashMap<NetworkId, f64> {
	map.iter()
		.map(|(network, value)| (NetworkId::from(network.as_str()), *value))
		.collect()
}

impl StaticFeeOracle {
	pub fn new(
		gas_price_wei: &HashMap<String, f64>,
		native_usd: &HashMap<String, f64>,
		data_fee_wei_per_byte: &HashMap<String, f64>,
	) -> Self {
		Self {
			gas_price_wei: keyed(gas_price_wei),
			native_usd: keyed(native_usd),
			data_fee_wei_per_byte: keyed(data_fee_wei_per_byte),
		}
	}

	pub fn with_network(
		mut self,
		network: impl Into<NetworkId>,
		gas_price_wei: f64,
		native_usd: f64,
	) -> Self {
		let network = network.into();
		self.gas_price_wei.insert(network.clone(), gas_price_wei);
		self.native_usd.insert(network, native_usd);
		self
	}

	pub fn with_data_fee(mut self, network: impl Into<NetworkId>, wei_per_byte: f64) -> Self {
		self.data_fee_wei_per_byte.insert(network.into(), wei_per_byte);
		self
	}

	fn lookup(map: &HashMap<NetworkId, f64>, network: &NetworkId, what: &str) -> OracleResult<f64> {
		map.get(network)
			.copied()
			.ok_or_else(|| OracleError::unavailable(network, format!("no configured {}", what)))
			.and_then(checked_reading)
	}
}

#[async_trait]
impl FeeOracle for StaticFeeOracle {
	async fn current_gas_price(&self, network: &NetworkId) -> OracleResult<f64> {
		Self::lookup(&self.gas_price_wei, network, "gas price")
	}

	async fn native_asset_usd_price(&self, network: &NetworkId) -> OracleResult<f64> {
		Self::lookup(&self.native_usd, network, "native asset price")
	}

	async fn settlement_data_fee(&self, network: &NetworkId, payload: &[u8]) -> OracleResult<f64> {
		if payload.is_empty() {
			return Err(OracleError::unavailable(network, "empty execution payload"));
		}
		let per_byte = Self::lookup(&self.data_fee_wei_per_byte, network, "data fee")?;
		Ok(per_byte * payload.len() as f64)
	}
}

/// Price oracle over a fixed `network:address` table
#[derive(Debug, Clone, Default)]
pub struct StaticPriceOracle {
	prices: HashMap<String, f64>,
}

impl StaticPriceOracle {
	pub fn new(prices: &HashMap<String, f64>) -> Self {
		Self {
			prices: prices
				.iter()
				.map(|(key, price)| (key.to_lowercase(), *price))
				.collect(),
		}
	}

	pub fn with_price(mut self, network: &str, asset: &Asset, price: f64) -> Self {
		self.prices
			.insert(Self::key(&NetworkId::from(network), asset), price);
		self
	}

	fn key(network: &NetworkId, asset: &Asset) -> String {
		let address = if asset.is_native() {
			ZERO_ADDRESS
		} else {
			asset.address.as_str()
		};
		format!("{}:{}", network, address).to_lowercase()
	}
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
	async fn asset_usd_price(&self, network: &NetworkId, asset: &Asset) -> OracleResult<f64> {
		let key = Self::key(network, asset);
		self.prices
			.get(&key)
			.copied()
			.ok_or_else(|| OracleError::unavailable(network, format!("no price for {}", key)))
			.and_then(checked_reading)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use swapquote_types::NATIVE_PLACEHOLDER_ADDRESS;

	#[tokio::test]
	async fn test_static_fee_readings() {
		let oracle = StaticFeeOracle::default()
			.with_network("ethereum", 20e9, 3_000.0)
			.with_data_fee("base", 16.0);
		let ethereum = NetworkId::from("ethereum");
		let base = NetworkId::from("base");

		assert_eq!(oracle.current_gas_price(&ethereum).await, Ok(20e9));
		assert_eq!(oracle.native_asset_usd_price(&ethereum).await, Ok(3_000.0));
		assert!(oracle.current_gas_price(&base).await.is_err());
		assert_eq!(oracle.settlement_data_fee(&base, &[1, 2, 3]).await, Ok(48.0));
		assert!(oracle.settlement_data_fee(&base, &[]).await.is_err());
		assert!(oracle.settlement_data_fee(&ethereum, &[1]).await.is_err());
	}

	#[tokio::test]
	async fn test_negative_reading_is_rejected() {
		let oracle = StaticFeeOracle::default().with_network("ethereum", -1.0, 3_000.0);
		assert!(matches!(
			oracle
				.current_gas_price(&NetworkId::from("ethereum"))
				.await,
			Err(OracleError::InvalidValue { .. })
		));
	}

	#[tokio::test]
	async fn test_static_price_keys() {
		let mut table = HashMap::new();
		table.insert(
			"ethereum:0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
			1.0,
		);
		table.insert(format!("ethereum:{}", ZERO_ADDRESS), 3_000.0);
		let oracle = StaticPriceOracle::new(&table);
		let ethereum = NetworkId::from("ethereum");

		let usdc = Asset::new("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6);
		assert_eq!(oracle.asset_usd_price(&ethereum, &usdc).await, Ok(1.0));

		let placeholder = Asset::new(NATIVE_PLACEHOLDER_ADDRESS, 18);
		assert_eq!(oracle.asset_usd_price(&ethereum, &placeholder).await, Ok(3_000.0));
		assert!(oracle
			.asset_usd_price(&NetworkId::from("base"), &usdc)
			.await
			.is_err());
	}
}
