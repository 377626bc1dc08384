//! Engine and request fixtures

#![allow(dead_code)]

use std::sync::Arc;

use swapquote::service::{StaticFeeOracle, StaticPriceOracle};
use swapquote::{
	Asset, QuoteAmount, QuoteEngine, RequestFingerprint, Settings, SwapQuoteBuilder, U256,
};

use super::adapters::MockAdapter;

pub const TOKEN_X: &str = "0x1111111111111111111111111111111111111111";
pub const TOKEN_Y: &str = "0x2222222222222222222222222222222222222222";

/// Settings with short timeouts and no configured adapters
pub fn settings() -> Settings {
	let mut settings = Settings::default();
	settings.engine.adapter_timeout_ms = 300;
	settings.engine.oracle_timeout_ms = 200;
	settings.engine.debounce_ms = 30;
	settings.engine.refresh_interval_ms = 60_000;
	settings
}

/// 10 gwei gas and $2000 native on ethereum: 100k gas units cost $2.00
pub fn fee_oracle() -> StaticFeeOracle {
	StaticFeeOracle::default().with_network("ethereum", 10e9, 2_000.0)
}

pub fn engine_with(adapters: &[&MockAdapter], prices: Option<StaticPriceOracle>) -> QuoteEngine {
	let mut builder = SwapQuoteBuilder::from_config(settings())
		.with_fee_oracle(Arc::new(fee_oracle()))
		.with_price_oracle(Arc::new(prices.unwrap_or_default()));
	for adapter in adapters {
		builder = builder.with_adapter(adapter.arc());
	}
	builder.build_engine().expect("engine builds")
}

/// X (6 decimals) to Y (6 decimals) on ethereum
pub fn fingerprint(amount: u64) -> RequestFingerprint {
	RequestFingerprint::new(
		"ethereum",
		Asset::new(TOKEN_X, 6),
		Asset::new(TOKEN_Y, 6),
		QuoteAmount::Input(U256::from(amount)),
	)
}
