//! CoW Protocol adapter
//!
//! Orders are signed off-chain and settled by solvers, so the user pays no network gas. The
//! protocol fee is charged in the sell token and reported as a provider fee.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use swapquote_types::{
	AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterResult, Asset, ExecutionTarget,
	FeeDenomination, NetworkId, NetworkProfile, QuoteAdapter, QuoteAmount, QuoteRequest, RawQuote,
	U256, ZERO_ADDRESS,
};
use tracing::debug;

use crate::client_cache::ClientCache;
use crate::{parse_amount, read_json, AdapterConfig, Endpoints};

pub const DEFAULT_ENDPOINT: &str = "https://api.cow.fi";

/// GPv2 vault relayer, the allowance spender for CoW orders
pub const VAULT_RELAYER_ADDRESS: &str = "0xC92E8bdf79f0507f65a392b0ab4667716BFE0110";

pub const SETTLEMENT_ADDRESS: &str = "0x9008D19f58AAbD9eD0D60971565AA8510560ab41";

/// Eth-flow contract that wraps native sells into orders
pub const ETH_FLOW_ADDRESS: &str = "0xba3cb449bd2b4adddbc894d8697f5170800eadec";

/// (network, API path segment, wrapped native token)
const NETWORKS: &[(&str, &str, &str)] = &[
	(
		"ethereum",
		"mainnet",
		"0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
	),
	("gnosis", "xdai", "0xe91D153E0b41518A2Ce8Dd3D7944Fa863463a97d"),
	(
		"arbitrum",
		"arbitrum_one",
		"0x82aF49447D8a07e3bd95BD0d56f35241523fBab1",
	),
	("base", "base", "0x4200000000000000000000000000000000000006"),
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CowQuoteRequest {
	sell_token: String,
	buy_token: String,
	from: String,
	receiver: String,
	kind: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	sell_amount_before_fee: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	buy_amount_after_fee: Option<String>,
	partially_fillable: bool,
	signing_scheme: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	onchain_order: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct CowQuoteResponse {
	quote: CowQuote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CowQuote {
	sell_amount: Option<String>,
	buy_amount: Option<String>,
	#[serde(default)]
	fee_amount: Option<String>,
}

#[derive(Debug, Clone)]
struct CowNetwork {
	path: &'static str,
	wrapped_native: &'static str,
}

/// CoW Swap adapter
#[derive(Debug)]
pub struct CowSwapAdapter {
	descriptor: AdapterDescriptor,
	endpoints: Endpoints,
	timeout_ms: u64,
	networks: BTreeMap<NetworkId, CowNetwork>,
	client: Arc<Client>,
}

impl CowSwapAdapter {
	pub fn new(
		config: &AdapterConfig,
		catalog: &[NetworkProfile],
		cache: &ClientCache,
	) -> AdapterResult<Self> {
		let native: Vec<&str> = NETWORKS.iter().map(|(id, _, _)| *id).collect();
		let networks: BTreeMap<NetworkId, CowNetwork> = config
			.served_networks(&native, catalog)
			.into_keys()
			.filter_map(|id| {
				NETWORKS
					.iter()
					.find(|(name, _, _)| *name == id.as_str())
					.map(|&(_, path, wrapped_native)| {
						(
							id.clone(),
							CowNetwork {
								path,
								wrapped_native,
							},
						)
					})
			})
			.collect();

		Ok(Self {
			descriptor: AdapterDescriptor::new(
				config.name(),
				networks.keys().cloned(),
				AdapterCapabilities {
					supports_output_amount_quoting: true,
					requires_offchain_signature: true,
					is_feeless: true,
				},
			),
			endpoints: config.endpoints(DEFAULT_ENDPOINT),
			timeout_ms: config.timeout_ms,
			networks,
			client: cache.get_client(&config.client_config(DEFAULT_ENDPOINT))?,
		})
	}

	fn build_request(request: &QuoteRequest, network: &CowNetwork) -> CowQuoteRequest {
		let native_sell = request.from_asset.is_native();
		let sell_token = if native_sell {
			network.wrapped_native.to_string()
		} else {
			request.from_asset.address.clone()
		};
		let from = request
			.user_address
			.clone()
			.unwrap_or_else(|| ZERO_ADDRESS.to_string());

		let (kind, sell_amount_before_fee, buy_amount_after_fee) = match &request.amount {
			QuoteAmount::Input(amount) => ("sell", Some(amount.to_string()), None),
			QuoteAmount::Output(amount) => ("buy", None, Some(amount.to_string())),
		};

		CowQuoteRequest {
			sell_token,
			buy_token: request.to_asset.provider_address().to_string(),
			receiver: from.clone(),
			from,
			kind,
			sell_amount_before_fee,
			buy_amount_after_fee,
			partially_fillable: false,
			signing_scheme: if native_sell { "eip1271" } else { "eip712" },
			onchain_order: native_sell.then_some(true),
		}
	}
}

/// Convert a CoW quote body; `amount_in` includes the fee so it matches the requested sell
/// amount for sell orders
fn parse_quote_response(body: serde_json::Value, from_asset: &Asset) -> AdapterResult<RawQuote> {
	let response: CowQuoteResponse = serde_json::from_value(body.clone())?;
	let sell_amount = parse_amount(response.quote.sell_amount.as_deref(), "sellAmount")?;
	let buy_amount = parse_amount(response.quote.buy_amount.as_deref(), "buyAmount")?;
	let fee_amount = match response.quote.fee_amount.as_deref() {
		Some(fee) => parse_amount(Some(fee), "feeAmount")?,
		None => U256::zero(),
	};

	let amount_in = sell_amount
		.checked_add(&fee_amount)
		.ok_or_else(|| AdapterError::invalid_response("sellAmount + feeAmount overflows"))?;

	let mut quote = RawQuote::new(buy_amount, body).with_amount_in(amount_in);
	if !fee_amount.is_zero() {
		quote = quote.with_provider_fee(fee_amount, FeeDenomination::InputAsset);
	}
	if !from_asset.is_native() {
		quote = quote.with_approval_address(VAULT_RELAYER_ADDRESS);
	}
	Ok(quote)
}

#[async_trait]
impl QuoteAdapter for CowSwapAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn get_quote(&self, request: &QuoteRequest) -> AdapterResult<RawQuote> {
		let network =
			self.networks
				.get(&request.network)
				.ok_or_else(|| AdapterError::NetworkNotSupported {
					network: request.network.to_string(),
					adapter: self.descriptor.name.clone(),
				})?;

		let url = format!(
			"{}/{}/api/v1/quote",
			self.endpoints.for_request(request),
			network.path
		);
		let body = Self::build_request(request, network);
		debug!(
			"CowSwap {} quote on {}: {} -> {}",
			body.kind, network.path, body.sell_token, body.buy_token
		);

		let response = read_json(
			self.client.post(&url).json(&body).send().await,
			self.timeout_ms,
		)
		.await?;
		parse_quote_response(response, &request.from_asset)
	}

	/// The signed order is submitted off-chain; the payload is its JSON form
	fn execution_payload(&self, quote: &RawQuote) -> Vec<u8> {
		quote
			.execution_payload
			.get("quote")
			.and_then(|q| serde_json::to_vec(q).ok())
			.unwrap_or_default()
	}

	fn execution_target(&self, quote: &RawQuote) -> AdapterResult<ExecutionTarget> {
		let onchain = quote
			.execution_payload
			.pointer("/quote/signingScheme")
			.and_then(|v| v.as_str())
			== Some("eip1271");

		if onchain {
			// Native sells lock the full amount in the eth-flow contract
			let value = quote.amount_in.clone().unwrap_or_else(U256::zero);
			return Ok(ExecutionTarget {
				to: ETH_FLOW_ADDRESS.to_string(),
				data: "0x".to_string(),
				value,
			});
		}

		Ok(ExecutionTarget {
			to: SETTLEMENT_ADDRESS.to_string(),
			data: "0x".to_string(),
			value: U256::zero(),
		})
	}

	fn approval_address(&self, _network: &NetworkId) -> Option<String> {
		Some(VAULT_RELAYER_ADDRESS.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

	fn body() -> serde_json::Value {
		json!({
			"quote": {
				"sellToken": USDC,
				"buyToken": "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
				"sellAmount": "998000000",
				"buyAmount": "400000000000000000",
				"feeAmount": "2000000",
				"kind": "sell",
				"signingScheme": "eip712"
			},
			"from": ZERO_ADDRESS,
			"id": 1
		})
	}

	fn request(amount: QuoteAmount, from_asset: Asset) -> QuoteRequest {
		QuoteRequest {
			network: NetworkId::from("ethereum"),
			from_asset,
			to_asset: Asset::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18),
			amount,
			slippage_bps: 50,
			user_address: None,
			private: false,
		}
	}

	#[test]
	fn test_amount_in_includes_fee() {
		let quote = parse_quote_response(body(), &Asset::new(USDC, 6)).unwrap();
		assert_eq!(quote.amount_in.unwrap().as_str(), "1000000000");
		assert_eq!(quote.amount_out.as_str(), "400000000000000000");
		let fee = quote.provider_fee.unwrap();
		assert_eq!(fee.amount.as_str(), "2000000");
		assert_eq!(fee.denomination, FeeDenomination::InputAsset);
		assert_eq!(
			quote.approval_address_override.as_deref(),
			Some(VAULT_RELAYER_ADDRESS)
		);
	}

	#[test]
	fn test_zero_fee_is_not_reported() {
		let mut body = body();
		body["quote"]["feeAmount"] = json!("0");
		let quote = parse_quote_response(body, &Asset::new(USDC, 6)).unwrap();
		assert!(quote.provider_fee.is_none());
	}

	#[test]
	fn test_missing_buy_amount_is_malformed() {
		let mut body = body();
		body["quote"].as_object_mut().unwrap().remove("buyAmount");
		assert!(parse_quote_response(body, &Asset::new(USDC, 6))
			.unwrap_err()
			.is_malformed());
	}

	#[test]
	fn test_build_request_directions() {
		let network = CowNetwork {
			path: "mainnet",
			wrapped_native: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
		};

		let sell = CowSwapAdapter::build_request(
			&request(QuoteAmount::Input(U256::from("5")), Asset::new(USDC, 6)),
			&network,
		);
		assert_eq!(sell.kind, "sell");
		assert_eq!(sell.sell_amount_before_fee.as_deref(), Some("5"));
		assert!(sell.buy_amount_after_fee.is_none());
		assert_eq!(sell.signing_scheme, "eip712");

		let native_buy = CowSwapAdapter::build_request(
			&request(QuoteAmount::Output(U256::from("7")), Asset::native(18)),
			&network,
		);
		assert_eq!(native_buy.kind, "buy");
		assert_eq!(native_buy.buy_amount_after_fee.as_deref(), Some("7"));
		assert_eq!(native_buy.sell_token, network.wrapped_native);
		assert_eq!(native_buy.onchain_order, Some(true));
	}

	#[test]
	fn test_execution_target() {
		let adapter = CowSwapAdapter::new(
			&AdapterConfig::new(swapquote_types::AdapterKind::CowSwap),
			&NetworkProfile::defaults(),
			&ClientCache::new(),
		)
		.unwrap();
		let quote = parse_quote_response(body(), &Asset::new(USDC, 6)).unwrap();
		let target = adapter.execution_target(&quote).unwrap();
		assert_eq!(target.to, SETTLEMENT_ADDRESS);
		assert!(target.value.is_zero());
		assert!(!adapter.execution_payload(&quote).is_empty());

		let mut native = body();
		native["quote"]["signingScheme"] = json!("eip1271");
		let quote = parse_quote_response(native, &Asset::native(18)).unwrap();
		let target = adapter.execution_target(&quote).unwrap();
		assert_eq!(target.to, ETH_FLOW_ADDRESS);
		assert_eq!(target.value.as_str(), "1000000000");
	}

	#[test]
	fn test_descriptor_is_gasless_and_output_capable() {
		let adapter = CowSwapAdapter::new(
			&AdapterConfig::new(swapquote_types::AdapterKind::CowSwap),
			&NetworkProfile::defaults(),
			&ClientCache::new(),
		)
		.unwrap();
		let caps = adapter.descriptor().capabilities;
		assert!(caps.is_feeless);
		assert!(caps.supports_output_amount_quoting);
		assert!(adapter.descriptor().supports_network(&NetworkId::from("gnosis")));
		assert!(!adapter.descriptor().supports_network(&NetworkId::from("optimism")));
	}
}
