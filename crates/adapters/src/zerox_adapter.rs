//! 0x permit2 swap API adapter
//!
//! Input-amount quotes only. Execution requires signing the permit2 EIP-712 message, and the
//! quote is rejected when the permit2 verifying contract is not the expected approval address.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use swapquote_types::{
	AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterResult, ExecutionTarget,
	NetworkId, NetworkProfile, QuoteAdapter, QuoteAmount, QuoteRequest, RawQuote, U256,
};
use tracing::debug;

use crate::client_cache::ClientCache;
use crate::{parse_amount, read_json, AdapterConfig, Endpoints};

pub const DEFAULT_ENDPOINT: &str = "https://api.0x.org";

/// Canonical permit2 deployment, the allowance spender for every 0x permit2 quote
pub const PERMIT2_ADDRESS: &str = "0x000000000022d473030f116ddee9f6b43ac78ba3";

const SUPPORTED_NETWORKS: &[&str] = &[
	"ethereum", "optimism", "base", "arbitrum", "polygon", "bsc",
];

// ================================
// 0x API MODELS
// ================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZeroXQuoteResponse {
	buy_amount: Option<String>,
	sell_amount: Option<String>,
	transaction: ZeroXTransaction,
	#[serde(default)]
	permit2: Option<ZeroXPermit2>,
	#[serde(default)]
	liquidity_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ZeroXTransaction {
	to: String,
	data: String,
	#[serde(default)]
	value: Option<String>,
	#[serde(default)]
	gas: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ZeroXPermit2 {
	eip712: ZeroXEip712,
}

#[derive(Debug, Clone, Deserialize)]
struct ZeroXEip712 {
	domain: ZeroXDomain,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZeroXDomain {
	verifying_contract: String,
}

/// 0x permit2 adapter
#[derive(Debug)]
pub struct ZeroXAdapter {
	descriptor: AdapterDescriptor,
	endpoints: Endpoints,
	timeout_ms: u64,
	chain_ids: BTreeMap<NetworkId, u64>,
	client: Arc<Client>,
}

impl ZeroXAdapter {
	pub fn new(
		config: &AdapterConfig,
		catalog: &[NetworkProfile],
		cache: &ClientCache,
	) -> AdapterResult<Self> {
		let chain_ids = config.served_networks(SUPPORTED_NETWORKS, catalog);
		let client_config = config
			.client_config(DEFAULT_ENDPOINT)
			.with_headers([("0x-version".to_string(), "v2".to_string())])
			.with_api_key("0x-api-key", config.api_key.as_ref());

		Ok(Self {
			descriptor: AdapterDescriptor::new(
				config.name(),
				chain_ids.keys().cloned(),
				AdapterCapabilities {
					supports_output_amount_quoting: false,
					requires_offchain_signature: true,
					is_feeless: false,
				},
			),
			endpoints: config.endpoints(DEFAULT_ENDPOINT),
			timeout_ms: config.timeout_ms,
			chain_ids,
			client: cache.get_client(&client_config)?,
		})
	}

	fn transaction(quote: &RawQuote) -> AdapterResult<ZeroXTransaction> {
		let response: ZeroXQuoteResponse = serde_json::from_value(quote.execution_payload.clone())?;
		Ok(response.transaction)
	}
}

/// Convert a 0x quote body into a raw quote, enforcing the permit2 spender check
fn parse_quote_response(body: serde_json::Value) -> AdapterResult<RawQuote> {
	let response: ZeroXQuoteResponse = serde_json::from_value(body.clone())?;

	if response.liquidity_available == Some(false) {
		return Err(AdapterError::QuoteUnavailable {
			adapter: "0x".to_string(),
			reason: "no liquidity for pair".to_string(),
		});
	}

	if let Some(permit2) = &response.permit2 {
		let verifying_contract = &permit2.eip712.domain.verifying_contract;
		if !verifying_contract.eq_ignore_ascii_case(PERMIT2_ADDRESS) {
			return Err(AdapterError::ApprovalMismatch {
				expected: PERMIT2_ADDRESS.to_string(),
				actual: verifying_contract.clone(),
			});
		}
	}

	let amount_out = parse_amount(response.buy_amount.as_deref(), "buyAmount")?;
	let mut quote = RawQuote::new(amount_out, body);

	if let Some(sell_amount) = response.sell_amount.as_deref() {
		quote = quote.with_amount_in(parse_amount(Some(sell_amount), "sellAmount")?);
	}
	if let Some(gas) = response.transaction.gas.as_deref() {
		let units: f64 = gas
			.parse()
			.map_err(|_| AdapterError::invalid_response(format!("gas '{}' is not numeric", gas)))?;
		quote = quote.with_gas_units(units);
	}
	if response.permit2.is_some() {
		quote = quote.with_approval_address(PERMIT2_ADDRESS);
	}
	Ok(quote)
}

#[async_trait]
impl QuoteAdapter for ZeroXAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn get_quote(&self, request: &QuoteRequest) -> AdapterResult<RawQuote> {
		let sell_amount = match &request.amount {
			QuoteAmount::Input(amount) => amount,
			QuoteAmount::Output(_) => {
				return Err(AdapterError::UnsupportedQuoteDirection {
					adapter: self.descriptor.name.clone(),
				})
			},
		};
		let chain_id = self.chain_ids.get(&request.network).ok_or_else(|| {
			AdapterError::NetworkNotSupported {
				network: request.network.to_string(),
				adapter: self.descriptor.name.clone(),
			}
		})?;

		let url = format!("{}/swap/permit2/quote", self.endpoints.for_request(request));
		let mut query = vec![
			("chainId", chain_id.to_string()),
			("sellToken", request.from_asset.provider_address().to_string()),
			("buyToken", request.to_asset.provider_address().to_string()),
			("sellAmount", sell_amount.to_string()),
			("slippageBps", request.slippage_bps.to_string()),
		];
		if let Some(taker) = &request.user_address {
			query.push(("taker", taker.clone()));
		}

		debug!(
			"0x quote on chain {}: {} {} -> {}",
			chain_id,
			sell_amount,
			request.from_asset.address,
			request.to_asset.address
		);

		let body = read_json(
			self.client.get(&url).query(&query).send().await,
			self.timeout_ms,
		)
		.await?;
		parse_quote_response(body)
	}

	fn execution_payload(&self, quote: &RawQuote) -> Vec<u8> {
		Self::transaction(quote)
			.map(|tx| hex::decode(tx.data.trim_start_matches("0x")).unwrap_or_default())
			.unwrap_or_default()
	}

	fn execution_target(&self, quote: &RawQuote) -> AdapterResult<ExecutionTarget> {
		let tx = Self::transaction(quote)?;
		let value = match tx.value.as_deref() {
			Some(v) => U256::parse(v).map_err(AdapterError::invalid_response)?,
			None => U256::zero(),
		};
		Ok(ExecutionTarget {
			to: tx.to,
			data: tx.data,
			value,
		})
	}

	fn approval_address(&self, _network: &NetworkId) -> Option<String> {
		Some(PERMIT2_ADDRESS.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn quote_body(verifying_contract: &str) -> serde_json::Value {
		json!({
			"liquidityAvailable": true,
			"buyAmount": "2500000000",
			"sellAmount": "1000000000000000000",
			"transaction": {
				"to": "0x0000000000001ff3684f28c67538d4d072c22734",
				"data": "0xdeadbeef",
				"value": "0",
				"gas": "180000"
			},
			"permit2": {
				"eip712": { "domain": { "verifyingContract": verifying_contract } }
			}
		})
	}

	fn adapter() -> ZeroXAdapter {
		let mut config = AdapterConfig::new(swapquote_types::AdapterKind::ZeroX);
		config.api_key = Some("test-key".into());
		ZeroXAdapter::new(&config, &NetworkProfile::defaults(), &ClientCache::new()).unwrap()
	}

	#[test]
	fn test_parse_quote_response() {
		let quote = parse_quote_response(quote_body(PERMIT2_ADDRESS)).unwrap();
		assert_eq!(quote.amount_out.as_str(), "2500000000");
		assert_eq!(quote.amount_in.unwrap().as_str(), "1000000000000000000");
		assert_eq!(quote.estimated_gas_units, Some(180_000.0));
		assert_eq!(quote.approval_address_override.as_deref(), Some(PERMIT2_ADDRESS));
	}

	#[test]
	fn test_verifying_contract_mismatch_is_rejected() {
		let err =
			parse_quote_response(quote_body("0x1111111111111111111111111111111111111111"))
				.unwrap_err();
		assert!(matches!(err, AdapterError::ApprovalMismatch { .. }));
		assert!(err.is_malformed());
	}

	#[test]
	fn test_verifying_contract_check_is_case_insensitive() {
		let upper = "0x000000000022D473030F116DDEE9F6B43AC78BA3";
		assert!(parse_quote_response(quote_body(upper)).is_ok());
	}

	#[test]
	fn test_no_liquidity() {
		let mut body = quote_body(PERMIT2_ADDRESS);
		body["liquidityAvailable"] = json!(false);
		assert!(matches!(
			parse_quote_response(body).unwrap_err(),
			AdapterError::QuoteUnavailable { .. }
		));
	}

	#[test]
	fn test_execution_extraction() {
		let adapter = adapter();
		let quote = parse_quote_response(quote_body(PERMIT2_ADDRESS)).unwrap();
		assert_eq!(adapter.execution_payload(&quote), vec![0xde, 0xad, 0xbe, 0xef]);

		let target = adapter.execution_target(&quote).unwrap();
		assert_eq!(target.to, "0x0000000000001ff3684f28c67538d4d072c22734");
		assert!(target.value.is_zero());
	}

	#[tokio::test]
	async fn test_output_requests_are_refused() {
		let adapter = adapter();
		let request = QuoteRequest {
			network: NetworkId::from("ethereum"),
			from_asset: swapquote_types::Asset::native(18),
			to_asset: swapquote_types::Asset::new(
				"0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
				6,
			),
			amount: QuoteAmount::Output(U256::from("1000000")),
			slippage_bps: 50,
			user_address: None,
			private: false,
		};
		let err = adapter.get_quote(&request).await.unwrap_err();
		assert!(matches!(err, AdapterError::UnsupportedQuoteDirection { .. }));
	}

	#[test]
	fn test_descriptor() {
		let adapter = adapter();
		assert_eq!(adapter.descriptor().name, "0x");
		assert!(adapter.descriptor().capabilities.requires_offchain_signature);
		assert!(!adapter.descriptor().capabilities.supports_output_amount_quoting);
		assert!(adapter.descriptor().supports_network(&NetworkId::from("base")));
		assert!(!adapter.descriptor().supports_network(&NetworkId::from("gnosis")));
	}
}
