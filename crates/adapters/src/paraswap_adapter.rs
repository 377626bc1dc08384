//! ParaSwap aggregator adapter
//!
//! Two calls per quote: `/prices` for the route, then `/transactions/{chainId}` to build the
//! swap transaction with the slippage bound applied. The transaction is only built when the
//! user address is known.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use swapquote_types::{
	AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterResult, ExecutionTarget,
	NetworkId, NetworkProfile, QuoteAdapter, QuoteDirection, QuoteRequest, RawQuote,
	U256,
};
use tracing::debug;

use crate::client_cache::ClientCache;
use crate::{parse_amount, read_json, AdapterConfig, Endpoints};

pub const DEFAULT_ENDPOINT: &str = "https://apiv5.paraswap.io";

const SUPPORTED_NETWORKS: &[&str] = &[
	"ethereum", "optimism", "base", "arbitrum", "polygon", "bsc",
];

const BPS_DENOMINATOR: u128 = 10_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRoute {
	src_amount: Option<String>,
	dest_amount: Option<String>,
	#[serde(default)]
	gas_cost: Option<String>,
	#[serde(default)]
	token_transfer_proxy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BuiltTransaction {
	to: String,
	data: String,
	#[serde(default)]
	value: Option<String>,
}

/// Tighten the counter amount by the slippage tolerance
///
/// Sells bound the minimum received, buys bound the maximum spent.
pub fn apply_slippage(amount: &U256, direction: QuoteDirection, slippage_bps: u32) -> Option<U256> {
	let bps = slippage_bps as u128;
	match direction {
		QuoteDirection::ExactInput => {
			amount.checked_mul_div(BPS_DENOMINATOR.checked_sub(bps)?, BPS_DENOMINATOR)
		},
		QuoteDirection::ExactOutput => amount.checked_mul_div(BPS_DENOMINATOR + bps, BPS_DENOMINATOR),
	}
}

/// ParaSwap adapter
#[derive(Debug)]
pub struct ParaSwapAdapter {
	descriptor: AdapterDescriptor,
	endpoints: Endpoints,
	timeout_ms: u64,
	chain_ids: BTreeMap<NetworkId, u64>,
	client: Arc<Client>,
}

impl ParaSwapAdapter {
	pub fn new(
		config: &AdapterConfig,
		catalog: &[NetworkProfile],
		cache: &ClientCache,
	) -> AdapterResult<Self> {
		let chain_ids = config.served_networks(SUPPORTED_NETWORKS, catalog);
		Ok(Self {
			descriptor: AdapterDescriptor::new(
				config.name(),
				chain_ids.keys().cloned(),
				AdapterCapabilities {
					supports_output_amount_quoting: true,
					requires_offchain_signature: false,
					is_feeless: false,
				},
			),
			endpoints: config.endpoints(DEFAULT_ENDPOINT),
			timeout_ms: config.timeout_ms,
			chain_ids,
			client: cache.get_client(&config.client_config(DEFAULT_ENDPOINT))?,
		})
	}

	async fn fetch_price_route(
		&self,
		request: &QuoteRequest,
		chain_id: u64,
	) -> AdapterResult<serde_json::Value> {
		let side = match request.amount.direction() {
			QuoteDirection::ExactInput => "SELL",
			QuoteDirection::ExactOutput => "BUY",
		};
		let mut query = vec![
			("srcToken", request.from_asset.provider_address().to_string()),
			("destToken", request.to_asset.provider_address().to_string()),
			("amount", request.amount.value().to_string()),
			("srcDecimals", request.from_asset.decimals.to_string()),
			("destDecimals", request.to_asset.decimals.to_string()),
			("side", side.to_string()),
			("network", chain_id.to_string()),
		];
		if let Some(user) = &request.user_address {
			query.push(("userAddress", user.clone()));
		}

		let body = read_json(
			self.client
				.get(format!("{}/prices", self.endpoints.for_request(request)))
				.query(&query)
				.send()
				.await,
			self.timeout_ms,
		)
		.await?;

		if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
			return Err(AdapterError::QuoteUnavailable {
				adapter: self.descriptor.name.clone(),
				reason: error.to_string(),
			});
		}
		body.get("priceRoute")
			.cloned()
			.ok_or_else(|| AdapterError::invalid_response("missing priceRoute"))
	}

	async fn build_transaction(
		&self,
		request: &QuoteRequest,
		chain_id: u64,
		user_address: &str,
		price_route: &serde_json::Value,
		route: &PriceRoute,
	) -> AdapterResult<serde_json::Value> {
		let src_amount = parse_amount(route.src_amount.as_deref(), "srcAmount")?;
		let dest_amount = parse_amount(route.dest_amount.as_deref(), "destAmount")?;
		let direction = request.amount.direction();

		let bounded = match direction {
			QuoteDirection::ExactInput => &dest_amount,
			QuoteDirection::ExactOutput => &src_amount,
		};
		let bounded = apply_slippage(bounded, direction, request.slippage_bps).ok_or_else(|| {
			AdapterError::QuoteUnavailable {
				adapter: self.descriptor.name.clone(),
				reason: "amount too large for slippage adjustment".to_string(),
			}
		})?;
		let (src_amount, dest_amount) = match direction {
			QuoteDirection::ExactInput => (src_amount, bounded),
			QuoteDirection::ExactOutput => (bounded, dest_amount),
		};

		let body = json!({
			"srcToken": request.from_asset.provider_address(),
			"destToken": request.to_asset.provider_address(),
			"srcAmount": src_amount,
			"destAmount": dest_amount,
			"srcDecimals": request.from_asset.decimals,
			"destDecimals": request.to_asset.decimals,
			"priceRoute": price_route,
			"userAddress": user_address,
		});

		read_json(
			self.client
				.post(format!(
					"{}/transactions/{}?ignoreChecks=true",
					self.endpoints.for_request(request),
					chain_id
				))
				.json(&body)
				.send()
				.await,
			self.timeout_ms,
		)
		.await
	}

	fn transaction(quote: &RawQuote) -> Option<BuiltTransaction> {
		quote
			.execution_payload
			.get("transaction")
			.and_then(|tx| serde_json::from_value(tx.clone()).ok())
	}
}

/// Combine the price route and optional built transaction into a raw quote
fn parse_quote(
	price_route: serde_json::Value,
	transaction: Option<serde_json::Value>,
) -> AdapterResult<RawQuote> {
	let route: PriceRoute = serde_json::from_value(price_route.clone())?;
	let amount_out = parse_amount(route.dest_amount.as_deref(), "destAmount")?;
	let amount_in = parse_amount(route.src_amount.as_deref(), "srcAmount")?;

	let mut quote = RawQuote::new(
		amount_out,
		json!({ "priceRoute": price_route, "transaction": transaction }),
	)
	.with_amount_in(amount_in);

	if let Some(gas) = route.gas_cost.as_deref() {
		let units: f64 = gas.parse().map_err(|_| {
			AdapterError::invalid_response(format!("gasCost '{}' is not numeric", gas))
		})?;
		quote = quote.with_gas_units(units);
	}
	if let Some(proxy) = route.token_transfer_proxy {
		quote = quote.with_approval_address(proxy);
	}
	Ok(quote)
}

#[async_trait]
impl QuoteAdapter for ParaSwapAdapter {
	fn descriptor(&self) -> &AdapterDescriptor {
		&self.descriptor
	}

	async fn get_quote(&self, request: &QuoteRequest) -> AdapterResult<RawQuote> {
		let chain_id = *self.chain_ids.get(&request.network).ok_or_else(|| {
			AdapterError::NetworkNotSupported {
				network: request.network.to_string(),
				adapter: self.descriptor.name.clone(),
			}
		})?;

		let price_route = self.fetch_price_route(request, chain_id).await?;
		let route: PriceRoute = serde_json::from_value(price_route.clone())?;

		let transaction = match &request.user_address {
			Some(user) => Some(
				self.build_transaction(request, chain_id, user, &price_route, &route)
					.await?,
			),
			None => {
				debug!("ParaSwap: no user address, skipping transaction build");
				None
			},
		};

		parse_quote(price_route, transaction)
	}

	fn execution_payload(&self, quote: &RawQuote) -> Vec<u8> {
		Self::transaction(quote)
			.and_then(|tx| hex::decode(tx.data.trim_start_matches("0x")).ok())
			.unwrap_or_default()
	}

	fn execution_target(&self, quote: &RawQuote) -> AdapterResult<ExecutionTarget> {
		let tx = Self::transaction(quote)
			.ok_or_else(|| AdapterError::invalid_response("quote has no built transaction"))?;
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

	/// Spender is only known from the quote response
	fn approval_address(&self, _network: &NetworkId) -> Option<String> {
		None
	}
}
