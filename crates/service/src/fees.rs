//! Fee normalization: every cost of executing a route expressed as one USD figure
//!
//! Measured costs are numeric. Anything that could not be measured is `GasCost::Unknown`,
//! never zero.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use swapquote_types::{
	AdapterCapabilities, Asset, FeeDenomination, FeeOracle, GasCost, NetworkId, NetworkProfile,
	OracleError, OracleResult, ProviderFee, RequestFingerprint, SettlementFee,
};
use tracing::debug;

/// Per-cycle network readings shared by every route of the cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkReadings {
	pub gas_price_wei: Option<f64>,
	pub native_usd: Option<f64>,
}

/// What the cost of one route depends on
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
	pub from_asset: &'a Asset,
	pub capabilities: &'a AdapterCapabilities,
	pub gas_units: Option<u64>,
	pub provider_fee: Option<&'a ProviderFee>,
}

pub struct FeeNormalizer {
	oracle: Arc<dyn FeeOracle>,
	networks: HashMap<NetworkId, NetworkProfile>,
	oracle_timeout: Duration,
}

impl FeeNormalizer {
	pub fn new(
		oracle: Arc<dyn FeeOracle>,
		catalog: impl IntoIterator<Item = NetworkProfile>,
		oracle_timeout: Duration,
	) -> Self {
		Self {
			oracle,
			networks: catalog.into_iter().map(|p| (p.id.clone(), p)).collect(),
			oracle_timeout,
		}
	}

	pub fn profile(&self, network: &NetworkId) -> Option<&NetworkProfile> {
		self.networks.get(network)
	}

	async fn bounded<T>(&self, lookup: impl Future<Output = OracleResult<T>>) -> OracleResult<T> {
		tokio::time::timeout(self.oracle_timeout, lookup)
			.await
			.unwrap_or(Err(OracleError::Timeout {
				timeout_ms: self.oracle_timeout.as_millis() as u64,
			}))
	}

	/// Gas price (caller hint wins over the oracle) and native USD price for the cycle
	pub async fn readings(&self, fingerprint: &RequestFingerprint) -> NetworkReadings {
		let network = &fingerprint.network;
		let gas_price = async {
			match &fingerprint.context.gas_price_hint_wei {
				Some(hint) => Ok(hint.to_units(0)),
				None => self.bounded(self.oracle.current_gas_price(network)).await,
			}
		};
		let native_usd = self.bounded(self.oracle.native_asset_usd_price(network));
		let (gas_price, native_usd) = tokio::join!(gas_price, native_usd);

		if let Err(e) = &gas_price {
			debug!("Gas price unavailable for {}: {}", network, e);
		}
		if let Err(e) = &native_usd {
			debug!("Native asset price unavailable for {}: {}", network, e);
		}

		NetworkReadings {
			gas_price_wei: gas_price.ok(),
			native_usd: native_usd.ok(),
		}
	}

	/// Settlement data fee for publishing `payload`, bounded by the oracle timeout
	pub async fn settlement_fee(
		&self,
		network: &NetworkId,
		capabilities: &AdapterCapabilities,
		payload: &[u8],
	) -> SettlementFee {
		let charged = self
			.networks
			.get(network)
			.is_some_and(|p| p.has_settlement_data_fee);
		if !charged || capabilities.is_feeless {
			return SettlementFee::NotApplicable;
		}
		if payload.is_empty() {
			return SettlementFee::Unknown;
		}

		match self
			.bounded(self.oracle.settlement_data_fee(network, payload))
			.await
		{
			Ok(wei) => SettlementFee::Known(wei),
			Err(e) => {
				debug!("Settlement data fee unavailable on {}: {}", network, e);
				SettlementFee::Unknown
			},
		}
	}

	/// Total USD cost of a route
	pub fn gas_cost(
		&self,
		network: &NetworkId,
		inputs: CostInputs<'_>,
		readings: NetworkReadings,
		settlement: SettlementFee,
	) -> GasCost {
		match self.networks.get(network) {
			Some(profile) => compute_gas_cost(profile, inputs, readings, settlement),
			None => GasCost::Unknown,
		}
	}
}

fn native_to_usd(wei: f64, profile: &NetworkProfile, native_usd: f64) -> f64 {
	wei * native_usd / 10f64.powi(profile.native_decimals as i32)
}

/// Pure cost rule
///
/// Provider fees charged in a native input asset are added to the cost. Feeless adapters
/// without such a fee cost exactly zero. For everyone else an exact zero means nothing was
/// measured and is reported as unknown.
pub fn compute_gas_cost(
	profile: &NetworkProfile,
	inputs: CostInputs<'_>,
	readings: NetworkReadings,
	settlement: SettlementFee,
) -> GasCost {
	let native_fee_wei = inputs
		.provider_fee
		.filter(|fee| fee.denomination == FeeDenomination::InputAsset)
		.filter(|_| inputs.from_asset.is_native())
		.map(|fee| fee.amount.to_units(0));

	let provider_fee_usd = match (native_fee_wei, readings.native_usd) {
		(None, _) => Some(0.0),
		(Some(wei), Some(usd)) => Some(native_to_usd(wei, profile, usd)),
		(Some(_), None) => None,
	};

	if inputs.capabilities.is_feeless {
		return provider_fee_usd.map_or(GasCost::Unknown, GasCost::Usd);
	}

	let (Some(units), Some(gas_price), Some(native_usd), Some(provider_fee_usd)) = (
		inputs.gas_units,
		readings.gas_price_wei,
		readings.native_usd,
		provider_fee_usd,
	) else {
		return GasCost::Unknown;
	};

	let data_fee_usd = match settlement {
		SettlementFee::NotApplicable => 0.0,
		SettlementFee::Known(wei) => native_to_usd(wei, profile, native_usd),
		SettlementFee::Unknown => return GasCost::Unknown,
	};

	let execution_usd = native_to_usd(units as f64 * gas_price, profile, native_usd);
	let total = execution_usd + data_fee_usd + provider_fee_usd;

	if total == 0.0 || !total.is_finite() {
		GasCost::Unknown
	} else {
		GasCost::Usd(total)
	}
}
