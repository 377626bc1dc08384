//! Normalized and ranked route shapes

pub mod errors;
pub mod snapshot;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::adapters::{AdapterCapabilities, ExecutionTarget, ProviderFee};
use crate::models::U256;

pub use errors::{EngineError, RouteFailure};
pub use snapshot::{AdapterFailure, CycleState, RouteSnapshot};

/// Total network cost of a route in USD, or the explicit "could not be measured" sentinel
///
/// `Unknown` always ranks worse than any numeric cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GasCost {
	Usd(f64),
	Unknown,
}

impl GasCost {
	pub fn is_known(&self) -> bool {
		matches!(self, GasCost::Usd(_))
	}

	pub fn as_usd(&self) -> Option<f64> {
		match self {
			GasCost::Usd(v) => Some(*v),
			GasCost::Unknown => None,
		}
	}
}

impl Serialize for GasCost {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			GasCost::Usd(v) => serializer.serialize_f64(*v),
			GasCost::Unknown => serializer.serialize_str("unknown"),
		}
	}
}

impl<'de> Deserialize<'de> for GasCost {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		match serde_json::Value::deserialize(deserializer)? {
			serde_json::Value::Number(n) => n
				.as_f64()
				.map(GasCost::Usd)
				.ok_or_else(|| serde::de::Error::custom("gas cost is not a float")),
			serde_json::Value::String(s) if s.eq_ignore_ascii_case("unknown") => {
				Ok(GasCost::Unknown)
			},
			other => Err(serde::de::Error::custom(format!(
				"expected number or \"unknown\", got {}",
				other
			))),
		}
	}
}

/// Settlement-layer data fee attached to a route, in smallest native units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "wei", rename_all = "snake_case")]
pub enum SettlementFee {
	/// Network has no separate data-publishing cost, or the route is gasless
	NotApplicable,
	Known(f64),
	Unknown,
}

/// A quote converted into the engine's common comparable shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRoute {
	pub adapter_name: String,
	pub input_amount: U256,
	pub output_amount: U256,
	pub estimated_gas_units: Option<u64>,
	pub settlement_data_fee: SettlementFee,
	pub provider_fee: Option<ProviderFee>,
	pub gas_usd: GasCost,
	pub is_gasless: bool,
	pub requires_offchain_signature: bool,
	pub is_available: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub failure: Option<RouteFailure>,
	pub approval_address: Option<String>,
	/// Bytes published on-chain when executing
	#[serde(with = "hex_bytes")]
	pub execution_payload: Vec<u8>,
	pub execution_target: Option<ExecutionTarget>,
}

impl NormalizedRoute {
	/// Placeholder for an adapter that produced no usable quote
	pub fn unavailable(
		adapter_name: impl Into<String>,
		requested_input: U256,
		capabilities: &AdapterCapabilities,
		failure: RouteFailure,
	) -> Self {
		Self {
			adapter_name: adapter_name.into(),
			input_amount: requested_input,
			output_amount: U256::zero(),
			estimated_gas_units: None,
			settlement_data_fee: SettlementFee::NotApplicable,
			provider_fee: None,
			gas_usd: GasCost::Unknown,
			is_gasless: capabilities.is_feeless,
			requires_offchain_signature: capabilities.requires_offchain_signature,
			is_available: false,
			failure: Some(failure),
			approval_address: None,
			execution_payload: Vec::new(),
			execution_target: None,
		}
	}
}

/// A normalized route annotated with its sort position and relative value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRoute {
	#[serde(flatten)]
	pub route: NormalizedRoute,
	/// Input-specified: net USD (or token units) received. Output-specified: total cost.
	pub net_output_value: f64,
	/// `net_output_value / net_output_value[rank 0]`
	pub relative_loss: f64,
	pub rank: usize,
	pub output_usd: Option<f64>,
	pub input_usd: Option<f64>,
}

impl RankedRoute {
	pub fn adapter_name(&self) -> &str {
		&self.route.adapter_name
	}

	/// Transaction to hand to the caller's signing component
	pub fn execution_target(&self) -> Option<&ExecutionTarget> {
		self.route.execution_target.as_ref()
	}
}

/// The route chosen for execution plus display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSelection {
	pub route: RankedRoute,
	/// The caller pinned this adapter
	pub pinned: bool,
	/// `100 - output_usd / input_usd * 100`, when both prices are known
	pub price_impact_percent: Option<f64>,
	pub price_impact_warning: bool,
	pub high_price_impact: bool,
}

mod hex_bytes {
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;
		hex::decode(value.trim_start_matches("0x")).map_err(serde::de::Error::custom)
	}
}
