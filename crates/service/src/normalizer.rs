//! Raw provider quote → `NormalizedRoute`
//!
//! Amounts stay integer smallest units end to end. A quote that fails any consistency check
//! becomes an unavailable route classified as malformed.

use swapquote_types::{
	GasCost, NormalizedRoute, QuoteAdapter, QuoteAmount, RawQuote, RequestFingerprint,
	RouteFailure, SettlementFee, U256,
};
use tracing::warn;

/// Amount and gas fields of a raw quote after validation
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedQuote {
	pub input_amount: U256,
	pub output_amount: U256,
	pub gas_units: Option<u64>,
}

fn malformed(reason: impl Into<String>) -> RouteFailure {
	RouteFailure::AdapterMalformedResponse {
		reason: reason.into(),
	}
}

/// Validate amounts and gas units of a raw quote against its request
pub fn check_quote(
	fingerprint: &RequestFingerprint,
	raw: &RawQuote,
) -> Result<CheckedQuote, RouteFailure> {
	if raw.amount_out.is_zero() {
		return Err(malformed("output amount is zero"));
	}

	let input_amount = match (&raw.amount_in, &fingerprint.amount) {
		(Some(amount_in), _) => amount_in.clone(),
		// Only an input-specified request tells us what the input was
		(None, QuoteAmount::Input(requested)) => requested.clone(),
		(None, QuoteAmount::Output(_)) => {
			return Err(malformed("output-specified quote without an input amount"))
		},
	};
	if input_amount.is_zero() {
		return Err(malformed("input amount is zero"));
	}

	let gas_units = match raw.estimated_gas_units {
		None => None,
		Some(units) if units.is_finite() && units >= 0.0 => Some(units.round() as u64),
		Some(units) => return Err(malformed(format!("gas estimate {} is not usable", units))),
	};

	Ok(CheckedQuote {
		input_amount,
		output_amount: raw.amount_out.clone(),
		gas_units,
	})
}

/// Build the normalized route; `gas_usd` and `settlement` come from the fee normalizer
pub fn build_route(
	adapter: &dyn QuoteAdapter,
	fingerprint: &RequestFingerprint,
	raw: &RawQuote,
	checked: CheckedQuote,
	execution_payload: Vec<u8>,
	gas_usd: GasCost,
	settlement: SettlementFee,
) -> NormalizedRoute {
	let descriptor = adapter.descriptor();

	// Native input never needs an allowance
	let approval_address = if fingerprint.from_asset.is_native() {
		None
	} else {
		raw.approval_address_override
			.clone()
			.or_else(|| adapter.approval_address(&fingerprint.network))
	};

	let execution_target = match adapter.execution_target(raw) {
		Ok(target) => Some(target),
		Err(e) => {
			warn!(
				"Adapter {} quote has no execution target: {}",
				descriptor.name, e
			);
			None
		},
	};

	NormalizedRoute {
		adapter_name: descriptor.name.clone(),
		input_amount: checked.input_amount,
		output_amount: checked.output_amount,
		estimated_gas_units: checked.gas_units,
		settlement_data_fee: settlement,
		provider_fee: raw.provider_fee.clone(),
		gas_usd,
		is_gasless: descriptor.capabilities.is_feeless,
		requires_offchain_signature: descriptor.capabilities.requires_offchain_signature,
		is_available: true,
		failure: None,
		approval_address,
		execution_payload,
		execution_target,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use swapquote_types::{
		AdapterCapabilities, AdapterDescriptor, AdapterError, Asset, ExecutionTarget,
		MockQuoteAdapter,
	};

	const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

	fn fingerprint(amount: QuoteAmount) -> RequestFingerprint {
		RequestFingerprint::new(
			"ethereum",
			Asset::new(USDC, 6),
			Asset::native(18),
			amount,
		)
	}

	#[test]
	fn test_missing_input_amount_filled_only_for_input_requests() {
		let raw = RawQuote::new(U256::from("5"), json!({}));

		let checked = check_quote(&fingerprint(QuoteAmount::Input(U256::from("100"))), &raw).unwrap();
		assert_eq!(checked.input_amount.as_str(), "100");

		let err = check_quote(&fingerprint(QuoteAmount::Output(U256::from("5"))), &raw).unwrap_err();
		assert!(matches!(err, RouteFailure::AdapterMalformedResponse { .. }));
	}

	#[test]
	fn test_zero_output_is_malformed() {
		let raw = RawQuote::new(U256::zero(), json!({}));
		assert!(check_quote(&fingerprint(QuoteAmount::Input(U256::from("1"))), &raw).is_err());
	}

	#[test]
	fn test_unusable_gas_units_are_malformed() {
		let fp = fingerprint(QuoteAmount::Input(U256::from("1")));
		for units in [f64::NAN, -1.0, f64::INFINITY] {
			let raw = RawQuote::new(U256::from("5"), json!({})).with_gas_units(units);
			assert!(check_quote(&fp, &raw).is_err(), "{} accepted", units);
		}
		let raw = RawQuote::new(U256::from("5"), json!({})).with_gas_units(21_000.4);
		assert_eq!(check_quote(&fp, &raw).unwrap().gas_units, Some(21_000));
	}

	#[test]
	fn test_build_route_uses_approval_override() {
		let mut adapter = MockQuoteAdapter::new();
		adapter.expect_descriptor().return_const(AdapterDescriptor::new(
			"ParaSwap",
			["ethereum"],
			AdapterCapabilities::default(),
		));
		adapter
			.expect_approval_address()
			.returning(|_| Some("0xdefault".to_string()));
		adapter.expect_execution_target().returning(|_| {
			Ok(ExecutionTarget {
				to: "0xrouter".to_string(),
				data: "0x01".to_string(),
				value: U256::zero(),
			})
		});

		let fp = fingerprint(QuoteAmount::Input(U256::from("100")));
		let raw = RawQuote::new(U256::from("5"), json!({}))
			.with_amount_in(U256::from("100"))
			.with_approval_address("0xproxy");
		let checked = check_quote(&fp, &raw).unwrap();
		let route = build_route(
			&adapter,
			&fp,
			&raw,
			checked,
			vec![1],
			GasCost::Usd(1.0),
			SettlementFee::NotApplicable,
		);

		assert!(route.is_available);
		assert_eq!(route.approval_address.as_deref(), Some("0xproxy"));
		assert_eq!(route.execution_target.unwrap().to, "0xrouter");
	}

	#[test]
	fn test_build_route_native_input_needs_no_approval() {
		let mut adapter = MockQuoteAdapter::new();
		adapter.expect_descriptor().return_const(AdapterDescriptor::new(
			"0x",
			["ethereum"],
			AdapterCapabilities::default(),
		));
		adapter.expect_approval_address().never();
		adapter
			.expect_execution_target()
			.returning(|_| Err(AdapterError::invalid_response("no tx")));

		let fp = RequestFingerprint::new(
			"ethereum",
			Asset::native(18),
			Asset::new(USDC, 6),
			QuoteAmount::Input(U256::from("100")),
		);
		let raw = RawQuote::new(U256::from("5"), json!({}));
		let checked = check_quote(&fp, &raw).unwrap();
		let route = build_route(
			&adapter,
			&fp,
			&raw,
			checked,
			Vec::new(),
			GasCost::Unknown,
			SettlementFee::NotApplicable,
		);
		assert!(route.approval_address.is_none());
		assert!(route.execution_target.is_none());
	}
}
