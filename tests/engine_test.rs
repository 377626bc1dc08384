//! End-to-end cycles through the engine: fan-out, normalization and ranking

mod mocks;

use std::time::Duration;

use mocks::{engine_with, fingerprint, Behavior, MockAdapter, TOKEN_X, TOKEN_Y};
use swapquote::service::StaticPriceOracle;
use swapquote::types::{FeeDenomination, ProviderFee};
use swapquote::{
	AdapterCapabilities, Asset, CycleState, EngineError, GasCost, QuoteAmount, QuoteEngine,
	RankedRoute, RequestFingerprint, RouteFailure, U256,
};

fn names(routes: &[RankedRoute]) -> Vec<&str> {
	routes.iter().map(|r| r.adapter_name()).collect()
}

fn usd_prices() -> StaticPriceOracle {
	StaticPriceOracle::default()
		.with_price("ethereum", &Asset::new(TOKEN_X, 6), 1.0)
		.with_price("ethereum", &Asset::new(TOKEN_Y, 6), 1.0)
}

#[tokio::test]
async fn test_numeric_gas_routes_precede_unknown_gas() {
	let a = MockAdapter::new("adapter-A", 990_000, Some(50_000.0));
	let b = MockAdapter::new("adapter-B", 995_000, Some(100_000.0));
	let c = MockAdapter::new("adapter-C", 995_000, None);
	let engine = engine_with(&[&a, &b, &c], None);

	let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();

	assert_eq!(names(&outcome.routes), vec!["adapter-B", "adapter-A", "adapter-C"]);
	let gas_b = outcome.routes[0].route.gas_usd.as_usd().unwrap();
	assert!((gas_b - 2.0).abs() < 1e-9);
	assert!(outcome.routes[1].route.gas_usd.is_known());
	assert_eq!(outcome.routes[2].route.gas_usd, GasCost::Unknown);
	assert_eq!(outcome.routes[0].relative_loss, 1.0);
	for (position, route) in outcome.routes.iter().enumerate() {
		assert_eq!(route.rank, position);
	}
	assert_eq!(outcome.state, CycleState::Settled);
}

#[tokio::test]
async fn test_unknown_gas_ranks_below_negative_net() {
	// $5 of gas on a ~$1 trade
	let costly = MockAdapter::new("costly", 990_000, Some(250_000.0));
	let unmeasured = MockAdapter::new("unmeasured", 999_000, None);
	let engine = engine_with(&[&unmeasured, &costly], Some(usd_prices()));

	let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();
	assert_eq!(names(&outcome.routes), vec!["costly", "unmeasured"]);
	assert!(outcome.routes[0].net_output_value < 0.0);
	assert_eq!(outcome.routes[0].relative_loss, 1.0);
}

async fn ranked_without_failures(engine: &QuoteEngine) -> Vec<RankedRoute> {
	engine.quote_once(&fingerprint(1_000_000)).await.unwrap().routes
}

#[tokio::test]
async fn test_single_failure_leaves_other_routes_unchanged() {
	let a = MockAdapter::new("a", 990_000, Some(80_000.0));
	let b = MockAdapter::new("b", 985_000, Some(60_000.0));
	let c = MockAdapter::new("c", 993_000, None);
	let baseline = ranked_without_failures(&engine_with(&[&a, &b, &c], Some(usd_prices()))).await;

	for behavior in [
		Behavior::Error,
		Behavior::Malformed,
		Behavior::Hang,
		Behavior::Panic,
	] {
		let broken = MockAdapter::new("broken", 999_999, Some(1.0)).with_behavior(behavior.clone());
		let engine = engine_with(&[&a, &broken, &b, &c], Some(usd_prices()));
		let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();

		assert_eq!(outcome.routes, baseline, "behavior {:?}", behavior);
		assert_eq!(outcome.state, CycleState::PartiallyFailed);
		assert_eq!(outcome.failures.len(), 1);
		assert_eq!(outcome.failures[0].adapter, "broken");
	}
}

#[tokio::test]
async fn test_timeout_is_classified() {
	let slow = MockAdapter::new("slow", 1_000, Some(1.0)).with_behavior(Behavior::Hang);
	let engine = engine_with(&[&slow], None);

	let started = std::time::Instant::now();
	let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();
	assert!(started.elapsed() < Duration::from_secs(5));
	assert_eq!(
		outcome.failures[0].failure,
		RouteFailure::AdapterTimeout { timeout_ms: 300 }
	);
	assert!(outcome.routes.is_empty());
	assert_eq!(outcome.selection(None), Err(EngineError::NoAvailableRoutes));
}

#[tokio::test]
async fn test_output_request_skips_adapters_without_support() {
	let input_only = MockAdapter::new("input-only", 1_000_000, Some(100_000.0));
	let exact_out = MockAdapter::new("exact-out", 1_010_000, Some(100_000.0)).with_capabilities(
		AdapterCapabilities {
			supports_output_amount_quoting: true,
			..Default::default()
		},
	);
	let engine = engine_with(&[&input_only, &exact_out], Some(usd_prices()));

	let request = RequestFingerprint::new(
		"ethereum",
		Asset::new(TOKEN_X, 6),
		Asset::new(TOKEN_Y, 6),
		QuoteAmount::Output(U256::from(1_000_000u64)),
	);
	let outcome = engine.quote_once(&request).await.unwrap();

	assert_eq!(input_only.call_count(), 0);
	assert_eq!(names(&outcome.routes), vec!["exact-out"]);
	assert_eq!(outcome.routes[0].route.input_amount, U256::from(1_010_000u64));
	// $1.01 in plus $2.00 gas
	assert!((outcome.routes[0].net_output_value - 3.01).abs() < 1e-9);
	assert_eq!(
		outcome.failures[0].failure,
		RouteFailure::UnsupportedQuoteDirection
	);
}

#[tokio::test]
async fn test_disabled_and_foreign_network_adapters_are_not_called() {
	let enabled = MockAdapter::new("enabled", 990_000, Some(1.0));
	let disabled = MockAdapter::new("disabled", 999_000, Some(1.0));
	let elsewhere = MockAdapter::new("elsewhere", 999_000, Some(1.0)).with_networks(["base"]);
	let engine = engine_with(&[&enabled, &disabled, &elsewhere], None);

	let mut request = fingerprint(1_000_000);
	request.context.disabled_adapters.insert("disabled".to_string());
	let outcome = engine.quote_once(&request).await.unwrap();

	assert_eq!(names(&outcome.routes), vec!["enabled"]);
	assert!(outcome.failures.is_empty());
	assert_eq!(disabled.call_count(), 0);
	assert_eq!(elsewhere.call_count(), 0);
}

#[tokio::test]
async fn test_zero_amount_calls_no_adapter() {
	let adapter = MockAdapter::new("a", 990_000, Some(1.0));
	let engine = engine_with(&[&adapter], None);

	let outcome = engine.quote_once(&fingerprint(0)).await.unwrap();
	assert_eq!(adapter.call_count(), 0);
	assert_eq!(outcome.failures[0].failure, RouteFailure::EmptyRequest);
}

#[tokio::test]
async fn test_feeless_adapter_costs_nothing_without_provider_fee() {
	let feeless = MockAdapter::new("feeless", 990_000, None).with_capabilities(AdapterCapabilities {
		is_feeless: true,
		requires_offchain_signature: true,
		..Default::default()
	});
	let engine = engine_with(&[&feeless], None);

	let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();
	let route = &outcome.routes[0].route;
	assert_eq!(route.gas_usd, GasCost::Usd(0.0));
	assert!(route.is_gasless);
	assert!(route.requires_offchain_signature);
}

#[tokio::test]
async fn test_native_input_provider_fee_is_added_to_gas() {
	let with_fee = MockAdapter::new("with-fee", 990_000, Some(100_000.0)).with_provider_fee(
		ProviderFee {
			// 0.001 native at $2000
			amount: U256::from(1_000_000_000_000_000u64),
			denomination: FeeDenomination::InputAsset,
		},
	);
	let engine = engine_with(&[&with_fee], None);

	let request = RequestFingerprint::new(
		"ethereum",
		Asset::native(18),
		Asset::new(TOKEN_Y, 6),
		QuoteAmount::Input(U256::from(990_000u64)),
	);
	let outcome = engine.quote_once(&request).await.unwrap();
	let route = &outcome.routes[0].route;

	assert!((route.gas_usd.as_usd().unwrap() - 4.0).abs() < 1e-9);
	assert_eq!(route.approval_address, None);
}

#[tokio::test]
async fn test_execution_target_is_handed_off() {
	let adapter = MockAdapter::new("a", 990_000, Some(100_000.0));
	let engine = engine_with(&[&adapter], None);
	let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();

	let target = QuoteEngine::execution_target(&outcome.routes[0]).unwrap();
	assert_eq!(target.data, "0xdeadbeef");
	assert_eq!(
		outcome.routes[0].route.approval_address.as_deref(),
		Some("0xDef1C0ded9bec7F1a1670819833240f027b25EfF")
	);
}

#[tokio::test]
async fn test_pinned_selection_and_price_impact() {
	let best = MockAdapter::new("best", 999_000, Some(1.0));
	let pinned = MockAdapter::new("pinned", 880_000, Some(1.0));
	let engine = engine_with(&[&best, &pinned], Some(usd_prices()));
	let outcome = engine.quote_once(&fingerprint(1_000_000)).await.unwrap();

	let selection = outcome.selection(Some("pinned")).unwrap();
	assert!(selection.pinned);
	assert_eq!(selection.route.rank, 1);
	assert!(selection.high_price_impact);

	let fallback = outcome.selection(Some("not-registered")).unwrap();
	assert_eq!(fallback.route.adapter_name(), "best");
	assert!(!fallback.price_impact_warning);
}
