//! Ordering of normalized routes by net economic outcome

use std::cmp::Ordering;

use swapquote_types::constants::limits::{
	HIGH_PRICE_IMPACT_THRESHOLD, PRICE_IMPACT_WARNING_THRESHOLD,
};
use swapquote_types::{
	AdapterFailure, EngineError, NormalizedRoute, QuoteAmount, RankedRoute, RequestFingerprint,
	RouteFailure, RouteSelection,
};
use tracing::debug;

/// USD price of one whole token of each side of the request, when known
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetPrices {
	pub input_usd: Option<f64>,
	pub output_usd: Option<f64>,
}

/// Result of one ranking pass
#[derive(Debug, Clone, Default)]
pub struct Ranking {
	pub ranked: Vec<RankedRoute>,
	/// Routes left out of the ranking, with the reason
	pub discarded: Vec<AdapterFailure>,
}

struct Scored {
	route: NormalizedRoute,
	key: f64,
	output_usd: Option<f64>,
	input_usd: Option<f64>,
}

/// Rank routes for `fingerprint`
///
/// Routes with a numeric gas cost always precede routes whose gas cost is unknown. Within each
/// group input-specified requests sort by descending net output and output-specified requests by
/// ascending cost. The sort is stable, so ties keep the order routes were passed in.
pub fn rank(
	fingerprint: &RequestFingerprint,
	routes: Vec<NormalizedRoute>,
	prices: AssetPrices,
) -> Ranking {
	let input_decimals = fingerprint.from_asset.decimals;
	let output_decimals = fingerprint.to_asset.decimals;
	let mut discarded = Vec::new();
	let mut scored = Vec::with_capacity(routes.len());

	for route in routes {
		if !route.is_available {
			discarded.push(AdapterFailure {
				adapter: route.adapter_name.clone(),
				failure: route.failure.clone().unwrap_or(RouteFailure::QuoteUnavailable {
					reason: "route unavailable".to_string(),
				}),
			});
			continue;
		}

		if let QuoteAmount::Input(requested) = &fingerprint.amount {
			if &route.input_amount != requested {
				debug!(
					"Discarding {} route: input {} differs from requested {}",
					route.adapter_name, route.input_amount, requested
				);
				discarded.push(AdapterFailure {
					adapter: route.adapter_name.clone(),
					failure: RouteFailure::AdapterMalformedResponse {
						reason: format!(
							"input amount {} differs from requested {}",
							route.input_amount, requested
						),
					},
				});
				continue;
			}
		}

		let output_units = route.output_amount.to_units(output_decimals);
		let input_units = route.input_amount.to_units(input_decimals);
		let output_usd = prices.output_usd.map(|price| output_units * price);
		let input_usd = prices.input_usd.map(|price| input_units * price);
		let gas = route.gas_usd.as_usd();

		let key = if fingerprint.amount.is_input() {
			match (output_usd, gas) {
				(Some(out), Some(gas)) => out - gas,
				(Some(out), None) => out,
				(None, _) => output_units,
			}
		} else {
			match (input_usd, gas) {
				(Some(input), Some(gas)) => input + gas,
				_ => input_units,
			}
		};

		scored.push(Scored {
			route,
			key,
			output_usd,
			input_usd,
		});
	}

	let descending = fingerprint.amount.is_input();
	scored.sort_by(|a, b| {
		let known = b.route.gas_usd.is_known().cmp(&a.route.gas_usd.is_known());
		known.then_with(|| {
			if descending {
				b.key.total_cmp(&a.key)
			} else {
				a.key.total_cmp(&b.key)
			}
		})
	});

	let best = scored.first().map(|s| s.key);
	let ranked = scored
		.into_iter()
		.enumerate()
		.map(|(rank, scored)| RankedRoute {
			relative_loss: relative_loss(rank, scored.key, best),
			net_output_value: scored.key,
			rank,
			output_usd: scored.output_usd,
			input_usd: scored.input_usd,
			route: scored.route,
		})
		.collect();

	Ranking { ranked, discarded }
}

fn relative_loss(rank: usize, key: f64, best: Option<f64>) -> f64 {
	if rank == 0 {
		return 1.0;
	}
	match best {
		Some(best) if best != 0.0 && best.is_finite() => key / best,
		_ => 0.0,
	}
}

/// Pick the pinned adapter's route when it was ranked, otherwise the best route
pub fn select(ranked: &[RankedRoute], pinned: Option<&str>) -> Result<RouteSelection, EngineError> {
	let pinned_route = pinned.and_then(|name| ranked.iter().find(|r| r.adapter_name() == name));
	let (route, is_pinned) = match pinned_route {
		Some(route) => (route, true),
		None => (ranked.first().ok_or(EngineError::NoAvailableRoutes)?, false),
	};

	let price_impact_percent = match (route.output_usd, route.input_usd) {
		(Some(out), Some(input)) if input > 0.0 => Some(100.0 - out / input * 100.0),
		_ => None,
	};
	let impact = price_impact_percent.unwrap_or(0.0);

	Ok(RouteSelection {
		route: route.clone(),
		pinned: is_pinned,
		price_impact_percent,
		price_impact_warning: impact > PRICE_IMPACT_WARNING_THRESHOLD,
		high_price_impact: impact > HIGH_PRICE_IMPACT_THRESHOLD,
	})
}
