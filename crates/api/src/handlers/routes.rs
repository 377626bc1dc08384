use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use swapquote_types::{
	AdapterFailure, CycleState, RankedRoute, RequestFingerprint, RouteSelection,
};
use tracing::info;

use crate::handlers::common::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoutesRequest {
	#[serde(flatten)]
	pub fingerprint: RequestFingerprint,
	/// Adapter the caller wants selected when it produced a route
	#[serde(default)]
	pub pinned_adapter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoutesResponse {
	pub cache_key: String,
	pub state: CycleState,
	pub routes: Vec<RankedRoute>,
	pub failures: Vec<AdapterFailure>,
	/// None when no adapter produced an available route
	pub selection: Option<RouteSelection>,
	pub no_available_routes: bool,
	pub timestamp: i64,
}

/// POST /api/v1/routes - Run one cycle and return the ranked routes
pub async fn post_routes(
	State(state): State<AppState>,
	Json(request): Json<RoutesRequest>,
) -> Result<Json<RoutesResponse>, ApiError> {
	let fingerprint = request.fingerprint;
	info!(
		"Received routes request on {} ({:?})",
		fingerprint.network,
		fingerprint.direction()
	);

	let outcome = state.engine.quote_once(&fingerprint).await?;
	let selection = outcome.selection(request.pinned_adapter.as_deref()).ok();

	Ok(Json(RoutesResponse {
		cache_key: fingerprint.cache_key(),
		state: outcome.state,
		no_available_routes: outcome.routes.is_empty(),
		routes: outcome.routes,
		failures: outcome.failures,
		selection,
		timestamp: chrono::Utc::now().timestamp(),
	}))
}
