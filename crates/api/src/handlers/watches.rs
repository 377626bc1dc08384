use std::time::Duration;

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use serde::{Deserialize, Serialize};
use swapquote_types::{RequestFingerprint, RouteSnapshot};
use tracing::info;

use crate::handlers::common::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WatchRequest {
	#[serde(flatten)]
	pub fingerprint: RequestFingerprint,
	/// Overrides the engine's refresh interval for this fingerprint
	#[serde(default)]
	pub refresh_interval_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct WatchResponse {
	pub watch_id: String,
	/// Interval the watch actually refreshes at; the shortest one any registration asked for
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh_interval_ms: Option<u64>,
	/// Registrations still holding this watch; each DELETE releases one
	pub observers: usize,
	pub snapshot: RouteSnapshot,
}

impl WatchResponse {
	fn new(state: &AppState, watch_id: String, snapshot: RouteSnapshot) -> Self {
		let scheduler = state.engine.scheduler();
		Self {
			refresh_interval_ms: scheduler
				.refresh_interval_by_key(&watch_id)
				.map(|interval| interval.as_millis() as u64),
			observers: scheduler.observers_by_key(&watch_id),
			watch_id,
			snapshot,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
	pub watch_id: String,
	/// False when a cycle was already in flight
	pub triggered: bool,
}

/// POST /api/v1/watches - Start (or join) a refreshing observation
///
/// Repeated registrations of the same request share one watch and are released one DELETE
/// at a time. A watch nobody reads is dropped after the engine's idle timeout.
pub async fn post_watch(
	State(state): State<AppState>,
	Json(request): Json<WatchRequest>,
) -> Result<(StatusCode, Json<WatchResponse>), ApiError> {
	let watch_id = request.fingerprint.cache_key();
	let receiver = state.engine.scheduler().observe(
		request.fingerprint,
		request.refresh_interval_ms.map(Duration::from_millis),
	)?;
	info!("Watch {} registered", watch_id);

	let snapshot = receiver.borrow().clone();
	Ok((
		StatusCode::CREATED,
		Json(WatchResponse::new(&state, watch_id, snapshot)),
	))
}

/// GET /api/v1/watches/{id} - Current snapshot of an observation
pub async fn get_watch(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<WatchResponse>, ApiError> {
	let snapshot = state
		.engine
		.scheduler()
		.find_by_key(&id)
		.ok_or_else(|| ApiError::not_found("Watch", &id))?;
	Ok(Json(WatchResponse::new(&state, id, snapshot)))
}

/// POST /api/v1/watches/{id}/refresh - Refresh now unless a cycle is in flight
pub async fn refresh_watch(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<(StatusCode, Json<RefreshResponse>), ApiError> {
	let snapshot = state
		.engine
		.scheduler()
		.find_by_key(&id)
		.ok_or_else(|| ApiError::not_found("Watch", &id))?;
	let triggered = state.engine.scheduler().trigger(&snapshot.fingerprint);
	Ok((
		StatusCode::ACCEPTED,
		Json(RefreshResponse {
			watch_id: id,
			triggered,
		}),
	))
}

/// DELETE /api/v1/watches/{id} - Release one registration
pub async fn delete_watch(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
	if state.engine.scheduler().stop_by_key(&id) {
		info!("Watch {} removed", id);
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ApiError::not_found("Watch", &id))
	}
}
