use axum::{extract::State, response::Json};
use serde::Serialize;
use swapquote_types::AdapterDescriptor;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AdaptersResponse {
	/// In registration order, which is also the ranking tie-break order
	pub adapters: Vec<AdapterDescriptor>,
	pub total: usize,
}

/// GET /api/v1/adapters - Registered adapters and their capabilities
pub async fn get_adapters(State(state): State<AppState>) -> Json<AdaptersResponse> {
	let adapters = state.engine.registry().descriptors();
	Json(AdaptersResponse {
		total: adapters.len(),
		adapters,
	})
}
