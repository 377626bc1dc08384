use axum::{
	http::header::{HeaderName, HeaderValue},
	routing::{get, post},
	Router,
};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	limit::RequestBodyLimitLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	set_header::SetResponseHeaderLayer,
	trace::TraceLayer,
};
use tracing::Level;

use crate::handlers::{
	delete_watch, get_adapters, get_watch, health, post_routes, post_watch, refresh_watch,
};
use crate::state::AppState;

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

pub fn create_router() -> Router<AppState> {
	create_router_with_limit(DEFAULT_BODY_LIMIT_BYTES)
}

pub fn create_router_with_limit(body_limit_bytes: usize) -> Router<AppState> {
	let cors = CorsLayer::permissive();
	let body_limit = RequestBodyLimitLayer::new(body_limit_bytes);
	let trace = TraceLayer::new_for_http()
		.make_span_with(|req: &axum::http::Request<_>| {
			let req_id = req
				.headers()
				.get("x-request-id")
				.and_then(|v| v.to_str().ok())
				.unwrap_or("-");
			tracing::info_span!(
				"http_request",
				method = %req.method(),
				uri = %req.uri(),
				req_id
			)
		})
		.on_request(tower_http::trace::DefaultOnRequest::new().level(Level::DEBUG))
		.on_response(
			tower_http::trace::DefaultOnResponse::new()
				.level(Level::INFO)
				.latency_unit(tower_http::LatencyUnit::Millis),
		);
	let req_id = ServiceBuilder::new()
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.layer(PropagateRequestIdLayer::x_request_id());
	// Quotes go stale within seconds
	let headers = ServiceBuilder::new()
		.layer(SetResponseHeaderLayer::if_not_present(
			HeaderName::from_static("cache-control"),
			HeaderValue::from_static("no-store"),
		))
		.layer(SetResponseHeaderLayer::if_not_present(
			HeaderName::from_static("x-content-type-options"),
			HeaderValue::from_static("nosniff"),
		));

	Router::new()
		.route("/health", get(health))
		.route("/api/v1/adapters", get(get_adapters))
		.route("/api/v1/routes", post(post_routes))
		.route("/api/v1/watches", post(post_watch))
		.route("/api/v1/watches/{id}", get(get_watch).delete(delete_watch))
		.route("/api/v1/watches/{id}/refresh", post(refresh_watch))
		.layer(cors)
		.layer(CompressionLayer::new())
		.layer(trace)
		.layer(req_id)
		.layer(headers)
		.layer(body_limit)
}
