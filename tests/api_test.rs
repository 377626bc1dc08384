//! HTTP surface over the engine

mod mocks;

use std::time::Duration;

use axum::{
	body::{to_bytes, Body},
	http::{Request, StatusCode},
	Router,
};
use mocks::{engine_with, fingerprint, MockAdapter};
use serde_json::{json, Value};
use swapquote::{create_router, AppState};
use tower::ServiceExt;

fn app(adapters: &[&MockAdapter]) -> Router {
	create_router().with_state(AppState::new(engine_with(adapters, None)))
}

fn request_body(amount: u64) -> Value {
	serde_json::to_value(fingerprint(amount)).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
	let builder = Request::builder().method(method).uri(uri);
	let request = match body {
		Some(body) => builder
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	};
	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
	(status, value)
}

#[tokio::test]
async fn test_health_sets_response_headers() {
	let app = app(&[]);
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()["cache-control"], "no-store");
	assert_eq!(response.headers()["x-content-type-options"], "nosniff");
	assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_adapters_listed_in_registration_order() {
	let first = MockAdapter::new("first", 1, Some(1.0));
	let second = MockAdapter::new("second", 1, Some(1.0));
	let app = app(&[&first, &second]);

	let (status, body) = send(&app, "GET", "/api/v1/adapters", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 2);
	assert_eq!(body["adapters"][0]["name"], "first");
	assert_eq!(body["adapters"][1]["name"], "second");
}

#[tokio::test]
async fn test_routes_ranked_with_selection() {
	let low = MockAdapter::new("low", 980_000, Some(1.0));
	let high = MockAdapter::new("high", 995_000, Some(1.0));
	let broken = MockAdapter::new("broken", 1, Some(1.0)).with_behavior(mocks::Behavior::Error);
	let app = app(&[&low, &high, &broken]);

	let mut body = request_body(1_000_000);
	body["pinned_adapter"] = json!("low");
	let (status, body) = send(&app, "POST", "/api/v1/routes", Some(body)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["state"], "partially_failed");
	assert_eq!(body["no_available_routes"], false);
	assert_eq!(body["routes"].as_array().unwrap().len(), 2);
	assert_eq!(body["routes"][0]["adapter_name"], "high");
	assert_eq!(body["routes"][0]["relative_loss"], 1.0);
	assert_eq!(body["failures"][0]["adapter"], "broken");
	assert_eq!(body["selection"]["route"]["adapter_name"], "low");
}

#[tokio::test]
async fn test_routes_without_any_route() {
	let broken = MockAdapter::new("broken", 1, Some(1.0)).with_behavior(mocks::Behavior::Error);
	let app = app(&[&broken]);

	let (status, body) = send(&app, "POST", "/api/v1/routes", Some(request_body(1_000_000))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["no_available_routes"], true);
	assert!(body["selection"].is_null());
}

#[tokio::test]
async fn test_invalid_routes_request_rejected() {
	let app = app(&[]);
	let mut body = request_body(1_000_000);
	body["to_asset"] = body["from_asset"].clone();

	let (status, body) = send(&app, "POST", "/api/v1/routes", Some(body)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_watch_lifecycle() {
	let adapter = MockAdapter::new("a", 990_000, Some(1.0)).with_delay(Duration::from_millis(100));
	let app = app(&[&adapter]);

	let (status, created) = send(&app, "POST", "/api/v1/watches", Some(request_body(1_000_000))).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(created["snapshot"]["is_loading"], true);
	let id = created["watch_id"].as_str().unwrap().to_string();
	let uri = format!("/api/v1/watches/{}", id);

	// First cycle is in flight
	tokio::time::sleep(Duration::from_millis(20)).await;
	let (status, refresh) = send(&app, "POST", &format!("{}/refresh", uri), None).await;
	assert_eq!(status, StatusCode::ACCEPTED);
	assert_eq!(refresh["triggered"], false);

	let mut settled = Value::Null;
	for _ in 0..50 {
		let (status, body) = send(&app, "GET", &uri, None).await;
		assert_eq!(status, StatusCode::OK);
		if body["snapshot"]["cycles_completed"].as_u64() > Some(0) {
			settled = body;
			break;
		}
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
	assert_eq!(settled["snapshot"]["is_loading"], false);
	assert_eq!(settled["snapshot"]["routes"][0]["adapter_name"], "a");

	let (status, _) = send(&app, "DELETE", &uri, None).await;
	assert_eq!(status, StatusCode::NO_CONTENT);
	let (status, body) = send(&app, "GET", &uri, None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "NOT_FOUND");
	let (status, _) = send(&app, "DELETE", &uri, None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shared_watch_survives_one_delete() {
	let adapter = MockAdapter::new("a", 990_000, Some(1.0));
	let app = app(&[&adapter]);

	let mut body = request_body(1_000_000);
	let (_, first) = send(&app, "POST", "/api/v1/watches", Some(body.clone())).await;
	body["refresh_interval_ms"] = json!(5_000);
	let (status, second) = send(&app, "POST", "/api/v1/watches", Some(body)).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(first["watch_id"], second["watch_id"]);
	assert_eq!(second["observers"], 2);
	assert_eq!(second["refresh_interval_ms"], 5_000);

	let uri = format!("/api/v1/watches/{}", first["watch_id"].as_str().unwrap());
	let (status, _) = send(&app, "DELETE", &uri, None).await;
	assert_eq!(status, StatusCode::NO_CONTENT);
	let (status, remaining) = send(&app, "GET", &uri, None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(remaining["observers"], 1);

	let (status, _) = send(&app, "DELETE", &uri, None).await;
	assert_eq!(status, StatusCode::NO_CONTENT);
	let (status, _) = send(&app, "GET", &uri, None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}
