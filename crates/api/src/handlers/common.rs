use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use swapquote_types::EngineError;

/// Error response format shared by handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	pub timestamp: i64,
}

impl ErrorResponse {
	pub fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
			timestamp: chrono::Utc::now().timestamp(),
		}
	}
}

/// Handler error carrying its HTTP status
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	body: ErrorResponse,
}

impl ApiError {
	pub fn not_found(what: &str, id: &str) -> Self {
		Self {
			status: StatusCode::NOT_FOUND,
			body: ErrorResponse::new("NOT_FOUND", format!("{} '{}' not found", what, id)),
		}
	}
}

impl From<EngineError> for ApiError {
	fn from(error: EngineError) -> Self {
		let (status, code) = match &error {
			EngineError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
			EngineError::NotObserved { .. } => (StatusCode::NOT_FOUND, "NOT_OBSERVED"),
			EngineError::CapacityExceeded { .. } => {
				(StatusCode::SERVICE_UNAVAILABLE, "CAPACITY_EXCEEDED")
			},
			EngineError::NoAvailableRoutes => (StatusCode::NOT_FOUND, "NO_AVAILABLE_ROUTES"),
			EngineError::FeeOracleUnavailable { .. } => {
				(StatusCode::SERVICE_UNAVAILABLE, "FEE_ORACLE_UNAVAILABLE")
			},
		};
		Self {
			status,
			body: ErrorResponse::new(code, error.to_string()),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(self.body)).into_response()
	}
}
