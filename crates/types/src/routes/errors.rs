//! Route-level failure classification and engine errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::AdapterError;
use crate::requests::RequestValidationError;

/// Why an adapter produced no usable route this cycle
///
/// Never propagated past the fetcher; carried on the unavailable route instead.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteFailure {
	#[error("adapter timed out after {timeout_ms}ms")]
	AdapterTimeout { timeout_ms: u64 },

	#[error("adapter returned a malformed response: {reason}")]
	AdapterMalformedResponse { reason: String },

	#[error("adapter cannot quote by output amount")]
	UnsupportedQuoteDirection,

	#[error("network not supported by adapter")]
	NetworkNotSupported,

	#[error("quote unavailable: {reason}")]
	QuoteUnavailable { reason: String },

	#[error("request has no amount to quote")]
	EmptyRequest,
}

impl From<&AdapterError> for RouteFailure {
	fn from(error: &AdapterError) -> Self {
		match error {
			AdapterError::Timeout { timeout_ms } => RouteFailure::AdapterTimeout {
				timeout_ms: *timeout_ms,
			},
			AdapterError::UnsupportedQuoteDirection { .. } => {
				RouteFailure::UnsupportedQuoteDirection
			},
			AdapterError::NetworkNotSupported { .. } => RouteFailure::NetworkNotSupported,
			e if e.is_malformed() => RouteFailure::AdapterMalformedResponse {
				reason: e.to_string(),
			},
			e => RouteFailure::QuoteUnavailable {
				reason: e.to_string(),
			},
		}
	}
}

/// Errors surfaced to engine callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
	#[error("no available routes were produced this cycle")]
	NoAvailableRoutes,

	#[error("fee oracle unavailable: {reason}")]
	FeeOracleUnavailable { reason: String },

	#[error("invalid request: {0}")]
	InvalidRequest(#[from] RequestValidationError),

	#[error("fingerprint {key} is not being observed")]
	NotObserved { key: String },

	#[error("observation limit of {limit} fingerprints reached")]
	CapacityExceeded { limit: usize },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_adapter_error_classification() {
		assert_eq!(
			RouteFailure::from(&AdapterError::Timeout { timeout_ms: 50 }),
			RouteFailure::AdapterTimeout { timeout_ms: 50 }
		);
		assert_eq!(
			RouteFailure::from(&AdapterError::UnsupportedQuoteDirection {
				adapter: "0x".to_string()
			}),
			RouteFailure::UnsupportedQuoteDirection
		);
		assert!(matches!(
			RouteFailure::from(&AdapterError::invalid_response("missing field")),
			RouteFailure::AdapterMalformedResponse { .. }
		));
		assert!(matches!(
			RouteFailure::from(&AdapterError::from_http_failure(503)),
			RouteFailure::QuoteUnavailable { .. }
		));
	}

	#[test]
	fn test_failure_serialization_is_tagged() {
		let json = serde_json::to_value(RouteFailure::AdapterTimeout { timeout_ms: 10 }).unwrap();
		assert_eq!(json["kind"], "adapter_timeout");
	}
}
