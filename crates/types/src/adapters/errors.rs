//! Error types for adapter operations

use thiserror::Error;

/// Failure of a single adapter call
#[derive(Error, Debug)]
pub enum AdapterError {
	#[error("Quote unavailable from {adapter}: {reason}")]
	QuoteUnavailable { adapter: String, reason: String },

	#[error("Adapter {adapter} cannot quote by output amount")]
	UnsupportedQuoteDirection { adapter: String },

	#[error("Network {network} not supported by adapter {adapter}")]
	NetworkNotSupported { network: String, adapter: String },

	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("Approval address mismatch: expected {expected}, got {actual}")]
	ApprovalMismatch { expected: String, actual: String },

	#[error("HTTP request failed: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("HTTP {status_code}: {reason}")]
	HttpStatusError { status_code: u16, reason: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Configuration error: {reason}")]
	ConfigError { reason: String },
}

impl AdapterError {
	/// Extract HTTP status code from the error if available
	pub fn status_code(&self) -> Option<u16> {
		match self {
			AdapterError::HttpStatusError { status_code, .. } => Some(*status_code),
			AdapterError::HttpError(reqwest_error) => {
				reqwest_error.status().map(|status| status.as_u16())
			},
			_ => None,
		}
	}

	/// Create an error from a non-success HTTP status with a default reason
	pub fn from_http_failure(status_code: u16) -> Self {
		let reason = match status_code {
			400 => "Bad Request".to_string(),
			401 => "Unauthorized".to_string(),
			403 => "Forbidden".to_string(),
			404 => "Not Found".to_string(),
			429 => "Too Many Requests".to_string(),
			500 => "Internal Server Error".to_string(),
			502 => "Bad Gateway".to_string(),
			503 => "Service Unavailable".to_string(),
			_ => format!("HTTP Error {}", status_code),
		};

		Self::HttpStatusError {
			status_code,
			reason,
		}
	}

	pub fn invalid_response(reason: impl Into<String>) -> Self {
		Self::InvalidResponse {
			reason: reason.into(),
		}
	}

	/// Whether the provider answered with something the engine cannot interpret
	pub fn is_malformed(&self) -> bool {
		matches!(
			self,
			AdapterError::InvalidResponse { .. }
				| AdapterError::Serialization(_)
				| AdapterError::ApprovalMismatch { .. }
		) || matches!(self, AdapterError::HttpError(e) if e.is_decode())
	}
}

/// Errors raised while building or registering adapters
#[derive(Error, Debug)]
pub enum AdapterFactoryError {
	#[error("Adapter already registered: {adapter}")]
	AlreadyRegistered { adapter: String },

	#[error("Failed to create adapter {adapter}: {reason}")]
	CreationFailed { adapter: String, reason: String },

	#[error("Adapter {adapter} requires credential: {reason}")]
	MissingCredential { adapter: String, reason: String },
}
