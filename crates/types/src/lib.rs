//! swapquote types
//!
//! Shared models, traits and errors for the swap route aggregator.
//! Organized by concern: adapters, oracles, requests and routes.

pub mod adapters;
pub mod constants;
pub mod models;
pub mod oracles;
pub mod requests;
pub mod routes;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use adapters::{
	AdapterCapabilities, AdapterDescriptor, AdapterError, AdapterFactoryError, AdapterKind,
	AdapterResult, ExecutionTarget, FeeDenomination, ProviderFee, QuoteAdapter, RawQuote,
};

#[cfg(any(test, feature = "testing"))]
pub use adapters::MockQuoteAdapter;
#[cfg(any(test, feature = "testing"))]
pub use oracles::{MockFeeOracle, MockPriceOracle};

pub use models::{
	Asset, NetworkId, NetworkProfile, SecretString, NATIVE_PLACEHOLDER_ADDRESS, U256, ZERO_ADDRESS,
};

pub use oracles::{checked_reading, FeeOracle, OracleError, OracleResult, PriceOracle};

pub use requests::{
	QuoteAmount, QuoteContext, QuoteDirection, QuoteRequest, RequestFingerprint,
	RequestValidationError,
};

pub use routes::{
	AdapterFailure, CycleState, EngineError, GasCost, NormalizedRoute, RankedRoute, RouteFailure,
	RouteSelection, RouteSnapshot, SettlementFee,
};
