//! Adapter contract: descriptors, raw quotes and the provider trait

pub mod errors;
pub mod models;
pub mod traits;

pub use errors::{AdapterError, AdapterFactoryError};
pub use models::{
	AdapterCapabilities, AdapterDescriptor, AdapterKind, ExecutionTarget, FeeDenomination,
	ProviderFee, RawQuote,
};
pub use traits::QuoteAdapter;

#[cfg(any(test, feature = "testing"))]
pub use traits::MockQuoteAdapter;

/// Result types for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;
