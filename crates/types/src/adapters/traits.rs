//! Core adapter trait implemented by every quote provider integration

use async_trait::async_trait;
use std::fmt::Debug;

use super::{AdapterDescriptor, AdapterResult, ExecutionTarget, RawQuote};
use crate::models::NetworkId;
use crate::requests::QuoteRequest;

/// Quote provider integration
///
/// `get_quote` must be safe to call repeatedly and concurrently and must not mutate
/// shared state. Extraction methods are pure and never touch the network.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QuoteAdapter: Send + Sync + Debug {
	/// Static capabilities and supported networks
	fn descriptor(&self) -> &AdapterDescriptor;

	/// Quote the request; `request.amount` is in smallest units of the specified side.
	///
	/// An adapter without output-amount support must return
	/// `AdapterError::UnsupportedQuoteDirection` for output-specified requests.
	async fn get_quote(&self, request: &QuoteRequest) -> AdapterResult<RawQuote>;

	/// Opaque bytes that will be published on-chain when executing this quote
	fn execution_payload(&self, quote: &RawQuote) -> Vec<u8>;

	/// Transaction the caller should sign and broadcast
	fn execution_target(&self, quote: &RawQuote) -> AdapterResult<ExecutionTarget>;

	/// Allowance spender for the network, None when no approval step is needed
	fn approval_address(&self, network: &NetworkId) -> Option<String>;
}
