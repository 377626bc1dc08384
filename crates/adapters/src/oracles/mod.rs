//! HTTP implementations of the fee and price oracles

pub mod llama;
pub mod rpc;

pub use llama::LlamaPriceOracle;
pub use rpc::RpcFeeOracle;

use swapquote_types::{NetworkId, OracleError};

fn request_error(network: &NetworkId, error: reqwest::Error, timeout_ms: u64) -> OracleError {
	if error.is_timeout() {
		OracleError::Timeout { timeout_ms }
	} else {
		OracleError::unavailable(network, error.to_string())
	}
}
